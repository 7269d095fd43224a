use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response envelope shared by every endpoint
///
/// ```json
/// {
///   "isSuccess": true,
///   "code": "COMMON200",
///   "message": "OK",
///   "result": { ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse<T> {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Option<T>,
}

impl<T: Serialize> BaseResponse<T> {
    /// Success envelope
    pub fn success(result: T) -> Self {
        Self::success_with_message(result, "OK")
    }

    pub fn success_with_message(result: T, message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            code: "COMMON200".to_string(),
            message: message.into(),
            result: Some(result),
        }
    }
}

impl BaseResponse<()> {
    /// Success envelope without a body
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            code: "COMMON200".to_string(),
            message: message.into(),
            result: None,
        }
    }
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Option<()>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            code: code.into(),
            message: message.into(),
            result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_success_envelope_in_camel_case() {
        // Arrange
        let response = BaseResponse::success(vec!["brave-azure-wolf"]);

        // Act
        let parsed = serde_json::to_value(&response).unwrap();

        // Assert
        assert_eq!(parsed["isSuccess"], true);
        assert_eq!(parsed["code"], "COMMON200");
        assert_eq!(parsed["result"][0], "brave-azure-wolf");
        assert!(parsed.get("is_success").is_none());
    }

    #[test]
    fn should_serialize_empty_envelope_with_null_result() {
        let parsed = serde_json::to_value(BaseResponse::empty("Votes reset")).unwrap();

        assert_eq!(parsed["message"], "Votes reset");
        assert!(parsed["result"].is_null());
    }
}
