use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// The estimation scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Estimate {
    #[serde(rename = "0.5")]
    Half,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "13")]
    Thirteen,
    #[serde(rename = "?")]
    Unknown,
}

impl Estimate {
    pub const SCALE: [Estimate; 8] = [
        Estimate::Half,
        Estimate::One,
        Estimate::Two,
        Estimate::Three,
        Estimate::Five,
        Estimate::Eight,
        Estimate::Thirteen,
        Estimate::Unknown,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Estimate::Half => "0.5",
            Estimate::One => "1",
            Estimate::Two => "2",
            Estimate::Three => "3",
            Estimate::Five => "5",
            Estimate::Eight => "8",
            Estimate::Thirteen => "13",
            Estimate::Unknown => "?",
        }
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Estimate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Estimate::SCALE
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("'{}' is not on the estimation scale", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_strings_should_match_serde_names() {
        for estimate in Estimate::SCALE {
            let json = serde_json::to_string(&estimate).unwrap();
            assert_eq!(json, format!("\"{}\"", estimate.as_str()));
            assert_eq!(estimate.as_str().parse::<Estimate>().unwrap(), estimate);
        }
    }

    #[test]
    fn off_scale_values_should_be_rejected() {
        assert!("4".parse::<Estimate>().is_err());
        assert!(serde_json::from_str::<Estimate>("\"21\"").is_err());
        assert!(serde_json::from_str::<Estimate>("5").is_err());
    }
}
