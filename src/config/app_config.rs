use std::env;

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: i64,

    /// Non-deleted rooms a user may participate in at once
    pub max_rooms_per_user: u64,
    /// Broadcast buffer per room channel
    pub event_channel_capacity: usize,
    pub cors_allowed_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 8080,
            database_url: "sqlite://poker.db?mode=rwc".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_expiration: 86400,
            max_rooms_per_user: 10,
            event_channel_capacity: 64,
            cors_allowed_origin: None,
        }
    }
}

impl AppConfig {
    /// Load settings from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| defaults.server_port.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET is not set; falling back to an insecure default.");
            defaults.jwt_secret
        });

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .unwrap_or_else(|_| defaults.jwt_expiration.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidExpiration)?;

        let max_rooms_per_user = env::var("MAX_ROOMS_PER_USER")
            .unwrap_or_else(|_| defaults.max_rooms_per_user.to_string())
            .parse::<u64>()
            .ok()
            .filter(|quota| *quota > 0)
            .ok_or(ConfigError::InvalidQuota)?;

        let event_channel_capacity = env::var("EVENT_CHANNEL_CAPACITY")
            .unwrap_or_else(|_| defaults.event_channel_capacity.to_string())
            .parse::<usize>()
            .ok()
            .filter(|capacity| *capacity > 0)
            .ok_or(ConfigError::InvalidChannelCapacity)?;

        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN")
            .ok()
            .filter(|origin| !origin.trim().is_empty());

        Ok(Self {
            server_port,
            database_url,
            jwt_secret,
            jwt_expiration,
            max_rooms_per_user,
            event_channel_capacity,
            cors_allowed_origin,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Invalid expiration time")]
    InvalidExpiration,
    #[error("MAX_ROOMS_PER_USER must be a positive integer")]
    InvalidQuota,
    #[error("EVENT_CHANNEL_CAPACITY must be a positive integer")]
    InvalidChannelCapacity,
}
