use rocket::figment::Figment;
use serde::Deserialize;

/// Application settings read from the Rocket figment, so they can be set in
/// `Rocket.toml` or as `ROCKET_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: i64,
}

fn default_access_token_minutes() -> i64 {
    5
}

fn default_refresh_token_days() -> i64 {
    1
}

impl AppConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        let config: AppConfig = figment.extract()?;

        if config.jwt_secret.trim().is_empty() {
            return Err(rocket::figment::Error::from(
                "jwt_secret must not be empty".to_string(),
            ));
        }
        if config.access_token_minutes <= 0 || config.refresh_token_days <= 0 {
            return Err(rocket::figment::Error::from(
                "token lifetimes must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}

pub fn database_url() -> String {
    dotenvy::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://marketplace.db".to_string())
}
