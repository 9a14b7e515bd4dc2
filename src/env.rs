use std::path::Path;

use tracing::{info, warn};

/// Loads `config/*.env` for the active Rocket profile, later files winning.
pub fn load_environment() -> Result<(), dotenvy::Error> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string()) == "production";

    let env_files = if is_production {
        ["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        ["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), dotenvy::Error> {
    if !Path::new(path).exists() {
        warn!("Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

#[cfg(test)]
pub fn load_test_environment() -> Result<(), dotenvy::Error> {
    for env_file in ["config/common.env", ".secrets.env"] {
        load_env_file(env_file)?;
    }

    Ok(())
}
