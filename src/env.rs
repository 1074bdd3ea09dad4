use std::path::Path;

use anyhow::Context;

const SECRETS_FILE: &str = ".secrets.env";

/// Env files for a Rocket profile, later files overriding earlier ones.
pub fn env_files_for(profile: &str) -> [&'static str; 3] {
    match profile {
        "production" | "release" => ["config/common.env", "config/prod.env", SECRETS_FILE],
        _ => ["config/common.env", "config/dev.env", SECRETS_FILE],
    }
}

/// Loads the env files for `ROCKET_PROFILE` and returns the ones found.
/// Runs before tracing is installed, so the caller logs the result.
pub fn load_environment() -> anyhow::Result<Vec<&'static str>> {
    let profile = dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

    let mut loaded = Vec::new();
    for env_file in env_files_for(&profile) {
        if load_env_file(env_file)? {
            loaded.push(env_file);
        }
    }

    Ok(loaded)
}

fn load_env_file(path: &str) -> anyhow::Result<bool> {
    if !Path::new(path).exists() {
        return Ok(false);
    }

    dotenvy::from_filename_override(path)
        .with_context(|| format!("Failed to load environment file {}", path))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::{env_files_for, load_env_file};

    #[test]
    fn missing_env_file_is_skipped() {
        assert!(!load_env_file("config/does-not-exist.env").unwrap());
    }

    #[test]
    fn production_profile_uses_prod_settings() {
        assert_eq!(env_files_for("production")[1], "config/prod.env");
        assert_eq!(env_files_for("debug")[1], "config/dev.env");
        assert_eq!(env_files_for("production")[2], ".secrets.env");
    }
}
