use chrono::NaiveDate;
use rocket::serde::Deserialize;
use tracing::warn;

use crate::error::AppError;

const DEFAULT_COACH_PASSWORD: &str = "AOI";

/// Portal settings, extracted from Rocket's figment so they can be set in
/// `Rocket.toml` or through `ROCKET_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(crate = "rocket::serde", default)]
pub struct AppConfig {
    pub session_ttl_hours: i64,
    pub session_cleanup_interval_secs: u64,
    pub bcrypt_cost: u32,
    /// Shared initial password for provisioned coach accounts.
    pub default_coach_password: String,
    pub camp_days: Vec<NaiveDate>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 12,
            session_cleanup_interval_secs: 3600,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            default_coach_password: DEFAULT_COACH_PASSWORD.to_string(),
            camp_days: default_camp_days(),
            admin_email: None,
            admin_password: None,
        }
    }
}

fn default_camp_days() -> Vec<NaiveDate> {
    ["2024-07-15", "2024-07-16", "2024-07-17", "2024-07-18"]
        .iter()
        .filter_map(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .collect()
}

/// Hashing parameters shared by every credential operation.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub bcrypt_cost: u32,
    pub session_ttl: chrono::Duration,
    pub default_password_hash: String,
}

impl AuthSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        if config.default_coach_password == DEFAULT_COACH_PASSWORD {
            warn!(
                "Provisioned coach accounts use the stock default password; \
                 set ROCKET_DEFAULT_COACH_PASSWORD to override it"
            );
        }

        Ok(Self {
            bcrypt_cost: config.bcrypt_cost,
            session_ttl: chrono::Duration::hours(config.session_ttl_hours),
            default_password_hash: bcrypt::hash(
                &config.default_coach_password,
                config.bcrypt_cost,
            )?,
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_cover_the_four_camp_days() {
        temp_env::with_vars_unset(["ROCKET_SESSION_TTL_HOURS", "ROCKET_BCRYPT_COST"], || {
            let config: AppConfig = rocket::Config::figment()
                .extract()
                .expect("default config should extract");

            assert_eq!(config.session_ttl_hours, 12);
            assert_eq!(config.default_coach_password, "AOI");
            assert_eq!(config.camp_days.len(), 4);
            assert_eq!(config.camp_days[0].to_string(), "2024-07-15");
            assert!(config.admin_email.is_none());
        });
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        temp_env::with_vars(
            [
                ("ROCKET_SESSION_TTL_HOURS", Some("2")),
                ("ROCKET_BCRYPT_COST", Some("5")),
                ("ROCKET_ADMIN_EMAIL", Some("root@camp.dz")),
            ],
            || {
                let config: AppConfig = rocket::Config::figment()
                    .extract()
                    .expect("config should extract");

                assert_eq!(config.session_ttl_hours, 2);
                assert_eq!(config.bcrypt_cost, 5);
                assert_eq!(config.admin_email.as_deref(), Some("root@camp.dz"));
            },
        );
    }
}
