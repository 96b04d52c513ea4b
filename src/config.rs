use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cleanup: CleanupConfig,
}

/// Retention thresholds and the timer that drives the sweep.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub enabled: bool,
    pub daily_cron: String,
    pub frequent_cron: String,
    pub utc_offset_hours: i32,
    pub reviewed_statuses: Vec<ApplicationStatus>,
    pub reviewed_after_hours: i64,
    pub open_statuses: Vec<ApplicationStatus>,
    pub open_after_hours: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_cron: "0 0 2 * * *".to_string(),
            frequent_cron: "0 0 */6 * * *".to_string(),
            utc_offset_hours: 7,
            reviewed_statuses: vec![ApplicationStatus::Hired, ApplicationStatus::Rejected],
            reviewed_after_hours: 24,
            open_statuses: vec![ApplicationStatus::Pending, ApplicationStatus::Interview],
            open_after_hours: 48,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = CleanupConfig::default();
        let cleanup = CleanupConfig {
            enabled: get_env_or("CLEANUP_ENABLED", defaults.enabled)?,
            daily_cron: env::var("CLEANUP_DAILY_CRON").unwrap_or(defaults.daily_cron),
            frequent_cron: env::var("CLEANUP_FREQUENT_CRON").unwrap_or(defaults.frequent_cron),
            utc_offset_hours: get_env_or("CLEANUP_UTC_OFFSET_HOURS", defaults.utc_offset_hours)?,
            reviewed_statuses: get_statuses_or(
                "CLEANUP_REVIEWED_STATUSES",
                defaults.reviewed_statuses,
            )?,
            reviewed_after_hours: get_env_or(
                "CLEANUP_REVIEWED_AFTER_HOURS",
                defaults.reviewed_after_hours,
            )?,
            open_statuses: get_statuses_or("CLEANUP_OPEN_STATUSES", defaults.open_statuses)?,
            open_after_hours: get_env_or("CLEANUP_OPEN_AFTER_HOURS", defaults.open_after_hours)?,
        };

        if !(-12..=14).contains(&cleanup.utc_offset_hours) {
            return Err(Error::Config(format!(
                "CLEANUP_UTC_OFFSET_HOURS out of range: {}",
                cleanup.utc_offset_hours
            )));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: get_env("JWT_SECRET")?,
            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./uploads")),
            max_upload_bytes: get_env_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            cleanup,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn get_statuses_or(name: &str, default: Vec<ApplicationStatus>) -> Result<Vec<ApplicationStatus>> {
    match env::var(name) {
        Ok(raw) => parse_status_list(&raw)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn parse_status_list(raw: &str) -> Result<Vec<ApplicationStatus>> {
    let mut statuses = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let status: ApplicationStatus = part.parse()?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(statuses)
}
