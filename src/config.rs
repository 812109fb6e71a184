use std::env;
use std::time::Duration;

use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::service::clock::ClockRules;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance rules
    pub late_cutoff: NaiveTime,
    pub early_cutoff: NaiveTime,

    /// Root directory of uploaded clock-in/out photos
    pub evidence_dir: String,

    /// Reverse geocoder base URL; unset means coordinates are stored as the place
    pub geocoder_url: Option<String>,
    pub geocoder_timeout_secs: u64,

    // Nightly auto clock-out
    pub reconcile_enabled: bool,
    pub reconcile_at: NaiveTime,
}

fn time_var(key: &str, default: &str) -> NaiveTime {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .unwrap_or_else(|_| panic!("{} must be HH:MM, got '{}'", key, raw))
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("RATE_PROTECTED_PER_MIN must be a number"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            late_cutoff: time_var("LATE_CUTOFF", "09:40"),
            early_cutoff: time_var("EARLY_CUTOFF", "18:30"),

            evidence_dir: env::var("EVIDENCE_DIR").unwrap_or_else(|_| "uploads".to_string()),

            geocoder_url: env::var("GEOCODER_URL").ok().filter(|u| !u.trim().is_empty()),
            geocoder_timeout_secs: env::var("GEOCODER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("GEOCODER_TIMEOUT_SECS must be a number"),

            reconcile_enabled: env::var("RECONCILE_ENABLED")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            reconcile_at: time_var("RECONCILE_AT", "00:05"),
        }
    }

    pub fn clock_rules(&self) -> ClockRules {
        ClockRules {
            late_cutoff: self.late_cutoff,
            early_cutoff: self.early_cutoff,
        }
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder_timeout_secs)
    }
}
