use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

const REQUIRED_VARS: [&str; 5] = [
    "SERVER_ADDRESS",
    "DATABASE_URL",
    "JWT_SECRET",
    "QUIZ_FUNCTIONS_URL",
    "SERVICE_ROLE_KEY",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub quiz_functions_url: url::Url,
    pub service_role_key: String,
    pub batch_default_limit: usize,
    pub batch_max_limit: usize,
    pub batch_overfetch_factor: usize,
    pub generation_interval: Duration,
    pub questions_per_quiz: u32,
    pub generator_timeout: Duration,
    pub admin_rps: u32,
    pub backfill_schedule: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Every
    /// missing required variable is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            )));
        }
        let required = |name: &str| get(name).unwrap_or_default();

        let functions_raw = required("QUIZ_FUNCTIONS_URL");
        let quiz_functions_url = url::Url::parse(&functions_raw)
            .map_err(|e| Error::Config(format!("Invalid value for QUIZ_FUNCTIONS_URL: {}", e)))?;

        let batch_default_limit = parse_or("BATCH_DEFAULT_LIMIT", get("BATCH_DEFAULT_LIMIT"), 10)?;
        let batch_max_limit = parse_or("BATCH_MAX_LIMIT", get("BATCH_MAX_LIMIT"), 100)?;
        if batch_default_limit > batch_max_limit {
            return Err(Error::Config(format!(
                "BATCH_DEFAULT_LIMIT ({}) exceeds BATCH_MAX_LIMIT ({})",
                batch_default_limit, batch_max_limit
            )));
        }
        let batch_overfetch_factor: usize =
            parse_or("BATCH_OVERFETCH_FACTOR", get("BATCH_OVERFETCH_FACTOR"), 2)?;
        if batch_overfetch_factor == 0 {
            return Err(Error::Config(
                "BATCH_OVERFETCH_FACTOR must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            server_address: required("SERVER_ADDRESS"),
            database_url: required("DATABASE_URL"),
            jwt_secret: required("JWT_SECRET"),
            quiz_functions_url,
            service_role_key: required("SERVICE_ROLE_KEY"),
            batch_default_limit,
            batch_max_limit,
            batch_overfetch_factor,
            generation_interval: Duration::from_millis(parse_or(
                "GENERATION_INTERVAL_MS",
                get("GENERATION_INTERVAL_MS"),
                2000,
            )?),
            questions_per_quiz: parse_or("QUESTIONS_PER_QUIZ", get("QUESTIONS_PER_QUIZ"), 10)?,
            generator_timeout: Duration::from_secs(parse_or(
                "GENERATOR_TIMEOUT_SECS",
                get("GENERATOR_TIMEOUT_SECS"),
                120,
            )?),
            admin_rps: parse_or("ADMIN_RPS", get("ADMIN_RPS"), 5)?,
            backfill_schedule: get("BACKFILL_SCHEDULE"),
        })
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
