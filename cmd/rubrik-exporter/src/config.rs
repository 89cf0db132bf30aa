use rubrik_client::Credentials;
use std::{env, num::ParseIntError, time::Duration};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub node_ip: String,
    pub credentials: Credentials,
    pub port: u16,
    pub request_timeout: Duration,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing env var: {0}")]
    MissingEnv(String),
    #[error("invalid integer in env var {name}: {source}")]
    InvalidInteger { name: String, source: ParseIntError },
    #[error("set RUBRIK_CDM_TOKEN or both RUBRIK_CDM_USERNAME and RUBRIK_CDM_PASSWORD")]
    MissingCredentials,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_ip = lookup("RUBRIK_CDM_NODE_IP")
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("RUBRIK_CDM_NODE_IP".to_owned()))?;

        let credentials = match (
            lookup("RUBRIK_CDM_TOKEN"),
            lookup("RUBRIK_CDM_USERNAME"),
            lookup("RUBRIK_CDM_PASSWORD"),
        ) {
            (Some(token), _, _) if !token.is_empty() => Credentials::Token(token),
            (_, Some(username), Some(password)) => Credentials::Basic { username, password },
            _ => return Err(ConfigError::MissingCredentials),
        };

        let port = match lookup("RUBRIK_PROMETHEUS_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidInteger {
                    name: "RUBRIK_PROMETHEUS_PORT".to_owned(),
                    source,
                })?,
            None => DEFAULT_PORT,
        };

        let timeout_seconds = lookup("RUBRIK_CDM_TIMEOUT_SECONDS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

        let accept_invalid_certs = lookup("RUBRIK_CDM_ACCEPT_INVALID_CERTS")
            .and_then(|raw| raw.trim().parse::<bool>().ok())
            .unwrap_or(true);

        Ok(Self {
            node_ip,
            credentials,
            port,
            request_timeout: Duration::from_secs(timeout_seconds),
            accept_invalid_certs,
        })
    }
}
