use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;

use crate::application::services::push::PushOptions;
use crate::infrastructure::push::http::{DEFAULT_MAX_PAYLOAD_BYTES, HttpPushConfig};

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub push: Option<HttpPushConfig>,
    pub push_options: PushOptions,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();

        Ok(Config {
            port: var("PORT")
                .map_err(|_| "An error occured while getting PORT env param")?
                .parse::<u16>()
                .map_err(|_| "An error occured while parsing PORT env param")?,
            scheme: var("SCHEME").map_err(|_| "An error occured while getting SCHEME env param")?,
            host: var("HOST").map_err(|_| "An error occured while getting HOST env param")?,
            database_url: var("DATABASE_URL").ok(),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)
                .map_err(|_| "An error occured while parsing DATABASE_MAX_CONNECTIONS env param")?,
            push: Self::push_config()?,
            push_options: PushOptions {
                offline_ttl: Duration::from_secs(
                    parse_or("PUSH_OFFLINE_TTL_SECS", 24 * 3600)
                        .map_err(|_| "An error occured while parsing PUSH_OFFLINE_TTL_SECS env param")?,
                ),
                allow_offline: parse_or("PUSH_ALLOW_OFFLINE", true)
                    .map_err(|_| "An error occured while parsing PUSH_ALLOW_OFFLINE env param")?,
            },
        })
    }

    /// Push credentials are only required when a provider host is set.
    fn push_config() -> Result<Option<HttpPushConfig>, &'static str> {
        let Ok(host) = var("PUSH_HOST") else {
            return Ok(None);
        };

        Ok(Some(HttpPushConfig {
            host,
            app_id: var("PUSH_APP_ID")
                .map_err(|_| "An error occured while getting PUSH_APP_ID env param")?,
            app_key: var("PUSH_APP_KEY")
                .map_err(|_| "An error occured while getting PUSH_APP_KEY env param")?,
            master_secret: var("PUSH_MASTER_SECRET")
                .map_err(|_| "An error occured while getting PUSH_MASTER_SECRET env param")?,
            timeout: Duration::from_secs(
                parse_or("PUSH_TIMEOUT_SECS", 10)
                    .map_err(|_| "An error occured while parsing PUSH_TIMEOUT_SECS env param")?,
            ),
            max_payload_bytes: parse_or("PUSH_MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES)
                .map_err(|_| "An error occured while parsing PUSH_MAX_PAYLOAD_BYTES env param")?,
        }))
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, T::Err> {
    match var(key) {
        Ok(raw) => raw.trim().parse(),
        Err(_) => Ok(default),
    }
}
