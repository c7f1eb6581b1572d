use std::time::Duration;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub upstream_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub proxy: ProxyConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://./gateway-registry.db?mode=rwc".to_string()),
            },
            redis: RedisConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                connect_timeout: Duration::from_millis(
                    std::env::var("REDIS_CONNECT_TIMEOUT_MS")
                        .unwrap_or_else(|_| "250".to_string())
                        .parse()
                        .unwrap_or(250),
                ),
            },
            proxy: ProxyConfig {
                upstream_timeout: Duration::from_secs(
                    std::env::var("UPSTREAM_TIMEOUT_SECS")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .unwrap_or(30),
                ),
            },
        })
    }
}
