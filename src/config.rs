use anyhow::Context;
use dotenvy::dotenv;
use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    /// Base URL of the HRMS backend, including its `/api` prefix
    pub hrms_api_url: String,
    pub hrms_timeout_secs: u64,
    /// Wait before the post-payment re-fetch, so backend writes can settle
    pub reconcile_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            hrms_api_url: env::var("HRMS_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5000/api".to_string())
                .trim_end_matches('/')
                .to_string(),
            hrms_timeout_secs: env::var("HRMS_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("HRMS_TIMEOUT_SECS must be a number")?,
            reconcile_delay_ms: env::var("RECONCILE_DELAY_MS")
                .unwrap_or_else(|_| "1500".to_string())
                .parse()
                .context("RECONCILE_DELAY_MS must be a number")?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn hrms_timeout(&self) -> Duration {
        Duration::from_secs(self.hrms_timeout_secs)
    }

    pub fn reconcile_delay(&self) -> Duration {
        Duration::from_millis(self.reconcile_delay_ms)
    }
}
