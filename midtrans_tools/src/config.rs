use std::fmt::Display;

use kantin_common::Secret;
use log::*;

const SANDBOX_BASE_URL: &str = "https://api.sandbox.midtrans.com";
const PRODUCTION_BASE_URL: &str = "https://api.midtrans.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MidtransEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl MidtransEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl Display for MidtransEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MidtransConfig {
    pub environment: MidtransEnvironment,
    /// Overrides the environment's base URL. Useful for pointing at a local stub.
    pub base_url: Option<String>,
    pub server_key: Secret<String>,
}

impl MidtransConfig {
    pub fn new_from_env_or_default() -> Self {
        let environment = match std::env::var("KPG_MIDTRANS_ENVIRONMENT").map(|s| s.to_lowercase()) {
            Ok(s) if s == "production" => MidtransEnvironment::Production,
            Ok(s) if s == "sandbox" => MidtransEnvironment::Sandbox,
            _ => {
                warn!("KPG_MIDTRANS_ENVIRONMENT not set, using the sandbox environment");
                MidtransEnvironment::Sandbox
            },
        };
        let base_url = std::env::var("KPG_MIDTRANS_BASE_URL").ok();
        let server_key = Secret::new(std::env::var("KPG_MIDTRANS_SERVER_KEY").unwrap_or_else(|_| {
            warn!("KPG_MIDTRANS_SERVER_KEY not set, using (probably useless) default");
            "SB-Mid-server-00000000000000".to_string()
        }));
        Self { environment, base_url, server_key }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_else(|| self.environment.base_url())
    }
}
