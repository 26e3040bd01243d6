use std::{env, str::FromStr, time::Duration};

use kantin_common::helpers::{parse_boolean_flag, parse_list};
use kantin_engine::{
    db_types::PaymentMethod,
    payment_objects::{PaymentConfig, DEFAULT_CASH_PREFIX, DEFAULT_GATEWAY_PREFIX, DEFAULT_PROVIDER_TIMEOUT},
};
use log::*;
use midtrans_tools::MidtransConfig;

const DEFAULT_KPG_HOST: &str = "127.0.0.1";
const DEFAULT_KPG_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/kantin.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Payment prefixes, enabled methods and the provider timeout
    pub payment: PaymentConfig,
    pub midtrans: MidtransConfig,
    /// If false, notifications are accepted without checking their `signature_key`. **DANGER**
    pub signature_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_KPG_HOST.to_string(),
            port: DEFAULT_KPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            payment: PaymentConfig::default(),
            midtrans: MidtransConfig::default(),
            signature_checks: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("KPG_HOST").ok().unwrap_or_else(|| DEFAULT_KPG_HOST.into());
        let port = env::var("KPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for KPG_PORT. {e} Using the default, {DEFAULT_KPG_PORT}, instead."
                    );
                    DEFAULT_KPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_KPG_PORT);
        let database_url = env::var("KPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ KPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let midtrans = MidtransConfig::new_from_env_or_default();
        let signature_checks = parse_boolean_flag(env::var("KPG_MIDTRANS_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️ Notification signature checks are disabled. Anyone can make the server query Midtrans about any \
                 order. Do not run production like this."
            );
        }
        let payment = payment_config_from_env();
        Self { host, port, database_url, payment, midtrans, signature_checks }
    }
}

fn payment_config_from_env() -> PaymentConfig {
    let provider_timeout = env::var("KPG_PROVIDER_TIMEOUT_SECS")
        .map_err(|_| {
            info!(
                "🪛️ KPG_PROVIDER_TIMEOUT_SECS is not set. Using the default value of {}s.",
                DEFAULT_PROVIDER_TIMEOUT.as_secs()
            )
        })
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| warn!("🪛️ Invalid configuration value for KPG_PROVIDER_TIMEOUT_SECS. {e}"))
        })
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(DEFAULT_PROVIDER_TIMEOUT);
    let cash_prefix = prefix_from_env("KPG_CASH_PREFIX", DEFAULT_CASH_PREFIX);
    let gateway_prefix = prefix_from_env("KPG_GATEWAY_PREFIX", DEFAULT_GATEWAY_PREFIX);
    let enabled_methods = match env::var("KPG_ENABLED_PAYMENT_METHODS") {
        Ok(s) => parse_payment_methods(&s),
        Err(_) => PaymentConfig::default().enabled_methods,
    };
    if enabled_methods.is_empty() {
        warn!("🚨️ No payment methods are enabled. Every checkout will be rejected.");
    } else {
        let names = enabled_methods.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ");
        info!("🪛️ Enabled payment methods: {names}");
    }
    PaymentConfig { cash_prefix, gateway_prefix, provider_timeout, enabled_methods }
}

fn prefix_from_env(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Parses a list like `cash, gopay`. Unknown names are logged and skipped.
pub fn parse_payment_methods(value: &str) -> Vec<PaymentMethod> {
    let mut methods = Vec::new();
    for name in parse_list(value) {
        match PaymentMethod::from_str(&name) {
            Ok(m) if !methods.contains(&m) => methods.push(m),
            Ok(_) => {},
            Err(e) => warn!("🪛️ Ignoring unknown payment method '{name}' in KPG_ENABLED_PAYMENT_METHODS. {e}"),
        }
    }
    methods
}
