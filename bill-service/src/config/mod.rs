//! Configuration module for bill-service.

use crate::services::matcher::TieBreak;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct BillConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    /// Whether the organization tracks stock items on bill lines.
    pub stock_tracking_enabled: bool,
    /// Tie-break strategy when several catalog entries share a name.
    pub tie_break: TieBreak,
}

impl BillConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "bill-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            stock_tracking_enabled: env::var("STOCK_TRACKING_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            tie_break: env::var("MATCH_TIE_BREAK")
                .map(|s| TieBreak::from_string(&s))
                .unwrap_or_default(),
        })
    }
}
