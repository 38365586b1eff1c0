use std::collections::HashMap;

use secrecy::Secret;

use crate::catalog::OrphanPolicyKind;
use crate::errors::AppError;

pub const DEFAULT_VIDEO_BUCKET: &str = "doctor-videos";
pub const DEFAULT_UPLOAD_FOLDER: &str = "doctor-uploads";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub storage_url: String,
    pub storage_service_key: Secret<String>,
    pub video_bucket: String,
    pub upload_folder: String,
    pub secret_token: Secret<String>,
    pub orphan_policy: OrphanPolicyKind,
    pub bind_address: String,
}

impl Settings {
    #[tracing::instrument(name = "Load settings from environment")]
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, AppError> {
        let required = |key: &str| {
            vars.get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or_else(|| AppError::Configuration(format!("{} must be set", key)))
        };
        let optional = |key: &str, default: &str| {
            vars.get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let database_max_connections = match vars.get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                AppError::Configuration(format!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let orphan_policy = optional("ORPHAN_POLICY", "leave").parse::<OrphanPolicyKind>()?;

        let storage_url = required("STORAGE_URL")?;
        url::Url::parse(&storage_url)
            .map_err(|e| AppError::Configuration(format!("STORAGE_URL is invalid: {}", e)))?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections,
            storage_url: storage_url.trim_end_matches('/').to_string(),
            storage_service_key: Secret::new(required("STORAGE_SERVICE_KEY")?),
            video_bucket: optional("VIDEO_BUCKET", DEFAULT_VIDEO_BUCKET),
            upload_folder: optional("UPLOAD_FOLDER", DEFAULT_UPLOAD_FOLDER),
            secret_token: Secret::new(required("SECRET_TOKEN")?),
            orphan_policy,
            bind_address: optional("BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
        })
    }
}
