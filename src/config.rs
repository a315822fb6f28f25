use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use dotenvy::dotenv;
use strum::{Display as StrumDisplay, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageBackend {
    MySql,
    Memory,
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// required for the mysql backend
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_otp_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // OTP sign-in
    pub otp_ttl_secs: u64,
    pub otp_max_attempts: u32,
    pub phone_country_code: String,

    // Profile pictures
    pub upload_dir: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

fn parsed<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{key} has invalid value `{raw}`: {e}"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let storage_backend: StorageBackend = parsed("STORAGE_BACKEND", "mysql")?;
        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::MySql && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set for the mysql backend"));
        }

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url,
            storage_backend,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", "900")?, // 15 min
            refresh_token_ttl: parsed("REFRESH_TOKEN_TTL", "604800")?, // 7 days

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", "60")?,
            rate_register_per_min: parsed("RATE_REGISTER_PER_MIN", "30")?,
            rate_refresh_per_min: parsed("RATE_REFRESH_PER_MIN", "30")?,
            rate_otp_per_min: parsed("RATE_OTP_PER_MIN", "10")?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            otp_ttl_secs: parsed("OTP_TTL_SECS", "300")?,
            otp_max_attempts: parsed("OTP_MAX_ATTEMPTS", "5")?,
            phone_country_code: env::var("PHONE_COUNTRY_CODE").unwrap_or_else(|_| "+91".to_string()),

            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", "2097152")?, // 2 MiB
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".into(),
            database_url: None,
            storage_backend: StorageBackend::Memory,
            jwt_secret: "test-secret".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 1000,
            rate_register_per_min: 1000,
            rate_refresh_per_min: 1000,
            rate_otp_per_min: 1000,
            rate_protected_per_min: 10_000,
            api_prefix: "/api".into(),
            otp_ttl_secs: 300,
            otp_max_attempts: 3,
            phone_country_code: "+91".into(),
            upload_dir: std::env::temp_dir()
                .join("attendance-portal-uploads")
                .to_string_lossy()
                .into_owned(),
            public_base_url: "http://localhost:8080".into(),
            max_upload_bytes: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_names() {
        assert_eq!("MySQL".parse::<StorageBackend>().ok(), Some(StorageBackend::MySql));
        assert_eq!("memory".parse::<StorageBackend>().ok(), Some(StorageBackend::Memory));
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }
}
