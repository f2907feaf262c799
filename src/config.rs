use secrecy::Secret;
use serde::Deserialize;

pub const DEFAULT_ESI_BASE_URL: &str = "https://esi.evetech.net/latest";
pub const DEFAULT_TAX_SYNC_CRON: &str = "0 0 * * * *";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Secret<String>,
    pub host: String,
    pub port: u16,

    // ESI
    pub esi_base_url: String,
    pub esi_user_agent: String,
    pub esi_timeout_secs: u64,

    // Background tax history sync; empty disables the job
    pub tax_sync_cron: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: Secret::new(config.get("database_url")?),
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            esi_base_url: config
                .get("esi_base_url")
                .unwrap_or_else(|_| DEFAULT_ESI_BASE_URL.to_string()),
            esi_user_agent: config
                .get("esi_user_agent")
                .unwrap_or_else(|_| format!("taxtools/{}", env!("CARGO_PKG_VERSION"))),
            esi_timeout_secs: config.get("esi_timeout_secs").unwrap_or(10),

            tax_sync_cron: config
                .get("tax_sync_cron")
                .unwrap_or_else(|_| DEFAULT_TAX_SYNC_CRON.to_string()),
        })
    }
}
