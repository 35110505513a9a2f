use anyhow::{Context, Result, ensure};

const DEFAULT_OFFER_HOURS: u32 = 24;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub api_keys: String,
    pub offer_hours: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let offer_hours = match std::env::var("WAITLIST_OFFER_HOURS") {
            Ok(raw) => raw
                .parse()
                .context("WAITLIST_OFFER_HOURS must be a number")?,
            Err(_) => DEFAULT_OFFER_HOURS,
        };
        ensure!(
            (1..=720).contains(&offer_hours),
            "WAITLIST_OFFER_HOURS must be between 1 and 720"
        );

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            offer_hours,
        })
    }
}
