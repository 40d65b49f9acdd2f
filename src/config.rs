use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Max notifications returned for the bell dropdown.
    /// Set via COURIER_BELL_LIMIT. Default: 10.
    pub bell_limit: i64,
    /// Default page size for the full notification history view.
    /// Set via COURIER_PAGE_SIZE. Default: 50.
    pub page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8088,
            database_url: "postgres://localhost/courier".into(),
            bell_limit: 10,
            page_size: 50,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    Ok(Config {
        port: std::env::var("COURIER_PORT")
            .unwrap_or_else(|_| "8088".into())
            .parse()
            .unwrap_or(8088),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/courier".into()),
        bell_limit: std::env::var("COURIER_BELL_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10),
        page_size: std::env::var("COURIER_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50),
    })
}
