use tracing::info;

pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
}

impl Config {
    /// Reads configuration from the environment (a `.env` file is honored).
    pub fn load() -> Self {
        Self {
            database_url: var_or("DATABASE_URL", "sqlite:tweeter.db"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:8080"),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    dotenv::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
