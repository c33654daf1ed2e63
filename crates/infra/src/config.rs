use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub log_level: String,
    pub api_base_url: String,
    pub api_timeout_ms: u64,
    pub api_retry_max_attempts: u32,
    pub api_retry_backoff_base_ms: u64,
    pub api_retry_backoff_max_ms: u64,
    pub state_dir: String,
    pub poll_interval_ms: u64,
    pub highlight_window_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("log_level", "info")?
            .set_default("api_base_url", "https://cim.baliyoventures.com/api")?
            .set_default("api_timeout_ms", 2_500)?
            .set_default("api_retry_max_attempts", 3)?
            .set_default("api_retry_backoff_base_ms", 200)?
            .set_default("api_retry_backoff_max_ms", 2_000)?
            .set_default("state_dir", ".podium")?
            .set_default("poll_interval_ms", 2_000)?
            .set_default("highlight_window_ms", 5_000)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}
