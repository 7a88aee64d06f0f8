use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

/// Runtime configuration, populated from `PLANFORGE_`-prefixed environment
/// variables on top of the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// SQLite database URL, e.g. `sqlite:planforge.sqlite`.
    pub database_url: String,
    /// Default log filter when `RUST_LOG` is unset.
    pub loglevel: String,
    /// Gemini API key. When absent the LLM surface reports unavailable.
    pub gemini_api_key: Option<String>,
    /// Gemini model used for plan generation.
    pub gemini_model: String,
    /// Base URL of the Gemini API. Overridable for tests.
    pub gemini_base_url: Url,
    /// Secret used to encrypt the session cookie. Must be at least 32 bytes;
    /// a random key is generated per process when unset.
    pub session_secret: Option<String>,
    /// Session lifetime in days.
    pub session_ttl_days: i64,
    /// How many specs the list endpoint returns.
    pub recent_specs_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:planforge.sqlite".to_string(),
            loglevel: "info".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_base_url: Url::parse("https://generativelanguage.googleapis.com/")
                .expect("default gemini base url is valid"),
            session_secret: None,
            session_ttl_days: 7,
            recent_specs_limit: 5,
        }
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("PLANFORGE_"))
        .extract()
        .expect("invalid PLANFORGE_* configuration")
});
