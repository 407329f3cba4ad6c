use std::env;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistants::PollPolicy;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4.1";
const DEFAULT_SYSTEM_PROMPT_PATH: &str = "systemPrompt.txt";
const DEFAULT_GENESYS_REGION: &str = "sae1.pure.cloud";
const DEFAULT_GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com";
const DEFAULT_GOOGLE_PLACES_BASE_URL: &str = "https://places.googleapis.com";
const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_IBGE_BASE_URL: &str = "https://servicodados.ibge.gov.br";
const DEFAULT_VIACEP_BASE_URL: &str = "https://viacep.com.br";
const DEFAULT_OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Cold-start configuration shared by every function binary.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_base_url: String,
    pub poll_policy: PollPolicy,
    pub chat_default_model: String,
    pub system_prompt_path: String,
    pub genesys_region: String,
    /// Overrides `https://login.{domain}` when set.
    pub genesys_login_base_url: Option<String>,
    /// Overrides `https://api.{domain}` when set.
    pub genesys_api_base_url: Option<String>,
    pub google_maps_base_url: String,
    pub google_places_base_url: String,
    pub nominatim_base_url: String,
    pub ibge_base_url: String,
    pub viacep_base_url: String,
    pub open_meteo_base_url: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from_lookup(|_| None)
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    // Unset or unparseable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let url_or = |key: &str, default: &str| string_or(key, default).trim_end_matches('/').to_string();

        let max_attempts = lookup("RUN_POLL_MAX_ATTEMPTS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(|n| n.clamp(1, 10))
            .unwrap_or(PollPolicy::DEFAULT_MAX_ATTEMPTS);
        let base_backoff_ms = lookup("RUN_POLL_BASE_BACKOFF_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|n| n.clamp(1, 10_000))
            .unwrap_or(PollPolicy::DEFAULT_BASE_BACKOFF_MS);

        Settings {
            openai_base_url: url_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            poll_policy: PollPolicy::new(max_attempts, Duration::from_millis(base_backoff_ms)),
            chat_default_model: string_or("CHAT_DEFAULT_MODEL", DEFAULT_CHAT_MODEL),
            system_prompt_path: string_or("SYSTEM_PROMPT_PATH", DEFAULT_SYSTEM_PROMPT_PATH),
            genesys_region: string_or("GENESYS_REGION", DEFAULT_GENESYS_REGION),
            genesys_login_base_url: lookup("GENESYS_LOGIN_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().trim_end_matches('/').to_string()),
            genesys_api_base_url: lookup("GENESYS_API_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().trim_end_matches('/').to_string()),
            google_maps_base_url: url_or("GOOGLE_MAPS_BASE_URL", DEFAULT_GOOGLE_MAPS_BASE_URL),
            google_places_base_url: url_or("GOOGLE_PLACES_BASE_URL", DEFAULT_GOOGLE_PLACES_BASE_URL),
            nominatim_base_url: url_or("NOMINATIM_BASE_URL", DEFAULT_NOMINATIM_BASE_URL),
            ibge_base_url: url_or("IBGE_BASE_URL", DEFAULT_IBGE_BASE_URL),
            viacep_base_url: url_or("VIACEP_BASE_URL", DEFAULT_VIACEP_BASE_URL),
            open_meteo_base_url: url_or("OPEN_METEO_BASE_URL", DEFAULT_OPEN_METEO_BASE_URL),
            gemini_base_url: url_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            gemini_model: string_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
        }
    }

    pub fn genesys_login_url(&self, domain: &str) -> String {
        self.genesys_login_base_url
            .clone()
            .unwrap_or_else(|| format!("https://login.{domain}"))
    }

    pub fn genesys_api_url(&self, domain: &str) -> String {
        self.genesys_api_base_url
            .clone()
            .unwrap_or_else(|| format!("https://api.{domain}"))
    }
}

// JSON lines for CloudWatch; the log service adds its own timestamps
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}

/// Span wrapping one invocation so every log line carries the Lambda request id.
pub fn invocation_span(function: &'static str, request_id: &str) -> tracing::Span {
    tracing::info_span!("invocation", function, request_id = %request_id)
}
