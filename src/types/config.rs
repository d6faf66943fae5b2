use std::env;
use std::time::Duration;

/// Default base URL of the hosted chat-completions API.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default base URL of the local inference server.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Resolved gateway configuration, passed in at construction time.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Credential for the hosted provider; `None` leaves it unconfigured.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub ollama_base_url: String,
    /// Bound on fetching a URL to process.
    pub fetch_timeout: Duration,
    /// Bound on every call to the local inference server.
    pub local_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            fetch_timeout: Duration::from_secs(30),
            local_timeout: Duration::from_secs(120),
        }
    }
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn openai_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.openai_api_key = Some(api_key.into());
        self
    }

    pub fn openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = base_url.into();
        self
    }

    pub fn ollama_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.ollama_base_url = base_url.into();
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn local_timeout(mut self, timeout: Duration) -> Self {
        self.local_timeout = timeout;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OLLAMA_BASE_URL`. Empty
    /// values count as unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let openai_api_key = non_empty_var("OPENAI_API_KEY");
        if openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set, hosted provider unavailable");
        }

        Self {
            openai_api_key,
            openai_base_url: non_empty_var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            ollama_base_url: non_empty_var("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            ..defaults
        }
    }

    /// Whether the hosted provider has a credential.
    pub fn openai_configured(&self) -> bool {
        self.openai_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
