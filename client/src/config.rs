use std::env;
use std::time::Duration;

/// Runtime configuration for the client core.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Debounce applied to non-empty suggestion queries. Empty queries
    /// skip the debounce entirely.
    pub suggestion_debounce: Duration,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(ms) = env::var("TAGCHAT_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.suggestion_debounce = Duration::from_millis(ms);
        }
        Ok(config)
    }

    pub fn with_suggestion_debounce(mut self, debounce: Duration) -> Self {
        self.suggestion_debounce = debounce;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            suggestion_debounce: Duration::from_millis(150),
        }
    }
}
