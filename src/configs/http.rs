use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Overrides the built-in browser user agent.
    pub user_agent: Option<String>,
    /// Per-request timeout. Also the only way to abort a stalled range
    /// request, so keep it finite.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
