use serde::{Deserialize, Serialize};

/// Credentials and endpoint selection for the capability provider.
///
/// Built exactly once by the process entry point and passed in by injection.
/// Nothing below the entry point reads the environment, and the engine never
/// logs the contents of this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmConfig {
    Azure {
        endpoint: String,
        api_key: String,
        deployment: String,
    },
    OpenAi {
        api_key: String,
        model: String,
    },
    /// Deterministic canned responses; no credentials required.
    Scripted,
}

impl LlmConfig {
    pub fn provider_name(&self) -> &'static str {
        match self {
            LlmConfig::Azure { .. } => "azure",
            LlmConfig::OpenAi { .. } => "openai",
            LlmConfig::Scripted => "scripted",
        }
    }
}
