//! Usage contexts, generation settings and deployment modes.

use serde::{Deserialize, Serialize};

/// The intent register of a query. Derived per request, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextLabel {
    #[default]
    Default,
    Academic,
    Professional,
}

impl ContextLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextLabel::Default => "default",
            ContextLabel::Academic => "academic",
            ContextLabel::Professional => "professional",
        }
    }
}

impl std::fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling and length parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus-sampling threshold
    pub top_p: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 2000,
        }
    }
}

/// How answers are produced. Chosen by deployment configuration, never by
/// request content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Chat completion against a model with an assembled message list.
    #[default]
    Direct,
    /// Query against a persisted vector index that synthesizes the answer.
    Retrieval,
}

impl DeploymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Direct => "direct",
            DeploymentMode::Retrieval => "retrieval",
        }
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(DeploymentMode::Direct),
            "retrieval" | "rag" => Ok(DeploymentMode::Retrieval),
            other => Err(format!("unknown deployment mode '{other}' (expected direct or retrieval)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_generation_config() {
        let config = GenerationConfig::default();
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert!((config.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, 2000);
    }

    #[test]
    fn context_label_serializes_lowercase() {
        let json = serde_json::to_string(&ContextLabel::Professional).unwrap();
        assert_eq!(json, "\"professional\"");
    }

    #[test]
    fn deployment_mode_parsing() {
        assert_eq!("direct".parse::<DeploymentMode>().unwrap(), DeploymentMode::Direct);
        assert_eq!("RAG".parse::<DeploymentMode>().unwrap(), DeploymentMode::Retrieval);
        assert!("stream".parse::<DeploymentMode>().is_err());
    }
}
