use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReframeConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub experiment: ExperimentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatSettings {
    pub model: String,
    /// Upper bound on generated reply length.
    pub max_tokens: u32,
    /// Hard bound on the upstream call; a hung collaborator cannot block a
    /// respondent's session past this.
    pub timeout_seconds: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 200,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExperimentConfig {
    /// Probability a new respondent lands in the treatment arm.
    pub treatment_probability: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            treatment_probability: crate::assign::DEFAULT_TREATMENT_PROBABILITY,
        }
    }
}

impl ReframeConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contract() {
        let c = ReframeConfig::default();
        assert_eq!(c.service.port, 3000);
        assert_eq!(c.chat.model, "gpt-3.5-turbo");
        assert_eq!(c.chat.max_tokens, 200);
        assert!((c.experiment.treatment_probability - 0.6).abs() < f64::EPSILON);
    }
}
