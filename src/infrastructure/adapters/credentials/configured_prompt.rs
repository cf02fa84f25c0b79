//! Configured Credential Prompt - 从配置或环境变量征询 API key
//!
//! 服务端没有交互式提示框；"征询"即按顺序查看配置值和指定的环境变量

use async_trait::async_trait;

use crate::application::ports::CredentialPromptPort;

#[derive(Debug, Clone, Default)]
pub struct ConfiguredCredentialPrompt {
    configured: Option<String>,
    env_var: Option<String>,
}

impl ConfiguredCredentialPrompt {
    pub fn new(configured: Option<String>, env_var: Option<String>) -> Self {
        Self {
            configured: configured.filter(|v| !v.trim().is_empty()),
            env_var: env_var.filter(|v| !v.trim().is_empty()),
        }
    }
}

#[async_trait]
impl CredentialPromptPort for ConfiguredCredentialPrompt {
    async fn solicit(&self) -> Option<String> {
        if let Some(value) = &self.configured {
            tracing::debug!("Using API key from configuration");
            return Some(value.clone());
        }

        let var = self.env_var.as_deref()?;
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => {
                tracing::debug!(env_var = %var, "Using API key from environment");
                Some(value)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_configured_value_wins() {
        let prompt = ConfiguredCredentialPrompt::new(
            Some("from-config".to_string()),
            Some("STORYVOICE_TEST_UNUSED_KEY".to_string()),
        );
        assert_eq!(prompt.solicit().await.as_deref(), Some("from-config"));
    }

    #[tokio::test]
    async fn test_env_var_fallback() {
        std::env::set_var("STORYVOICE_TEST_PROMPT_KEY", "from-env");
        let prompt = ConfiguredCredentialPrompt::new(
            Some("   ".to_string()),
            Some("STORYVOICE_TEST_PROMPT_KEY".to_string()),
        );
        assert_eq!(prompt.solicit().await.as_deref(), Some("from-env"));

        let none = ConfiguredCredentialPrompt::new(None, Some("STORYVOICE_TEST_MISSING_KEY".to_string()));
        assert!(none.solicit().await.is_none());
    }
}
