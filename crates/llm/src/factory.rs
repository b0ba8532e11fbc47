//! LLM provider factory.
//!
//! Resolves a provider name plus endpoint/secret settings into a ready
//! `LlmClient` trait object.

use crate::client::LlmClient;
use crate::providers::{ClaudeClient, OllamaClient};
use crate::types::ProviderType;
use coursewise_core::config::{AppConfig, ProviderConfig};
use coursewise_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "claude")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required for Claude
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        Some(ProviderType::Claude) => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("Claude provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => ClaudeClient::with_base_url(key, url),
                None => ClaudeClient::new(key),
            };
            Ok(Arc::new(client))
        }
        None => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

/// Create the client for the active provider of an `AppConfig`, honoring
/// per-provider settings from config.yaml.
pub fn create_client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider = config.provider.as_str();
    let endpoint = config.resolve_endpoint(provider);
    let api_key = config.resolve_api_key(provider);

    match config.get_provider_config(provider) {
        Some(ProviderConfig::Ollama {
            endpoint,
            timeout: Some(secs),
            ..
        }) => Ok(Arc::new(OllamaClient::with_timeout(
            endpoint,
            Duration::from_secs(secs),
        ))),
        Some(ProviderConfig::Claude {
            api_version: Some(version),
            ..
        }) => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("Claude provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => ClaudeClient::with_base_url(key, url),
                None => ClaudeClient::new(key),
            };
            Ok(Arc::new(client.with_api_version(version)))
        }
        _ => create_client(provider, endpoint.as_deref(), api_key.as_deref()),
    }
}
