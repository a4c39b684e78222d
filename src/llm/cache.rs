//! Process-wide LLM client cache keyed by profile name (spec §5: "LLM
//! client cache: shared, thread-safe, keyed by profile name.").

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use dashmap::DashMap;

use super::http::HttpClient;
use super::mock::MockLlm;
use super::openai::OpenAiClient;
use super::profile::ClientBackend;
use super::{LlmClient, LlmError, Profile, ProfileTable};

pub struct ClientCache {
    profiles: ProfileTable,
    clients: DashMap<String, Arc<dyn LlmClient>>,
}

impl ClientCache {
    pub fn new(profiles: ProfileTable) -> Self {
        Self { profiles, clients: DashMap::new() }
    }

    /// Resolves `profile_name` and returns its cached client, building one
    /// on first use.
    pub fn resolve(&self, profile_name: &str) -> Result<Arc<dyn LlmClient>, LlmError> {
        if let Some(client) = self.clients.get(profile_name) {
            return Ok(client.clone());
        }
        let profile = self
            .profiles
            .get(profile_name)
            .ok_or_else(|| LlmError::UnknownProfile(profile_name.to_string()))?;
        let client = Self::build_client(profile);
        self.clients.insert(profile_name.to_string(), client.clone());
        Ok(client)
    }

    /// Resolves an embedding-capable client for `profile_name`, falling
    /// back to the `embedding` profile when the named one has no embed
    /// model (spec §4.6).
    pub fn resolve_embed(&self, profile_name: &str) -> Result<Arc<dyn LlmClient>, LlmError> {
        let profile = self
            .profiles
            .resolve_embed(profile_name)
            .ok_or_else(|| LlmError::NoEmbedModel(profile_name.to_string()))?;
        let key = profile.name.clone();
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }
        let client = Self::build_client(profile);
        self.clients.insert(key, client.clone());
        Ok(client)
    }

    fn build_client(profile: &Profile) -> Arc<dyn LlmClient> {
        match profile.client_backend {
            ClientBackend::Sdk => {
                let mut config = OpenAIConfig::new();
                if let Some(base_url) = &profile.base_url {
                    config = config.with_api_base(base_url.clone());
                }
                if let Some(key) = &profile.api_key {
                    config = config.with_api_key(key.clone());
                }
                Arc::new(OpenAiClient::new(config, profile.chat_model.clone(), profile.embed_model.clone()))
            }
            ClientBackend::Http => Arc::new(HttpClient::new(
                profile.base_url.clone().unwrap_or_else(|| "https://api.openai.com".to_string()),
                profile.api_key.clone(),
                profile.chat_model.clone(),
                profile.embed_model.clone(),
                &profile.endpoint_overrides,
            )),
            // `chat_model` doubles as the fixed response text: a mock profile
            // has no real model to name.
            ClientBackend::Mock => Arc::new(MockLlm::new(profile.chat_model.clone().unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn profile(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            provider: "openai".to_string(),
            base_url: None,
            api_key: None,
            chat_model: Some("gpt-4o-mini".to_string()),
            embed_model: Some("text-embedding-3-small".to_string()),
            client_backend: ClientBackend::Sdk,
            endpoint_overrides: HashMap::new(),
            embed_batch_size: 16,
        }
    }

    #[test]
    fn unknown_profile_rejected() {
        let cache = ClientCache::new(ProfileTable::new(vec![profile("default")]));
        assert!(matches!(cache.resolve("missing").unwrap_err(), LlmError::UnknownProfile(_)));
    }

    #[test]
    fn resolve_caches_the_built_client() {
        let cache = ClientCache::new(ProfileTable::new(vec![profile("default")]));
        let a = cache.resolve("default").unwrap();
        let b = cache.resolve("default").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn mock_backend_routes_to_mock_llm() {
        let mut mock = profile("default");
        mock.client_backend = ClientBackend::Mock;
        mock.chat_model = Some("fixed response".to_string());
        let cache = ClientCache::new(ProfileTable::new(vec![mock]));
        let client = cache.resolve("default").unwrap();
        let (text, _usage) = client.chat(&[], &Default::default()).await.unwrap();
        assert_eq!(text, "fixed response");
    }
}
