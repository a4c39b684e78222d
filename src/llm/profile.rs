//! Named LLM profile bundles and resolution (spec §4.6, §6).

use std::collections::HashMap;

/// Which HTTP surface a profile's client should speak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientBackend {
    /// `async-openai`'s typed SDK client.
    Sdk,
    /// Raw `reqwest` calls against an OpenAI-compatible HTTP endpoint.
    Http,
    /// Fixed-response [`super::MockLlm`]; never touches the network. Used in
    /// tests so a full `MemoryService` can run pipelines end to end.
    Mock,
}

impl std::str::FromStr for ClientBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sdk" => Ok(ClientBackend::Sdk),
            "http" => Ok(ClientBackend::Http),
            "mock" => Ok(ClientBackend::Mock),
            other => Err(format!("unknown client_backend: {other}")),
        }
    }
}

/// A named bundle selecting provider/model/credentials, referenced by
/// pipeline steps via `chat_llm_profile` / `embed_llm_profile` / `llm_profile`.
#[derive(Clone, Debug)]
pub struct Profile {
    pub name: String,
    pub provider: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub chat_model: Option<String>,
    pub embed_model: Option<String>,
    pub client_backend: ClientBackend,
    pub endpoint_overrides: HashMap<String, String>,
    pub embed_batch_size: usize,
}

impl Profile {
    pub fn has_embed_model(&self) -> bool {
        self.embed_model.is_some()
    }
}

/// The full `llm_profiles` configuration group: a name → [`Profile`] map
/// with a mandatory `default` entry.
#[derive(Clone, Debug, Default)]
pub struct ProfileTable {
    profiles: HashMap<String, Profile>,
}

impl ProfileTable {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn default_profile(&self) -> Option<&Profile> {
        self.profiles.get("default")
    }

    /// Resolves an embedding profile: if `name` has no embed model, falls
    /// back to the profile named `embedding` (spec §4.6).
    pub fn resolve_embed<'a>(&'a self, name: &str) -> Option<&'a Profile> {
        match self.profiles.get(name) {
            Some(p) if p.has_embed_model() => Some(p),
            _ => self.profiles.get("embedding").filter(|p| p.has_embed_model()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, embed_model: Option<&str>) -> Profile {
        Profile {
            name: name.to_string(),
            provider: "openai".to_string(),
            base_url: None,
            api_key: None,
            chat_model: Some("gpt-4o-mini".to_string()),
            embed_model: embed_model.map(str::to_string),
            client_backend: ClientBackend::Sdk,
            endpoint_overrides: HashMap::new(),
            embed_batch_size: 16,
        }
    }

    #[test]
    fn resolve_embed_falls_back_to_embedding_profile() {
        let table = ProfileTable::new(vec![
            profile("default", None),
            profile("embedding", Some("text-embedding-3-small")),
        ]);
        let resolved = table.resolve_embed("default").unwrap();
        assert_eq!(resolved.name, "embedding");
    }

    #[test]
    fn resolve_embed_prefers_the_named_profile_when_it_has_a_model() {
        let table = ProfileTable::new(vec![
            profile("default", Some("text-embedding-3-small")),
            profile("embedding", Some("text-embedding-3-large")),
        ]);
        let resolved = table.resolve_embed("default").unwrap();
        assert_eq!(resolved.name, "default");
    }

    #[test]
    fn resolve_embed_returns_none_without_any_embed_capable_profile() {
        let table = ProfileTable::new(vec![profile("default", None)]);
        assert!(table.resolve_embed("default").is_none());
    }
}
