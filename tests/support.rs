//! Shared test harness: an in-process `MemoryService` backed by the
//! in-memory storage provider and [`memoria_core::llm::MockLlm`] profiles.
//!
//! `MockLlm` returns the same fixed text for every chat/summarize/vision
//! call on a given profile, so tests that need two different canned
//! responses in the same pipeline run (e.g. a "yes" sufficiency verdict
//! alongside valid extraction JSON) register a second named profile rather
//! than reusing `default`.

use std::collections::{BTreeMap, HashMap};

use memoria_core::config::{
    BlobConfig, DatabaseConfig, DdlMode, MemoryConfig, MemorizeConfig, MetadataProvider, MetadataStoreConfig,
    RetrieveConfig, UserConfig,
};
use memoria_core::llm::{ClientBackend, Profile};
use memoria_core::{MemoryService, Scope, ScopeValue};

/// A `MemoryConfig` with one mock `default` profile fixed to `chat_content`,
/// a single `user_id` scope field, and the in-memory storage provider.
pub fn mock_config(chat_content: &str) -> MemoryConfig {
    MemoryConfig {
        llm_profiles: vec![mock_profile("default", chat_content)],
        blob_config: BlobConfig { resources_dir: std::env::temp_dir().to_string_lossy().to_string() },
        database_config: DatabaseConfig {
            metadata_store: MetadataStoreConfig {
                provider: MetadataProvider::InMemory,
                dsn: None,
                ddl_mode: DdlMode::Create,
            },
            vector_index: None,
        },
        memorize_config: MemorizeConfig::default(),
        retrieve_config: RetrieveConfig { route_intention: false, ..RetrieveConfig::default() },
        user_config: UserConfig { model: vec!["user_id".to_string()] },
    }
}

pub fn mock_profile(name: &str, chat_content: &str) -> Profile {
    Profile {
        name: name.to_string(),
        provider: "mock".to_string(),
        base_url: None,
        api_key: None,
        chat_model: Some(chat_content.to_string()),
        embed_model: Some("mock-embed".to_string()),
        client_backend: ClientBackend::Mock,
        endpoint_overrides: HashMap::new(),
        embed_batch_size: 16,
    }
}

pub fn service(chat_content: &str) -> MemoryService {
    MemoryService::new(mock_config(chat_content)).expect("service builds from a valid mock config")
}

pub fn scope(user_id: &str) -> Scope {
    let mut scope = Scope::new();
    scope.insert("user_id".to_string(), ScopeValue::from(user_id));
    scope
}

pub fn where_user(user_id: &str) -> BTreeMap<String, ScopeValue> {
    let mut map = BTreeMap::new();
    map.insert("user_id".to_string(), ScopeValue::from(user_id));
    map
}

pub fn no_where_in() -> BTreeMap<String, Vec<ScopeValue>> {
    BTreeMap::new()
}

pub fn where_user_in(user_ids: &[&str]) -> BTreeMap<String, Vec<ScopeValue>> {
    let mut map = BTreeMap::new();
    map.insert(
        "user_id__in".to_string(),
        user_ids.iter().map(|id| ScopeValue::from(*id)).collect(),
    );
    map
}
