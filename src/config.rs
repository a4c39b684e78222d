//! Typed configuration surface (spec §6): `llm_profiles`, `blob_config`,
//! `database_config`, `memorize_config`, `retrieve_config`, `user_config`.
//!
//! Process-level *loading* from env/files/CLI flags is out of scope (spec
//! §1) — callers assemble a [`MemoryConfig`] however they like and hand it
//! to `MemoryService::new`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::llm::{Profile, ProfileTable};
use crate::scope::ScopeModel;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BlobConfig {
    pub resources_dir: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataProvider {
    InMemory,
    Relational,
    RelationalVector,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DdlMode {
    Create,
    Validate,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MetadataStoreConfig {
    pub provider: MetadataProvider,
    pub dsn: Option<PathBuf>,
    #[serde(default = "default_ddl_mode")]
    pub ddl_mode: DdlMode,
}

fn default_ddl_mode() -> DdlMode {
    DdlMode::Create
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorIndexProvider {
    BruteForce,
    Native,
    None,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VectorIndexConfig {
    pub provider: VectorIndexProvider,
    pub dsn: Option<PathBuf>,
    /// Embedding dimensionality for the native provider (invariant I5).
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_dimension() -> usize {
    1536
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub metadata_store: MetadataStoreConfig,
    pub vector_index: Option<VectorIndexConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MemoryCategorySeed {
    pub name: String,
    pub description: String,
    pub target_length: Option<usize>,
    pub summary_prompt: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MemorizeConfig {
    pub category_assign_threshold: f32,
    #[serde(default)]
    pub multimodal_preprocess_prompts: HashMap<String, String>,
    pub preprocess_llm_profile: String,
    pub memory_types: Vec<String>,
    #[serde(default)]
    pub memory_type_prompts: HashMap<String, String>,
    pub memory_extract_llm_profile: String,
    #[serde(default)]
    pub memory_categories: Vec<MemoryCategorySeed>,
    pub default_category_summary_prompt: String,
    pub default_category_summary_target_length: usize,
    pub category_update_llm_profile: String,
}

impl Default for MemorizeConfig {
    fn default() -> Self {
        Self {
            category_assign_threshold: 0.3,
            multimodal_preprocess_prompts: HashMap::new(),
            preprocess_llm_profile: "default".to_string(),
            memory_types: vec![
                "profile".to_string(),
                "event".to_string(),
                "knowledge".to_string(),
                "behavior".to_string(),
            ],
            memory_type_prompts: HashMap::new(),
            memory_extract_llm_profile: "default".to_string(),
            memory_categories: Vec::new(),
            default_category_summary_prompt: "Summarize the following memories into one concise paragraph."
                .to_string(),
            default_category_summary_target_length: 500,
            category_update_llm_profile: "default".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrieveMethod {
    Rag,
    Llm,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct SectionConfig {
    pub enabled: bool,
    pub top_k: usize,
}

impl SectionConfig {
    pub fn enabled(top_k: usize) -> Self {
        Self { enabled: true, top_k }
    }
}

/// Salience composite weights (spec §4.3, §9 open question: no
/// source-provided default — this deployment documents 0.7/0.2/0.1, biasing
/// toward semantic similarity with a modest recency/reinforcement nudge).
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct SalienceConfig {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl Default for SalienceConfig {
    fn default() -> Self {
        Self { alpha: 0.7, beta: 0.2, gamma: 0.1 }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RetrieveConfig {
    pub method: RetrieveMethod,
    pub route_intention: bool,
    pub category: SectionConfig,
    pub item: SectionConfig,
    pub resource: SectionConfig,
    pub sufficiency_check: bool,
    pub sufficiency_check_prompt: String,
    pub sufficiency_check_llm_profile: String,
    pub llm_ranking_llm_profile: String,
    #[serde(default)]
    pub salience: SalienceConfig,
}

impl Default for RetrieveConfig {
    fn default() -> Self {
        Self {
            method: RetrieveMethod::Rag,
            route_intention: true,
            category: SectionConfig::enabled(3),
            item: SectionConfig::enabled(5),
            resource: SectionConfig::enabled(3),
            sufficiency_check: false,
            sufficiency_check_prompt: "Is the context above sufficient to answer the query? Reply yes or no."
                .to_string(),
            sufficiency_check_llm_profile: "default".to_string(),
            llm_ranking_llm_profile: "default".to_string(),
            salience: SalienceConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserConfig {
    pub model: Vec<String>,
}

/// The full configuration a [`crate::service::MemoryService`] is built from
/// (spec §6). `llm_profiles` must contain a profile named `default`.
#[derive(Clone, Debug)]
pub struct MemoryConfig {
    pub llm_profiles: Vec<Profile>,
    pub blob_config: BlobConfig,
    pub database_config: DatabaseConfig,
    pub memorize_config: MemorizeConfig,
    pub retrieve_config: RetrieveConfig,
    pub user_config: UserConfig,
}

impl MemoryConfig {
    pub fn scope_model(&self) -> ScopeModel {
        ScopeModel::new(self.user_config.model.clone())
    }

    pub fn profile_table(&self) -> ProfileTable {
        ProfileTable::new(self.llm_profiles.clone())
    }

    pub fn has_default_profile(&self) -> bool {
        self.llm_profiles.iter().any(|p| p.name == "default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memorize_config_default_has_four_memory_types() {
        let config = MemorizeConfig::default();
        assert_eq!(config.memory_types.len(), 4);
        assert!(config.memory_types.contains(&"profile".to_string()));
    }

    #[test]
    fn retrieve_config_default_uses_rag() {
        let config = RetrieveConfig::default();
        assert_eq!(config.method, RetrieveMethod::Rag);
        assert!(!config.sufficiency_check);
    }
}
