//! `MemoryService`: the public façade (spec §2, §6).
//!
//! Owns configuration and the five collaborating subsystems; every public
//! method runs a named pipeline against a [`ServiceContext`] shared by all
//! steps (spec §9: "one façade holding a pipeline manager; each public
//! method invokes a named pipeline; extension happens by inserting steps,
//! not subclassing").

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::json;

use crate::config::{DdlMode, MemoryConfig, MetadataProvider, VectorIndexProvider};
use crate::error::{ErrorKind, MemoryError};
use crate::fetcher::{Fetcher, LocalFetcher};
use crate::llm::ClientCache;
use crate::model::{MemoryCategory, MemoryItem};
use crate::pipelines;
use crate::scope::{Scope, ScopeValue};
use crate::storage::{self, RepositorySet};
use crate::workflow::{
    CancellationToken, ConfigValue, PipelineManager, PipelineState, Retry, Runner,
};

/// Everything a pipeline step needs besides the state it mutates: the
/// repository set, the LLM client cache, the fetcher, and the resolved
/// configuration (spec §5 "shared state").
pub struct ServiceContext {
    pub repos: RepositorySet,
    pub llm: ClientCache,
    pub fetcher: Arc<dyn Fetcher>,
    pub config: MemoryConfig,
}

/// Core memory service. Cloning is cheap: everything inside is `Arc`-backed
/// or itself cheaply cloneable.
#[derive(Clone)]
pub struct MemoryService {
    context: Arc<ServiceContext>,
    pipelines: Arc<PipelineManager<ServiceContext>>,
    runner: Arc<Runner<ServiceContext>>,
}

fn build_repositories(config: &MemoryConfig) -> Result<RepositorySet, MemoryError> {
    let scope_model = config.scope_model();
    let metadata = &config.database_config.metadata_store;
    match metadata.provider {
        MetadataProvider::InMemory => Ok(storage::in_memory::repository_set()),
        MetadataProvider::Relational => {
            let dsn = metadata
                .dsn
                .clone()
                .ok_or_else(|| MemoryError::invalid_input("database_config.metadata_store.dsn is required"))?;
            if matches!(metadata.ddl_mode, DdlMode::Validate) && !dsn.exists() {
                return Err(MemoryError::new(
                    ErrorKind::BackendUnavailable,
                    format!("ddl_mode=validate but database does not exist: {}", dsn.display()),
                ));
            }
            storage::relational::repository_set(storage::relational::RelationalConfig { dsn, scope_model })
                .map_err(MemoryError::from)
        }
        MetadataProvider::RelationalVector => {
            let dsn = metadata
                .dsn
                .clone()
                .ok_or_else(|| MemoryError::invalid_input("database_config.metadata_store.dsn is required"))?;
            let dimension = config
                .database_config
                .vector_index
                .as_ref()
                .filter(|v| v.provider == VectorIndexProvider::Native)
                .map(|v| v.dimension)
                .unwrap_or(1536);
            storage::vector::repository_set(storage::vector::VectorConfig { dsn, scope_model, dimension })
                .map_err(MemoryError::from)
        }
    }
}

impl MemoryService {
    /// Builds a service from a fully-assembled [`MemoryConfig`], wiring the
    /// configured storage provider and registering the default pipelines
    /// (`memorize`, `retrieve_rag`, `retrieve_llm`, `patch_create`,
    /// `patch_update`, `patch_delete`, `crud_list_items`,
    /// `crud_list_categories`).
    pub fn new(config: MemoryConfig) -> Result<Self, MemoryError> {
        if !config.has_default_profile() {
            return Err(MemoryError::invalid_input("llm_profiles must contain a profile named \"default\""));
        }
        let repos = build_repositories(&config)?;
        let llm = ClientCache::new(config.profile_table());

        let manager = PipelineManager::<ServiceContext>::new();
        pipelines::register_all(&manager, &config)?;

        let context = Arc::new(ServiceContext {
            repos,
            llm,
            fetcher: Arc::new(LocalFetcher),
            config,
        });

        Ok(Self {
            context,
            pipelines: Arc::new(manager),
            runner: Arc::new(Runner::new().with_retry(Retry::default())),
        })
    }

    /// Builds a service with a caller-supplied [`Fetcher`] (tests swap in a
    /// deterministic one instead of [`LocalFetcher`]).
    pub fn with_fetcher(config: MemoryConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, MemoryError> {
        let mut service = Self::new(config)?;
        let mut context = (*service.context).clone_parts();
        context.fetcher = fetcher;
        service.context = Arc::new(context);
        Ok(service)
    }

    pub fn scope_model(&self) -> crate::scope::ScopeModel {
        self.context.config.scope_model()
    }

    async fn run(
        &self,
        pipeline_name: &str,
        initial: HashMap<String, serde_json::Value>,
        scope: Scope,
    ) -> Result<PipelineState, MemoryError> {
        let pipeline = self.pipelines.snapshot(pipeline_name)?;
        let state = PipelineState::from_initial(initial);
        self.runner
            .run(&pipeline, state, &self.context, scope, CancellationToken::new())
            .await
            .map_err(|run_error| run_error.source)
    }

    /// `memorize(resource_url, modality, summary_prompt?, user) → {resource, items, categories, relations}` (spec §6).
    pub async fn memorize(
        &self,
        resource_url: impl Into<String>,
        modality: impl Into<String>,
        summary_prompt: Option<String>,
        scope: Scope,
    ) -> Result<pipelines::memorize::types::MemorizeResponse, MemoryError> {
        let mut initial = HashMap::new();
        initial.insert("resource_url".to_string(), json!(resource_url.into()));
        initial.insert("modality".to_string(), json!(modality.into()));
        if let Some(prompt) = summary_prompt {
            initial.insert("summary_prompt".to_string(), json!(prompt));
        }

        let final_state = self.run("memorize", initial, scope).await?;
        final_state
            .get_typed("response")
            .ok_or_else(|| MemoryError::invalid_input("memorize pipeline produced no response"))
    }

    /// `retrieve(queries, where?, where_in?) → {needs_retrieval, ...}` (spec §6).
    /// `where_in` carries the `key__in` list-membership operators (spec §4.3,
    /// §6) that `where_raw`'s scalar map cannot express.
    pub async fn retrieve(
        &self,
        queries: Vec<pipelines::retrieve::types::Query>,
        where_raw: BTreeMap<String, ScopeValue>,
        where_in: BTreeMap<String, Vec<ScopeValue>>,
        scope: Scope,
    ) -> Result<pipelines::retrieve::types::RetrieveResponse, MemoryError> {
        let pipeline_name = match self.context.config.retrieve_config.method {
            crate::config::RetrieveMethod::Rag => "retrieve_rag",
            crate::config::RetrieveMethod::Llm => "retrieve_llm",
        };
        let mut initial = HashMap::new();
        initial.insert("queries".to_string(), json!(queries));
        initial.insert("where_raw".to_string(), json!(where_raw));
        initial.insert("where_in".to_string(), json!(where_in));

        let final_state = self.run(pipeline_name, initial, scope).await?;
        final_state
            .get_typed("response")
            .ok_or_else(|| MemoryError::invalid_input("retrieve pipeline produced no response"))
    }

    /// `create_memory_item(type, content, category_names, scope)` (spec §4.4).
    pub async fn create_memory_item(
        &self,
        memory_type: impl Into<String>,
        content: impl Into<String>,
        category_names: Vec<String>,
        scope: Scope,
    ) -> Result<pipelines::crud::types::ItemMutationResponse, MemoryError> {
        let mut initial = HashMap::new();
        initial.insert("memory_type".to_string(), json!(memory_type.into()));
        initial.insert("content".to_string(), json!(content.into()));
        initial.insert("category_names".to_string(), json!(category_names));

        let final_state = self.run("patch_create", initial, scope).await?;
        final_state
            .get_typed("response")
            .ok_or_else(|| MemoryError::invalid_input("patch_create pipeline produced no response"))
    }

    /// `update_memory_item(id, type?, content?, category_names?, scope)` (spec §4.4).
    pub async fn update_memory_item(
        &self,
        id: impl Into<String>,
        memory_type: Option<String>,
        content: Option<String>,
        category_names: Option<Vec<String>>,
        scope: Scope,
    ) -> Result<pipelines::crud::types::ItemMutationResponse, MemoryError> {
        if memory_type.is_none() && content.is_none() && category_names.is_none() {
            return Err(MemoryError::invalid_input("update_memory_item requires at least one changed field"));
        }
        let mut initial = HashMap::new();
        initial.insert("item_id".to_string(), json!(id.into()));
        if let Some(t) = memory_type {
            initial.insert("memory_type".to_string(), json!(t));
        }
        if let Some(c) = content {
            initial.insert("content".to_string(), json!(c));
        }
        if let Some(names) = category_names {
            initial.insert("category_names".to_string(), json!(names));
        }

        let final_state = self.run("patch_update", initial, scope).await?;
        final_state
            .get_typed("response")
            .ok_or_else(|| MemoryError::invalid_input("patch_update pipeline produced no response"))
    }

    /// `delete_memory_item(id, scope)` (spec §4.4).
    pub async fn delete_memory_item(&self, id: impl Into<String>, scope: Scope) -> Result<(), MemoryError> {
        let mut initial = HashMap::new();
        initial.insert("item_id".to_string(), json!(id.into()));
        self.run("patch_delete", initial, scope).await?;
        Ok(())
    }

    /// `list_memory_items(where, where_in?)` (spec §4.4: filter-only read, no
    /// scoring). `where_in` carries `key__in` list-membership conditions.
    pub async fn list_memory_items(
        &self,
        where_raw: BTreeMap<String, ScopeValue>,
        where_in: BTreeMap<String, Vec<ScopeValue>>,
        scope: Scope,
    ) -> Result<Vec<MemoryItem>, MemoryError> {
        let mut initial = HashMap::new();
        initial.insert("where_raw".to_string(), json!(where_raw));
        initial.insert("where_in".to_string(), json!(where_in));
        let final_state = self.run("crud_list_items", initial, scope).await?;
        Ok(final_state.get_typed("items").unwrap_or_default())
    }

    /// `list_memory_categories(where, where_in?)` (spec §4.4: filter-only
    /// read, no scoring). `where_in` carries `key__in` list-membership
    /// conditions.
    pub async fn list_memory_categories(
        &self,
        where_raw: BTreeMap<String, ScopeValue>,
        where_in: BTreeMap<String, Vec<ScopeValue>>,
        scope: Scope,
    ) -> Result<Vec<MemoryCategory>, MemoryError> {
        let mut initial = HashMap::new();
        initial.insert("where_raw".to_string(), json!(where_raw));
        initial.insert("where_in".to_string(), json!(where_in));
        let final_state = self.run("crud_list_categories", initial, scope).await?;
        Ok(final_state.get_typed("categories").unwrap_or_default())
    }

    pub fn configure_pipeline(
        &self,
        pipeline: &str,
        step_id: &str,
        configs: HashMap<String, ConfigValue>,
    ) -> Result<u64, MemoryError> {
        self.pipelines.configure_step(pipeline, step_id, configs).map_err(MemoryError::from)
    }

    pub fn insert_step_before(
        &self,
        pipeline: &str,
        target: &str,
        new_step: Arc<dyn crate::workflow::Step<ServiceContext>>,
    ) -> Result<u64, MemoryError> {
        self.pipelines.insert_step_before(pipeline, target, new_step).map_err(MemoryError::from)
    }

    pub fn insert_step_after(
        &self,
        pipeline: &str,
        target: &str,
        new_step: Arc<dyn crate::workflow::Step<ServiceContext>>,
    ) -> Result<u64, MemoryError> {
        self.pipelines.insert_step_after(pipeline, target, new_step).map_err(MemoryError::from)
    }

    pub fn replace_step(
        &self,
        pipeline: &str,
        target: &str,
        new_step: Arc<dyn crate::workflow::Step<ServiceContext>>,
    ) -> Result<u64, MemoryError> {
        self.pipelines.replace_step(pipeline, target, new_step).map_err(MemoryError::from)
    }

    pub fn remove_step(&self, pipeline: &str, target: &str) -> Result<u64, MemoryError> {
        self.pipelines.remove_step(pipeline, target).map_err(MemoryError::from)
    }
}

impl ServiceContext {
    /// Shallow clone helper for [`MemoryService::with_fetcher`]: repositories
    /// and the LLM cache are `Arc`/cheaply-cloneable internally, so this
    /// does not duplicate any storage.
    fn clone_parts(&self) -> ServiceContext {
        ServiceContext {
            repos: self.repos.clone(),
            llm: ClientCache::new(self.config.profile_table()),
            fetcher: self.fetcher.clone(),
            config: self.config.clone(),
        }
    }
}
