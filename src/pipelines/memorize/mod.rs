//! The memorize pipeline: fetch → preprocess → extract → dedupe → persist →
//! recompute category summaries → build response (spec §4.2).

mod build_response;
mod categorize_items;
mod dedupe_merge;
mod extract_items;
mod ingest_resource;
pub(crate) mod persist_index;
mod preprocess_multimodal;
pub mod types;

use std::sync::Arc;

use crate::config::MemoryConfig;
use crate::service::ServiceContext;
use crate::workflow::{PipelineError, PipelineManager, Step};

pub fn steps(config: &MemoryConfig) -> Vec<Arc<dyn Step<ServiceContext>>> {
    let memorize = &config.memorize_config;
    vec![
        Arc::new(ingest_resource::IngestResource::new()),
        Arc::new(preprocess_multimodal::PreprocessMultimodal::new(&memorize.preprocess_llm_profile)),
        Arc::new(extract_items::ExtractItems::new(&memorize.memory_extract_llm_profile, memorize.memory_types.clone())),
        Arc::new(dedupe_merge::DedupeMerge::new()),
        Arc::new(categorize_items::CategorizeItems::new(&memorize.memory_extract_llm_profile)),
        Arc::new(persist_index::PersistIndex::new(&memorize.category_update_llm_profile)),
        Arc::new(build_response::BuildResponse::new()),
    ]
}

pub fn register(manager: &PipelineManager<ServiceContext>, config: &MemoryConfig) -> Result<(), PipelineError> {
    manager.register_pipeline("memorize", ["resource_url", "modality", "summary_prompt"], steps(config))
}
