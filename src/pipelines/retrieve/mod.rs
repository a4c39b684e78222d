//! The retrieve pipelines: `retrieve_rag` and `retrieve_llm`, sharing the
//! same seven-stage layout with different recall scoring (spec §4.3).

mod build;
mod category_recall;
mod item_recall;
mod recall_support;
mod resource_recall;
mod route_rewrite;
mod sufficiency;
pub mod types;

use std::sync::Arc;

use crate::config::{MemoryConfig, RetrieveMethod};
use crate::service::ServiceContext;
use crate::workflow::{PipelineError, PipelineManager, Step};

fn steps(config: &MemoryConfig, method: RetrieveMethod) -> Vec<Arc<dyn Step<ServiceContext>>> {
    let retrieve = &config.retrieve_config;
    let ranking_profile = &retrieve.llm_ranking_llm_profile;
    let embed_profile = "default";

    vec![
        Arc::new(route_rewrite::RouteRewrite::new(retrieve.route_intention, "default")),
        Arc::new(category_recall::CategoryRecall::new(method, retrieve.category.top_k, embed_profile, ranking_profile)),
        Arc::new(sufficiency::SufficiencyCheck::new(
            "sufficiency_after_category",
            retrieve.sufficiency_check,
            &retrieve.sufficiency_check_prompt,
            &retrieve.sufficiency_check_llm_profile,
        )),
        Arc::new(item_recall::ItemRecall::new(
            method,
            retrieve.item.top_k,
            embed_profile,
            ranking_profile,
            retrieve.salience.alpha,
            retrieve.salience.beta,
            retrieve.salience.gamma,
        )),
        Arc::new(sufficiency::SufficiencyCheck::new(
            "sufficiency_after_item",
            retrieve.sufficiency_check,
            &retrieve.sufficiency_check_prompt,
            &retrieve.sufficiency_check_llm_profile,
        )),
        Arc::new(resource_recall::ResourceRecall::new(method, retrieve.resource.top_k, embed_profile, ranking_profile)),
        Arc::new(build::BuildRetrieveResponse::new()),
    ]
}

pub fn register(manager: &PipelineManager<ServiceContext>, config: &MemoryConfig) -> Result<(), PipelineError> {
    manager.register_pipeline("retrieve_rag", ["queries", "where_raw"], steps(config, RetrieveMethod::Rag))?;
    manager.register_pipeline("retrieve_llm", ["queries", "where_raw"], steps(config, RetrieveMethod::Llm))?;
    Ok(())
}
