//! The CRUD pipelines: `patch_create`, `patch_update`, `patch_delete`,
//! `crud_list_items`, `crud_list_categories` (spec §4.4).

mod create;
mod delete;
mod list_categories;
mod list_items;
pub mod types;
mod update;

pub(crate) mod support;

use std::sync::Arc;

use crate::config::MemoryConfig;
use crate::service::ServiceContext;
use crate::workflow::{PipelineError, PipelineManager, Step};

pub fn register(manager: &PipelineManager<ServiceContext>, config: &MemoryConfig) -> Result<(), PipelineError> {
    let memorize = &config.memorize_config;

    manager.register_pipeline(
        "patch_create",
        ["memory_type", "content", "category_names"],
        vec![Arc::new(create::CreateMemoryItem::new(
            memorize.memory_types.clone(),
            "default",
            &memorize.category_update_llm_profile,
        )) as Arc<dyn Step<ServiceContext>>],
    )?;

    manager.register_pipeline(
        "patch_update",
        ["item_id", "memory_type", "content", "category_names"],
        vec![Arc::new(update::UpdateMemoryItem::new("default", &memorize.category_update_llm_profile))
            as Arc<dyn Step<ServiceContext>>],
    )?;

    manager.register_pipeline(
        "patch_delete",
        ["item_id"],
        vec![Arc::new(delete::DeleteMemoryItem::new(&memorize.category_update_llm_profile)) as Arc<dyn Step<ServiceContext>>],
    )?;

    manager.register_pipeline(
        "crud_list_items",
        ["where_raw"],
        vec![Arc::new(list_items::ListMemoryItems::new()) as Arc<dyn Step<ServiceContext>>],
    )?;

    manager.register_pipeline(
        "crud_list_categories",
        ["where_raw"],
        vec![Arc::new(list_categories::ListMemoryCategories::new()) as Arc<dyn Step<ServiceContext>>],
    )?;

    Ok(())
}
