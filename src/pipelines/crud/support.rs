//! Helpers shared by the CRUD steps: category get-or-create and
//! batch resummarization.

use crate::error::MemoryError;
use crate::model::{normalize_category_name, MemoryCategory};
use crate::pipelines::memorize::persist_index::resummarize;
use crate::service::ServiceContext;
use crate::workflow::StepContext;

/// Looks up a category by normalized name within scope, creating it with a
/// default description if it doesn't exist yet (spec §4.4 step 3).
pub(crate) async fn get_or_create_category(
    ctx: &StepContext<'_, ServiceContext>,
    name: &str,
) -> Result<MemoryCategory, MemoryError> {
    let normalized = normalize_category_name(name);
    if let Some(existing) = ctx.shared.repos.categories.get_by_normalized_name(&normalized, &ctx.scope).await? {
        return Ok(existing);
    }
    let description = format!("Category for \"{name}\"");
    let category = MemoryCategory::new(name.to_string(), description, ctx.scope.clone());
    Ok(ctx.shared.repos.categories.create(category).await?)
}

/// Recomputes the summary of each category in `categories`, deduplicated by
/// id, and returns the persisted results.
pub(crate) async fn resummarize_all(
    ctx: &StepContext<'_, ServiceContext>,
    categories: Vec<MemoryCategory>,
    profile_name: &str,
) -> Vec<MemoryCategory> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    for category in categories {
        if seen.insert(category.id.clone()) {
            out.push(resummarize(ctx, category, profile_name).await);
        }
    }
    out
}
