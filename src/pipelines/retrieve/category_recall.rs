//! Step B: category recall, RAG (embed + cosine top-k) or LLM (chat ranking
//! with RAG fallback on unparseable output) (spec §4.3).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::RetrieveMethod;
use crate::error::MemoryError;
use crate::pipelines::support::{cfg_i64, cfg_str};
use crate::scope::ScopeValue;
use crate::service::ServiceContext;
use crate::storage::WhereFilter;
use crate::workflow::{Capability, ConfigValue, PipelineState, Step, StepContext, StepSpec};

use super::recall_support::{llm_rank_ids, parse_where, CANDIDATE_OVERHEAD};
use super::types::ScoredCategory;

pub struct CategoryRecall {
    spec: StepSpec,
    method: RetrieveMethod,
}

impl CategoryRecall {
    pub fn new(method: RetrieveMethod, top_k: usize, embed_llm_profile: &str, ranking_llm_profile: &str) -> Self {
        Self {
            spec: StepSpec::new("category_recall")
                .requires(["rewritten_query", "where_raw"])
                .produces(["categories"])
                .capability(Capability::Llm)
                .capability(Capability::Vector)
                .config("top_k", ConfigValue::Int(top_k as i64))
                .config("embed_llm_profile", embed_llm_profile)
                .config("ranking_llm_profile", ranking_llm_profile),
            method,
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for CategoryRecall {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;

        let rewritten_query: String = state.get_typed("rewritten_query").unwrap_or_default();
        let where_raw: BTreeMap<String, ScopeValue> = state.get_typed("where_raw").unwrap_or_default();
        let where_in: BTreeMap<String, Vec<ScopeValue>> = state.get_typed("where_in").unwrap_or_default();
        let filter = parse_where(&where_raw, &where_in, &ctx.shared.config.scope_model())?;
        let top_k = cfg_i64(&self.spec, "top_k", 3).max(0) as usize;
        let embed_profile = cfg_str(&self.spec, "embed_llm_profile", "default");

        let scored = match self.method {
            RetrieveMethod::Rag => rag_recall(ctx, &rewritten_query, top_k, &filter, embed_profile).await?,
            RetrieveMethod::Llm => {
                let ranking_profile = cfg_str(&self.spec, "ranking_llm_profile", "default");
                let client = ctx.shared.llm.resolve(ranking_profile).map_err(MemoryError::from)?;
                let candidates = ctx.shared.repos.categories.list(&filter).await?;
                let bounded: Vec<_> = candidates.into_iter().take(top_k * CANDIDATE_OVERHEAD).collect();
                let rows: Vec<(String, String, String)> = bounded
                    .iter()
                    .map(|c| (c.id.clone(), c.name.clone(), c.summary.clone().unwrap_or_default()))
                    .collect();
                match llm_rank_ids(client.as_ref(), &rewritten_query, &rows, top_k).await? {
                    Some(ids) => ids
                        .into_iter()
                        .filter_map(|id| bounded.iter().find(|c| c.id == id).cloned())
                        .map(|category| ScoredCategory { category, score: None })
                        .collect(),
                    None => rag_recall(ctx, &rewritten_query, top_k, &filter, embed_profile).await?,
                }
            }
        };

        state.set_typed("categories", &scored);
        Ok(())
    }
}

async fn rag_recall(
    ctx: &StepContext<'_, ServiceContext>,
    query: &str,
    top_k: usize,
    filter: &WhereFilter,
    embed_profile: &str,
) -> Result<Vec<ScoredCategory>, MemoryError> {
    let embed_client = ctx.shared.llm.resolve_embed(embed_profile)?;
    let (mut vectors, _usage) = embed_client.embed(&[query.to_string()]).await.map_err(MemoryError::from)?;
    let Some(embedding) = vectors.pop() else {
        return Ok(Vec::new());
    };
    let hits = ctx.shared.repos.categories.similarity_search(&embedding, top_k, filter).await?;
    Ok(hits.into_iter().map(|h| ScoredCategory { category: h.record, score: Some(h.score) }).collect())
}
