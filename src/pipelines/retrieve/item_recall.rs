//! Step D: item recall. RAG mode additionally applies a salience composite
//! over the raw cosine top-k (spec §4.3: `score = α·cosine + β·recency +
//! γ·hits`, ties broken by `updated_at` desc).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::RetrieveMethod;
use crate::error::MemoryError;
use crate::pipelines::support::{cfg_f64, cfg_i64, cfg_str};
use crate::scope::ScopeValue;
use crate::service::ServiceContext;
use crate::storage::WhereFilter;
use crate::workflow::{Capability, ConfigValue, PipelineState, Step, StepContext, StepSpec};

use super::recall_support::{llm_rank_ids, parse_where, recency_score, CANDIDATE_OVERHEAD};
use super::types::ScoredItem;

pub struct ItemRecall {
    spec: StepSpec,
    method: RetrieveMethod,
}

impl ItemRecall {
    pub fn new(
        method: RetrieveMethod,
        top_k: usize,
        embed_llm_profile: &str,
        ranking_llm_profile: &str,
        alpha: f32,
        beta: f32,
        gamma: f32,
    ) -> Self {
        Self {
            spec: StepSpec::new("item_recall")
                .requires(["rewritten_query", "where_raw"])
                .produces(["items"])
                .capability(Capability::Llm)
                .capability(Capability::Vector)
                .config("top_k", ConfigValue::Int(top_k as i64))
                .config("embed_llm_profile", embed_llm_profile)
                .config("ranking_llm_profile", ranking_llm_profile)
                .config("alpha", ConfigValue::Float(alpha as f64))
                .config("beta", ConfigValue::Float(beta as f64))
                .config("gamma", ConfigValue::Float(gamma as f64)),
            method,
        }
    }
}

#[async_trait]
impl Step<ServiceContext> for ItemRecall {
    fn spec(&self) -> &StepSpec {
        &self.spec
    }

    async fn run(&self, state: &mut PipelineState, ctx: &StepContext<'_, ServiceContext>) -> Result<(), MemoryError> {
        ctx.check_cancelled()?;
        if state.is_halted() {
            return Ok(());
        }

        let rewritten_query: String = state.get_typed("rewritten_query").unwrap_or_default();
        let where_raw: BTreeMap<String, ScopeValue> = state.get_typed("where_raw").unwrap_or_default();
        let where_in: BTreeMap<String, Vec<ScopeValue>> = state.get_typed("where_in").unwrap_or_default();
        let filter = parse_where(&where_raw, &where_in, &ctx.shared.config.scope_model())?;
        let top_k = cfg_i64(&self.spec, "top_k", 5).max(0) as usize;
        let embed_profile = cfg_str(&self.spec, "embed_llm_profile", "default");

        let scored = match self.method {
            RetrieveMethod::Rag => self.rag_recall(ctx, &rewritten_query, top_k, &filter, embed_profile).await?,
            RetrieveMethod::Llm => {
                let ranking_profile = cfg_str(&self.spec, "ranking_llm_profile", "default");
                let client = ctx.shared.llm.resolve(ranking_profile).map_err(MemoryError::from)?;
                let candidates = ctx.shared.repos.items.list(&filter).await?;
                let bounded: Vec<_> = candidates.into_iter().take(top_k * CANDIDATE_OVERHEAD).collect();
                let rows: Vec<(String, String, String)> =
                    bounded.iter().map(|i| (i.id.clone(), i.memory_type.clone(), i.summary.clone())).collect();
                match llm_rank_ids(client.as_ref(), &rewritten_query, &rows, top_k).await? {
                    Some(ids) => ids
                        .into_iter()
                        .filter_map(|id| bounded.iter().find(|i| i.id == id).cloned())
                        .map(|item| ScoredItem { item, score: None })
                        .collect(),
                    None => self.rag_recall(ctx, &rewritten_query, top_k, &filter, embed_profile).await?,
                }
            }
        };

        state.set_typed("items", &scored);
        Ok(())
    }
}

impl ItemRecall {
    async fn rag_recall(
        &self,
        ctx: &StepContext<'_, ServiceContext>,
        query: &str,
        top_k: usize,
        filter: &WhereFilter,
        embed_profile: &str,
    ) -> Result<Vec<ScoredItem>, MemoryError> {
        let embed_client = ctx.shared.llm.resolve_embed(embed_profile)?;
        let (mut vectors, _usage) = embed_client.embed(&[query.to_string()]).await.map_err(MemoryError::from)?;
        let Some(embedding) = vectors.pop() else {
            return Ok(Vec::new());
        };
        // over-fetch so the salience re-rank below has room to reorder
        let hits = ctx.shared.repos.items.similarity_search(&embedding, top_k * CANDIDATE_OVERHEAD, filter).await?;

        let alpha = cfg_f64(&self.spec, "alpha", 0.7) as f32;
        let beta = cfg_f64(&self.spec, "beta", 0.2) as f32;
        let gamma = cfg_f64(&self.spec, "gamma", 0.1) as f32;
        let now = crate::model::now();

        let mut composite: Vec<ScoredItem> = hits
            .into_iter()
            .map(|h| {
                // `hits` (reinforcement) isn't tracked by MemoryItem; treated as 0.
                let recency = recency_score(now, h.record.updated_at);
                let score = alpha * h.score + beta * recency + gamma * 0.0;
                ScoredItem { item: h.record, score: Some(score) }
            })
            .collect();

        composite.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.item.updated_at.cmp(&a.item.updated_at))
        });
        composite.truncate(top_k);
        Ok(composite)
    }
}
