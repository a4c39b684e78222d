//! Shared helpers for the three recall steps (B/D/F): `where` parsing, the
//! LLM-ranking candidate format, and salience scoring (spec §4.3).

use std::collections::BTreeMap;

use crate::error::MemoryError;
use crate::llm::{CallOptions, ChatMessage, LlmClient};
use crate::scope::{ScopeModel, ScopeValue};
use crate::storage::WhereFilter;

/// How many candidates an LLM-ranking call is allowed to see per `top_k`
/// (spec §4.3 backpressure: "cap candidate fetches by configured `top_k` ×
/// constant overhead").
pub(crate) const CANDIDATE_OVERHEAD: usize = 4;

pub(crate) fn parse_where(
    where_raw: &BTreeMap<String, ScopeValue>,
    where_in: &BTreeMap<String, Vec<ScopeValue>>,
    model: &ScopeModel,
) -> Result<WhereFilter, MemoryError> {
    WhereFilter::parse(where_raw, where_in, model).map_err(MemoryError::from)
}

/// Asks the chat LLM to pick the `top_k` most relevant ids out of
/// `id|name|summary` rows. Returns `None` if the reply doesn't parse as a
/// JSON array of strings (caller falls back to RAG scoring for that stage).
pub(crate) async fn llm_rank_ids(
    client: &dyn LlmClient,
    query: &str,
    rows: &[(String, String, String)],
    top_k: usize,
) -> Result<Option<Vec<String>>, MemoryError> {
    if rows.is_empty() {
        return Ok(Some(Vec::new()));
    }
    let formatted = rows
        .iter()
        .map(|(id, name, summary)| format!("{id}|{name}|{summary}"))
        .collect::<Vec<_>>()
        .join("\n");
    let system = format!(
        "Below are candidate records as id|name|summary. Pick the {top_k} most relevant to the \
         query and reply with a JSON array of their ids only, most relevant first."
    );
    let user = format!("Query: {query}\n\nCandidates:\n{formatted}");
    let messages = [ChatMessage::system(system), ChatMessage::user(user)];
    let (raw, _usage) = client.chat(&messages, &CallOptions::default()).await.map_err(MemoryError::from)?;

    let Some(json_slice) = extract_json_array(&raw) else {
        return Ok(None);
    };
    match serde_json::from_str::<Vec<String>>(json_slice) {
        Ok(mut ids) => {
            ids.truncate(top_k);
            Ok(Some(ids))
        }
        Err(_) => Ok(None),
    }
}

fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}

/// `recency(now, updated_at)`: exponential decay over a 30-day half-life,
/// so same-day updates score near 1.0 and month-old ones near 0.5.
pub(crate) fn recency_score(now: chrono::DateTime<chrono::Utc>, updated_at: chrono::DateTime<chrono::Utc>) -> f32 {
    let age_days = (now - updated_at).num_seconds().max(0) as f32 / 86_400.0;
    0.5f32.powf(age_days / 30.0)
}
