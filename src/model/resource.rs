//! Resource: one ingested artifact (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// Kind of artifact a [`Resource`] was fetched from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Conversation,
    Document,
    Image,
    Video,
    Audio,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Conversation => "conversation",
            Modality::Document => "document",
            Modality::Image => "image",
            Modality::Video => "video",
            Modality::Audio => "audio",
        }
    }
}

impl std::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conversation" => Ok(Modality::Conversation),
            "document" => Ok(Modality::Document),
            "image" => Ok(Modality::Image),
            "video" => Ok(Modality::Video),
            "audio" => Ok(Modality::Audio),
            other => Err(format!("unknown modality: {other}")),
        }
    }
}

/// One ingested artifact. Created by memorize's `ingest_resource` step;
/// mutated only by `preprocess_multimodal`; never deleted by retrieve.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub url: String,
    pub modality: Modality,
    pub local_path: Option<String>,
    pub caption: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scope: Scope,
}

impl Resource {
    pub fn new(url: impl Into<String>, modality: Modality, scope: Scope) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            url: url.into(),
            modality,
            local_path: None,
            caption: None,
            embedding: None,
            created_at: now,
            updated_at: now,
            scope,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = super::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modality_round_trips_through_str() {
        for m in [
            Modality::Conversation,
            Modality::Document,
            Modality::Image,
            Modality::Video,
            Modality::Audio,
        ] {
            let parsed: Modality = m.as_str().parse().unwrap();
            assert_eq!(parsed.as_str(), m.as_str());
        }
    }

    #[test]
    fn unknown_modality_rejected() {
        assert!("spreadsheet".parse::<Modality>().is_err());
    }
}
