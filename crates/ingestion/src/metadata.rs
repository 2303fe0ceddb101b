//! Stage 3 — Enrich: ask the language model for a summary
//! and three hypothetical customer questions per chunk. Failures are
//! logged and leave the chunk's metadata empty; they must never fail
//! ingestion.

use serde::Deserialize;
use std::sync::Arc;
use support_agent_core::ports::{ChatMessage, GenerateRequest, LanguageModel};

#[derive(Debug, Clone, Default)]
pub struct ChunkMetadata {
    pub summary: String,
    pub questions: Vec<String>,
}

#[derive(Deserialize)]
struct RawMetadata {
    summary: String,
    questions: Vec<String>,
}

const ENRICH_PROMPT: &str = "Read the following document chunk. Respond with strict JSON only, \
no prose, matching exactly this shape: {\"summary\": \"one sentence summary\", \
\"questions\": [\"question 1\", \"question 2\", \"question 3\"]}. The questions are \
hypothetical customer questions this chunk answers.\n\nChunk:\n";

pub async fn enrich_chunk(language_model: &Arc<dyn LanguageModel>, chunk_text: &str) -> ChunkMetadata {
    let prompt = format!("{ENRICH_PROMPT}{chunk_text}");
    let request = GenerateRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(0.0);

    let response = match language_model.generate(request).await {
        Ok(r) => r,
        Err(err) => {
            tracing::warn!(error = %err, "metadata enrichment call failed, leaving chunk metadata empty");
            return ChunkMetadata::default();
        }
    };

    match parse_metadata(&response.text) {
        Some(raw) => ChunkMetadata { summary: raw.summary, questions: raw.questions },
        None => {
            tracing::warn!("metadata enrichment returned unparseable JSON, leaving chunk metadata empty");
            ChunkMetadata::default()
        }
    }
}

fn parse_metadata(text: &str) -> Option<RawMetadata> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metadata_embedded_in_surrounding_prose() {
        let text = "Sure, here you go:\n{\"summary\": \"s\", \"questions\": [\"a\", \"b\", \"c\"]}\nthanks";
        let parsed = parse_metadata(text).unwrap();
        assert_eq!(parsed.summary, "s");
        assert_eq!(parsed.questions, vec!["a", "b", "c"]);
    }

    #[test]
    fn malformed_json_yields_none() {
        assert!(parse_metadata("not json at all").is_none());
    }
}
