//! Standalone intent classifier: a fallback utility kept for callers
//! that want classification without the combined respond step. Not on
//! the `handle_turn` hot path — the combined call in [`crate::parsing`]
//! covers that case more cheaply.

use std::sync::Arc;

use support_agent_core::domain::IntentType;
use support_agent_core::ports::{ChatMessage, GenerateRequest, LanguageModel};

const CLASSIFY_TEMPERATURE: f32 = 0.0;
const CLASSIFY_MAX_TOKENS: u32 = 20;

pub struct IntentClassifier {
    language_model: Arc<dyn LanguageModel>,
}

impl IntentClassifier {
    pub fn new(language_model: Arc<dyn LanguageModel>) -> Self {
        Self { language_model }
    }

    /// One call, and on failure or an unparseable label, one retry.
    /// If the retry also fails, defaults to `Conversational` rather
    /// than surfacing an error — a classification utility must never
    /// be the reason a turn fails.
    pub async fn classify(&self, vertical: &str, message: &str) -> IntentType {
        for _ in 0..2 {
            if let Some(intent) = self.try_classify(vertical, message).await {
                return intent;
            }
        }
        IntentType::Conversational
    }

    async fn try_classify(&self, vertical: &str, message: &str) -> Option<IntentType> {
        let prompt = format!(
            "Classify the following {vertical} support message as exactly one word: \
             conversational, domain_query, or out_of_scope.\n\nMessage: {message}\n\nLabel:"
        );
        let request = GenerateRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(CLASSIFY_TEMPERATURE)
            .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self.language_model.generate(request).await.ok()?;
        parse_label(&response.text)
    }
}

fn parse_label(raw: &str) -> Option<IntentType> {
    let cleaned = raw.trim().trim_matches(crate::parsing::TRIM_CHARS).to_lowercase();
    match cleaned.as_str() {
        "conversational" => Some(IntentType::Conversational),
        "domain_query" => Some(IntentType::DomainQuery),
        "out_of_scope" => Some(IntentType::OutOfScope),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_labels() {
        assert_eq!(parse_label("domain_query"), Some(IntentType::DomainQuery));
        assert_eq!(parse_label(" \"out_of_scope\".\n"), Some(IntentType::OutOfScope));
    }

    #[test]
    fn rejects_unrecognized_label() {
        assert_eq!(parse_label("unsure"), None);
    }
}
