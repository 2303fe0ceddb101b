//! Prompt assembly: the system prompt is constant across
//! branches, parameterized per tenant; the combined classify+respond
//! prompt and the grounded-answer prompt are built fresh per turn.

use chrono::NaiveDate;

use support_agent_core::domain::TenantConfig;

/// The seven required behavioral rules, in order.
pub fn system_prompt(config: &TenantConfig, today: NaiveDate) -> String {
    let blocked = if config.blocked_topics.is_empty() {
        "none".to_string()
    } else {
        config.blocked_topics.join(", ")
    };

    format!(
        "You are {persona}, a support assistant for {company} in the {vertical} domain.\n\
         {description}\n\
         Today's date is {date}.\n\
         \n\
         Rules:\n\
         1. Answer only from the retrieved context you are given. Never invent facts.\n\
         2. If the context is insufficient to answer confidently, say so plainly rather than guessing.\n\
         3. Decline to discuss these blocked topics: {blocked}.\n\
         4. Keep simple answers to 2-4 sentences; use structured lists for multi-part questions.\n\
         5. Never mention being an AI unless the user asks directly.\n\
         6. A wrong answer is worse than escalating to a human — when in doubt, say so.\n\
         7. Cite the source document and section for any claim drawn from context.",
        persona = config.persona_name,
        company = config.company_name,
        vertical = config.vertical,
        description = config.persona_description,
        date = today,
        blocked = blocked,
    )
}

/// The single hot-path call for non-RAG branches: names the vertical,
/// lists allowed topics, includes windowed history, and instructs the
/// exact two-line `INTENT:`/`RESPONSE:` output contract.
pub fn classify_and_respond_prompt(config: &TenantConfig, history: &str, message: &str) -> String {
    let allowed = if config.allowed_topics.is_empty() {
        "general questions".to_string()
    } else {
        config.allowed_topics.join(", ")
    };

    format!(
        "You are classifying and responding to a user message for a {vertical} support assistant.\n\
         Topics this assistant can help with: {allowed}.\n\
         \n\
         Chat history:\n{history}\n\
         \n\
         User message: {message}\n\
         \n\
         Respond with exactly two lines:\n\
         INTENT: <conversational|domain_query|out_of_scope>\n\
         RESPONSE: <reply text, or the literal \"needs_retrieval\" when intent is domain_query>\n\
         \n\
         Use conversational for greetings and small talk, domain_query when the user is asking \
         something that requires looking up information, and out_of_scope when the request falls \
         outside {allowed}.",
        vertical = config.vertical,
        allowed = allowed,
        history = history,
        message = message,
    )
}

/// Stage D's grounded-answer prompt: context block in rank order, then
/// chat history, then the live turn.
pub fn grounded_answer_prompt(context_block: &str, history: &str, message: &str) -> String {
    format!("Context:\n{context_block}\n\nChat History:\n{history}User: {message}\nAssistant:")
}

/// `"[<filename> - <section>]\n<text>"` blocks joined by `\n\n---\n\n`.
pub fn render_context_block(chunks: &[(String, Option<String>, String)]) -> String {
    chunks
        .iter()
        .map(|(filename, section, text)| {
            let heading = match section {
                Some(s) => format!("{filename} - {s}"),
                None => filename.clone(),
            };
            format!("[{heading}]\n{text}")
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

pub fn static_greeting(persona_name: &str) -> String {
    format!("Hi there! I'm {persona_name}. How can I help you today?")
}

pub fn static_out_of_scope(allowed_topics: &[String]) -> String {
    let allowed = if allowed_topics.is_empty() {
        "general questions".to_string()
    } else {
        allowed_topics.join(", ")
    };
    format!("That's outside what I can help with. I can assist with: {allowed}")
}

pub const ESCALATION_RESPONSE: &str =
    "I don't have enough information to answer that confidently. Let me connect you with a human agent who can help.";

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TenantConfig {
        TenantConfig {
            persona_name: "Ava".to_string(),
            persona_description: "a friendly billing specialist".to_string(),
            company_name: "Acme".to_string(),
            vertical: "billing".to_string(),
            allowed_topics: vec!["invoices".to_string(), "refunds".to_string()],
            blocked_topics: vec!["legal advice".to_string()],
            ..TenantConfig::default()
        }
    }

    #[test]
    fn system_prompt_includes_all_seven_rules() {
        let prompt = system_prompt(&config(), NaiveDate::from_ymd_opt(2026, 7, 27).unwrap());
        for marker in ["1.", "2.", "3.", "4.", "5.", "6.", "7."] {
            assert!(prompt.contains(marker), "missing rule {marker}");
        }
        assert!(prompt.contains("legal advice"));
    }

    #[test]
    fn static_greeting_uses_persona_name() {
        assert_eq!(static_greeting("Ava"), "Hi there! I'm Ava. How can I help you today?");
    }

    #[test]
    fn context_block_joins_with_separator() {
        let chunks = vec![
            ("doc.pdf".to_string(), Some("Section 1".to_string()), "text a".to_string()),
            ("doc.pdf".to_string(), None, "text b".to_string()),
        ];
        let rendered = render_context_block(&chunks);
        assert_eq!(rendered, "[doc.pdf - Section 1]\ntext a\n\n---\n\n[doc.pdf]\ntext b");
    }
}
