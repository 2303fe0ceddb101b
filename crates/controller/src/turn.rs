//! `handle_turn`: the single entrypoint tying the combined
//! classify-and-respond call, the three-branch dispatch, retrieval,
//! escalation, metering, memory, and message persistence into one turn.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use support_agent_core::domain::{IntentType, Message, Role, SourceChunkRef, TenantConfig};
use support_agent_core::ports::{ChatMessage, GenerateRequest, LanguageModel, RelationalStore};
use support_agent_core::Result;

use support_agent_escalation::EscalationService;
use support_agent_lifecycle::MeteringService;
use support_agent_retrieval::{HybridRetriever, RetrievalOptions};

use crate::memory::ConversationMemory;
use crate::middleware::{LanguageMiddleware, NoopMiddleware};
use crate::parsing::{parse_combined_response, ClassifyRespond};
use crate::prompts;

/// The public contract: `HandleTurn(sessionId, tenantId, message,
/// tenantConfig) -> TurnOutput`.
pub struct TurnOutput {
    pub message_id: Uuid,
    pub response: String,
    pub intent_type: IntentType,
    pub confidence: Option<f64>,
    pub source_chunks: Option<Vec<SourceChunkRef>>,
    pub escalation_required: bool,
    pub escalation_reason: Option<String>,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub latency_ms: i64,
}

pub struct AgentTurnController {
    language_model: Arc<dyn LanguageModel>,
    relational_store: Arc<dyn RelationalStore>,
    retriever: Arc<HybridRetriever>,
    memory: ConversationMemory,
    metering: Arc<MeteringService>,
    escalation: Arc<EscalationService>,
    middleware: Arc<dyn LanguageMiddleware>,
}

impl AgentTurnController {
    pub fn new(
        language_model: Arc<dyn LanguageModel>,
        relational_store: Arc<dyn RelationalStore>,
        retriever: Arc<HybridRetriever>,
        memory: ConversationMemory,
        metering: Arc<MeteringService>,
        escalation: Arc<EscalationService>,
    ) -> Self {
        Self {
            language_model,
            relational_store,
            retriever,
            memory,
            metering,
            escalation,
            middleware: Arc::new(NoopMiddleware),
        }
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn LanguageMiddleware>) -> Self {
        self.middleware = middleware;
        self
    }

    pub async fn handle_turn(
        &self,
        session_id: Uuid,
        tenant_id: Uuid,
        message: &str,
        tenant_config: &TenantConfig,
    ) -> Result<TurnOutput> {
        let started = Instant::now();
        let now = Utc::now();

        let message_text = self.middleware.before_turn(message).await;

        let entries = self.memory.load(session_id).await?;
        let history = ConversationMemory::render(&entries);
        let turn_count = self.relational_store.count_user_messages(session_id).await?;

        let user_message = Message::new(session_id, tenant_id, Role::User, message_text.clone(), now);
        self.relational_store.insert_message(user_message).await?;

        let system = prompts::system_prompt(tenant_config, now.date_naive());
        let combined_prompt = prompts::classify_and_respond_prompt(tenant_config, &history, &message_text);
        let request = GenerateRequest::new(vec![ChatMessage::system(system.clone()), ChatMessage::user(combined_prompt)]);

        let (classify_respond, classify_input_tokens, classify_output_tokens) = match self.language_model.generate(request).await {
            Ok(response) => {
                let parsed = parse_combined_response(&response.text);
                (parsed, response.input_tokens as i64, response.output_tokens as i64)
            }
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "combined classify-and-respond call failed, defaulting to conversational");
                (ClassifyRespond::Conversational(String::new()), 0, 0)
            }
        };

        let mut outcome = match classify_respond {
            ClassifyRespond::Conversational(text) => {
                let response = if text.is_empty() { prompts::static_greeting(&tenant_config.persona_name) } else { text };
                self.finish_simple_turn(
                    session_id,
                    tenant_id,
                    IntentType::Conversational,
                    &message_text,
                    response,
                    classify_input_tokens,
                    classify_output_tokens,
                    now,
                )
                .await?
            }
            ClassifyRespond::OutOfScope(text) => {
                let response = if text.is_empty() {
                    prompts::static_out_of_scope(&tenant_config.allowed_topics)
                } else {
                    text
                };
                self.finish_simple_turn(
                    session_id,
                    tenant_id,
                    IntentType::OutOfScope,
                    &message_text,
                    response,
                    classify_input_tokens,
                    classify_output_tokens,
                    now,
                )
                .await?
            }
            ClassifyRespond::DomainQuery => {
                self.handle_domain_query(
                    session_id,
                    tenant_id,
                    &message_text,
                    tenant_config,
                    &history,
                    turn_count,
                    classify_input_tokens,
                    classify_output_tokens,
                    now,
                )
                .await?
            }
        };

        outcome.latency_ms = started.elapsed().as_millis() as i64;
        Ok(outcome)
    }

    /// CONVERSATIONAL and OUT_OF_SCOPE share the same tail: middleware,
    /// persist, append memory, meter.
    #[allow(clippy::too_many_arguments)]
    async fn finish_simple_turn(
        &self,
        session_id: Uuid,
        tenant_id: Uuid,
        intent: IntentType,
        user_message_text: &str,
        response: String,
        input_tokens: i64,
        output_tokens: i64,
        now: chrono::DateTime<Utc>,
    ) -> Result<TurnOutput> {
        let response = self.middleware.after_turn(&response).await;

        let mut assistant_message = Message::new(session_id, tenant_id, Role::Assistant, response.clone(), now);
        assistant_message.intent_type = Some(intent);
        assistant_message.input_tokens = input_tokens;
        assistant_message.output_tokens = output_tokens;
        let assistant_message = self.relational_store.insert_message(assistant_message).await?;

        self.memory.append_turn(session_id, user_message_text, &response).await?;
        self.metering.record_message(session_id, input_tokens, output_tokens).await?;

        Ok(TurnOutput {
            message_id: assistant_message.id,
            response,
            intent_type: intent,
            confidence: None,
            source_chunks: None,
            escalation_required: false,
            escalation_reason: None,
            input_tokens,
            output_tokens,
            latency_ms: 0,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_domain_query(
        &self,
        session_id: Uuid,
        tenant_id: Uuid,
        message_text: &str,
        tenant_config: &TenantConfig,
        history: &str,
        turn_count: u32,
        classify_input_tokens: i64,
        classify_output_tokens: i64,
        now: chrono::DateTime<Utc>,
    ) -> Result<TurnOutput> {
        let options = RetrievalOptions {
            escalation_threshold: tenant_config.escalation_threshold,
            max_turns: tenant_config.max_turns_before_escalation,
            turn_count,
        };
        let retrieval = self.retriever.retrieve(message_text, tenant_id, options).await;

        if retrieval.results.is_empty() {
            // An empty knowledge base is not grounds for escalation:
            // silently fall back to a conversational generation.
            let (fallback_response, extra_in, extra_out) =
                self.generate_conversational_fallback(tenant_config, history, message_text, now).await;
            return self
                .finish_simple_turn(
                    session_id,
                    tenant_id,
                    IntentType::Conversational,
                    message_text,
                    fallback_response,
                    classify_input_tokens + extra_in,
                    classify_output_tokens + extra_out,
                    now,
                )
                .await;
        }

        let source_chunks: Vec<SourceChunkRef> = retrieval
            .results
            .iter()
            .map(|r| SourceChunkRef {
                chunk_id: r.chunk_id,
                document: r.payload.filename.clone(),
                section: r.payload.section_heading.clone(),
            })
            .collect();

        if retrieval.should_escalate {
            return self
                .finish_escalated_turn(
                    session_id,
                    tenant_id,
                    message_text,
                    tenant_config,
                    retrieval.confidence,
                    retrieval.escalation_reason.unwrap_or(support_agent_core::confidence::EscalationReason::LOW_CONFIDENCE),
                    source_chunks,
                    classify_input_tokens,
                    classify_output_tokens,
                    now,
                )
                .await;
        }

        let context_blocks: Vec<(String, Option<String>, String)> = retrieval
            .results
            .iter()
            .map(|r| (r.payload.filename.clone(), r.payload.section_heading.clone(), r.text.clone()))
            .collect();
        let context_block = prompts::render_context_block(&context_blocks);
        let system = prompts::system_prompt(tenant_config, now.date_naive());
        let user_prompt = prompts::grounded_answer_prompt(&context_block, history, message_text);
        let request = GenerateRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user_prompt)])
            .with_temperature(0.3)
            .with_max_tokens(1000);

        // The grounded answer is mandatory: an LLM failure here has no
        // static fallback and surfaces as an error to the caller.
        let response = self.language_model.generate(request).await?;
        let final_response = self.middleware.after_turn(&response.text).await;

        let input_tokens = classify_input_tokens + response.input_tokens as i64;
        let output_tokens = classify_output_tokens + response.output_tokens as i64;

        let mut assistant_message = Message::new(session_id, tenant_id, Role::Assistant, final_response.clone(), now);
        assistant_message.intent_type = Some(IntentType::DomainQuery);
        assistant_message.source_chunks = Some(source_chunks.clone());
        assistant_message.confidence_score = Some(retrieval.confidence);
        assistant_message.input_tokens = input_tokens;
        assistant_message.output_tokens = output_tokens;
        let assistant_message = self.relational_store.insert_message(assistant_message).await?;

        self.memory.append_turn(session_id, message_text, &final_response).await?;
        self.metering.record_message(session_id, input_tokens, output_tokens).await?;

        Ok(TurnOutput {
            message_id: assistant_message.id,
            response: final_response,
            intent_type: IntentType::DomainQuery,
            confidence: Some(retrieval.confidence),
            source_chunks: Some(source_chunks),
            escalation_required: false,
            escalation_reason: None,
            input_tokens,
            output_tokens,
            latency_ms: 0,
        })
    }

    /// Canned response, no grounded-answer call. Persists the message,
    /// meters this turn's tokens, then hands off to `EscalationService`
    /// (which owns the session-status update, closing the billing
    /// counters, webhook dispatch, and memory clearing).
    #[allow(clippy::too_many_arguments)]
    async fn finish_escalated_turn(
        &self,
        session_id: Uuid,
        tenant_id: Uuid,
        message_text: &str,
        tenant_config: &TenantConfig,
        confidence: f64,
        reason: &'static str,
        source_chunks: Vec<SourceChunkRef>,
        input_tokens: i64,
        output_tokens: i64,
        now: chrono::DateTime<Utc>,
    ) -> Result<TurnOutput> {
        let response = self.middleware.after_turn(prompts::ESCALATION_RESPONSE).await;

        let mut assistant_message = Message::new(session_id, tenant_id, Role::Assistant, response.clone(), now);
        assistant_message.intent_type = Some(IntentType::DomainQuery);
        assistant_message.source_chunks = Some(source_chunks.clone());
        assistant_message.confidence_score = Some(confidence);
        assistant_message.escalation_flag = true;
        assistant_message.input_tokens = input_tokens;
        assistant_message.output_tokens = output_tokens;
        let assistant_message = self.relational_store.insert_message(assistant_message).await?;

        // Record this turn's tokens before `escalate()` flushes and clears
        // the counters, so the closing billing event includes it.
        self.metering.record_message(session_id, input_tokens, output_tokens).await?;

        self.escalation
            .escalate(
                session_id,
                tenant_id,
                reason,
                message_text,
                tenant_config.escalation_webhook_url.clone(),
                tenant_config.external_user_id.clone(),
            )
            .await?;

        Ok(TurnOutput {
            message_id: assistant_message.id,
            response,
            intent_type: IntentType::DomainQuery,
            confidence: Some(confidence),
            source_chunks: Some(source_chunks),
            escalation_required: true,
            escalation_reason: Some(reason.to_string()),
            input_tokens,
            output_tokens,
            latency_ms: 0,
        })
    }

    /// Used only when retrieval finds nothing to fuse (empty knowledge
    /// base): a plain conversational completion, with the static
    /// greeting as a last resort if even that call fails.
    async fn generate_conversational_fallback(
        &self,
        tenant_config: &TenantConfig,
        history: &str,
        message_text: &str,
        now: chrono::DateTime<Utc>,
    ) -> (String, i64, i64) {
        let system = prompts::system_prompt(tenant_config, now.date_naive());
        let user_prompt = format!("Chat History:\n{history}\nUser: {message_text}\nAssistant:");
        let request = GenerateRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user_prompt)]);

        match self.language_model.generate(request).await {
            Ok(response) => (response.text, response.input_tokens as i64, response.output_tokens as i64),
            Err(err) => {
                tracing::warn!(error = %err, "conversational fallback generation failed, using static greeting");
                (prompts::static_greeting(&tenant_config.persona_name), 0, 0)
            }
        }
    }
}
