//! `LanguageMiddleware`: a pass-through seam invoked immediately before
//! and after `handle_turn`, so a future concern (redaction, translation,
//! profanity filtering) can be swapped in without touching the turn
//! state machine. Default implementation is a no-op.

#[async_trait::async_trait]
pub trait LanguageMiddleware: Send + Sync {
    async fn before_turn(&self, _message: &str) -> String {
        _message.to_string()
    }

    async fn after_turn(&self, _response: &str) -> String {
        _response.to_string()
    }
}

pub struct NoopMiddleware;

#[async_trait::async_trait]
impl LanguageMiddleware for NoopMiddleware {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_middleware_passes_text_through_unchanged() {
        let middleware = NoopMiddleware;
        assert_eq!(middleware.before_turn("hello").await, "hello");
        assert_eq!(middleware.after_turn("world").await, "world");
    }
}
