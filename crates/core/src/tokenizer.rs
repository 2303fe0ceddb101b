//! Tokenizer identity is part of the external contract: this
//! wraps `cl100k_base` exactly, never a substitute encoding, since
//! changing tokenizers silently shifts chunk boundaries and cache hit
//! rates.

use std::sync::Arc;

use tiktoken_rs::{cl100k_base, CoreBPE};

/// A cheaply cloneable handle around the `cl100k_base` encoder.
#[derive(Clone)]
pub struct Tokenizer {
    bpe: Arc<CoreBPE>,
}

impl Tokenizer {
    pub fn new() -> Self {
        // cl100k_base() only fails if the bundled vocabulary can't be
        // parsed, which would be a build-time defect, not a runtime one.
        let bpe = cl100k_base().expect("cl100k_base vocabulary must load");
        Self { bpe: Arc::new(bpe) }
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    pub fn decode(&self, tokens: &[u32]) -> String {
        self.bpe.decode(tokens.to_vec()).unwrap_or_default()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_matches_encode_len() {
        let tok = Tokenizer::new();
        let text = "the quick brown fox jumps over the lazy dog";
        assert_eq!(tok.count(text), tok.encode(text).len());
    }

    #[test]
    fn empty_string_is_zero_tokens() {
        let tok = Tokenizer::new();
        assert_eq!(tok.count(""), 0);
    }
}
