//! Document-format parsing is deliberately out of scope:
//! treated as an opaque collaborator that turns a file into typed
//! structural elements. This trait is the seam; no concrete PDF/DOCX/
//! HTML extraction library ships in this crate.

use async_trait::async_trait;

use support_agent_core::chunker::ParsedElement;
use support_agent_core::domain::{ElementType, FileType};
use support_agent_core::{Error, Result};

#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, filepath: &str, file_type: FileType) -> Result<Vec<ParsedElement>>;
}

/// The only parser this crate ships a body for: plain text and CSV,
/// split into one `NarrativeText` element per blank-line-delimited
/// paragraph. PDF/DOCX/HTML need a real extraction library and are
/// rejected with `InvalidFileType` rather than guessed at.
pub struct PlainTextParser;

#[async_trait]
impl DocumentParser for PlainTextParser {
    async fn parse(&self, filepath: &str, file_type: FileType) -> Result<Vec<ParsedElement>> {
        match file_type {
            FileType::Txt | FileType::Csv => {
                let contents = tokio::fs::read_to_string(filepath)
                    .await
                    .map_err(|err| Error::IngestionFailed(format!("failed to read {filepath}: {err}")))?;
                let elements = contents
                    .split("\n\n")
                    .map(str::trim)
                    .filter(|block| !block.is_empty())
                    .map(|block| ParsedElement::new(block, ElementType::NarrativeText))
                    .collect();
                Ok(elements)
            }
            FileType::Pdf | FileType::Docx | FileType::Html => {
                Err(Error::InvalidFileType(format!("{file_type:?} requires a format-specific parser, none is configured")))
            }
        }
    }
}
