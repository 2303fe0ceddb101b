//! Lenient parsing of the combined classify-and-respond output: the
//! two-line `INTENT:`/`RESPONSE:` contract is a sum type, parsed once
//! and dispatched on the variant.
//!
//! Intent labels match case-insensitively, prefixes of length >= 4 are
//! accepted (models often truncate), and surrounding punctuation is
//! stripped before matching.

pub(crate) const TRIM_CHARS: &[char] = &['`', '"', '\'', '.', ',', ':', ';', '!', '?', '(', ')', '[', ']', '{', '}'];
const MIN_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyRespond {
    Conversational(String),
    DomainQuery,
    OutOfScope(String),
}

/// On unparseable output, callers default to `Conversational` with an
/// empty response and let the branch supply a static fallback.
pub fn parse_combined_response(raw: &str) -> ClassifyRespond {
    let mut intent_label = None;
    let mut response_body = None;

    for line in raw.lines() {
        let trimmed = line.trim();
        if intent_label.is_none() {
            if let Some(rest) = strip_label(trimmed, "INTENT:") {
                intent_label = Some(clean_label(rest));
                continue;
            }
        }
        if response_body.is_none() {
            if let Some(rest) = strip_label(trimmed, "RESPONSE:") {
                response_body = Some(rest.trim().to_string());
                continue;
            }
        }
    }

    let Some(label) = intent_label else {
        return ClassifyRespond::Conversational(String::new());
    };
    let body = response_body.unwrap_or_default();

    if matches_label(&label, "conversational") {
        ClassifyRespond::Conversational(body)
    } else if matches_label(&label, "domain_query") {
        ClassifyRespond::DomainQuery
    } else if matches_label(&label, "out_of_scope") {
        ClassifyRespond::OutOfScope(body)
    } else {
        ClassifyRespond::Conversational(String::new())
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    if line.len() >= label.len() && line[..label.len()].eq_ignore_ascii_case(label) {
        Some(&line[label.len()..])
    } else {
        None
    }
}

fn clean_label(raw: &str) -> String {
    raw.trim().trim_matches(TRIM_CHARS).to_lowercase()
}

/// Case-insensitive, with prefix acceptance once both strings are at
/// least `MIN_PREFIX_LEN` long.
fn matches_label(candidate: &str, canonical: &str) -> bool {
    if candidate == canonical {
        return true;
    }
    if candidate.len() >= MIN_PREFIX_LEN && canonical.starts_with(candidate) {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_domain_query() {
        let raw = "INTENT: domain_query\nRESPONSE: needs_retrieval";
        assert_eq!(parse_combined_response(raw), ClassifyRespond::DomainQuery);
    }

    #[test]
    fn accepts_truncated_intent_label() {
        let raw = "INTENT: conv\nRESPONSE: hi there";
        assert_eq!(parse_combined_response(raw), ClassifyRespond::Conversational("hi there".to_string()));
    }

    #[test]
    fn strips_surrounding_punctuation_from_label() {
        let raw = "INTENT: \"out_of_scope\".\nRESPONSE: can't help with that";
        assert_eq!(
            parse_combined_response(raw),
            ClassifyRespond::OutOfScope("can't help with that".to_string())
        );
    }

    #[test]
    fn unparseable_output_defaults_to_empty_conversational() {
        let raw = "I'm not sure what to say";
        assert_eq!(parse_combined_response(raw), ClassifyRespond::Conversational(String::new()));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let raw = "intent: CONVERSATIONAL\nresponse: hello";
        assert_eq!(parse_combined_response(raw), ClassifyRespond::Conversational("hello".to_string()));
    }

    #[test]
    fn too_short_a_prefix_does_not_match() {
        assert!(!matches_label("con", "conversational"));
    }
}
