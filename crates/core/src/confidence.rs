//! Confidence and escalation-gate formulas.
//!
//! Both formulas are canonical and reproduced bit-for-bit; do not round
//! or clamp differently than written here.

/// One reranked result's relevance score, as scored by the
/// cross-encoder (or the dense-score fallback on rerank failure).
pub struct RankedRelevance {
    pub relevance_score: f32,
}

/// `confidence = min(1.0, top*0.85 + (supporting/10)*0.15)`, where `top`
/// is the first result's relevance score and `supporting` is the count
/// of results with `relevance_score > 0.4`. Empty input is confidence 0.
pub fn compute_confidence(results: &[RankedRelevance]) -> f64 {
    let Some(first) = results.first() else {
        return 0.0;
    };
    let top = first.relevance_score as f64;
    let supporting = results.iter().filter(|r| r.relevance_score > 0.4).count() as f64;
    (top * 0.85 + (supporting / 10.0) * 0.15).min(1.0)
}

pub struct EscalationReason;

impl EscalationReason {
    pub const LOW_CONFIDENCE: &'static str = "low_retrieval_confidence";
    pub const MAX_TURNS: &'static str = "max_turns_exceeded";
}

/// `shouldEscalate = (confidence < threshold) OR (turnCount >= maxTurns)`.
/// `low_retrieval_confidence` takes precedence when both hold.
pub fn should_escalate(confidence: f64, turn_count: u32, max_turns: u32, threshold: f64) -> Option<&'static str> {
    if confidence < threshold {
        Some(EscalationReason::LOW_CONFIDENCE)
    } else if turn_count >= max_turns {
        Some(EscalationReason::MAX_TURNS)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_results_is_zero_confidence() {
        assert_eq!(compute_confidence(&[]), 0.0);
    }

    #[test]
    fn matches_worked_example_from_scenario_table() {
        // single result, relevance 0.9 -> 0.9*0.85 + (1/10)*0.15? No: only
        // one result counts as supporting iff > 0.4, which it is.
        let results = vec![RankedRelevance { relevance_score: 0.9 }];
        let c = compute_confidence(&results);
        assert!((c - 0.78).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_clamped_to_one() {
        let results = vec![RankedRelevance { relevance_score: 1.0 }; 20];
        assert_eq!(compute_confidence(&results), 1.0);
    }

    #[test]
    fn low_confidence_takes_precedence_over_max_turns() {
        assert_eq!(should_escalate(0.1, 20, 10, 0.55), Some(EscalationReason::LOW_CONFIDENCE));
    }

    #[test]
    fn max_turns_triggers_when_confidence_is_sufficient() {
        assert_eq!(should_escalate(0.9, 10, 10, 0.55), Some(EscalationReason::MAX_TURNS));
    }

    #[test]
    fn no_escalation_when_neither_condition_holds() {
        assert_eq!(should_escalate(0.9, 0, 10, 0.55), None);
    }

    #[test]
    fn threshold_boundary_is_strict_less_than() {
        assert_eq!(should_escalate(0.55, 0, 10, 0.55), None);
    }
}
