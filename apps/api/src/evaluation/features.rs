//! Feature extraction for answer evaluation.
//!
//! Each signal is an independently named, independently testable predicate
//! over the raw answer text. The scoring layer combines them through a
//! declarative weighted-rule list (see `evaluation::SCORING_RULES`).

/// Action verbs that indicate a concrete technical contribution.
const TECHNICAL_TERMS: &[&str] = &[
    "implemented",
    "developed",
    "built",
    "created",
    "solved",
    "debugged",
    "optimized",
    "designed",
    "integrated",
    "deployed",
    "tested",
    "refactored",
];

/// Technology vocabulary indicating a named tech stack.
const TECH_STACK_TERMS: &[&str] = &[
    "react",
    "node",
    "mongodb",
    "express",
    "sql",
    "javascript",
    "python",
    "java",
];

/// Phrases indicating the answer references a concrete piece of work.
const PROJECT_TERMS: &[&str] = &["project", "platform", "app"];

/// Signals extracted from one free-text answer. All text matching is
/// case-insensitive substring matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerFeatures {
    pub word_count: usize,
    pub sentence_count: usize,
    pub has_technical_terms: bool,
    pub has_numeric_evidence: bool,
    pub has_project_mention: bool,
    pub has_tech_stack: bool,
}

impl AnswerFeatures {
    pub fn extract(answer: &str) -> Self {
        let lower = answer.to_lowercase();

        Self {
            word_count: answer.split_whitespace().count(),
            sentence_count: count_sentences(answer),
            has_technical_terms: contains_any(&lower, TECHNICAL_TERMS),
            has_numeric_evidence: answer.chars().any(|c| c.is_ascii_digit() || c == '%'),
            has_project_mention: contains_any(&lower, PROJECT_TERMS),
            has_tech_stack: contains_any(&lower, TECH_STACK_TERMS),
        }
    }
}

fn contains_any(lower_text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| lower_text.contains(t))
}

/// Splits on runs of sentence terminators and drops empty fragments.
fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_and_sentence_counts() {
        let f = AnswerFeatures::extract("I did this. It worked! Really?");
        assert_eq!(f.word_count, 6);
        assert_eq!(f.sentence_count, 3);
    }

    #[test]
    fn test_consecutive_terminators_do_not_inflate_sentence_count() {
        let f = AnswerFeatures::extract("Done!!! Next one...");
        assert_eq!(f.sentence_count, 2);
    }

    #[test]
    fn test_technical_terms_are_case_insensitive() {
        assert!(AnswerFeatures::extract("I Deployed the service").has_technical_terms);
        assert!(!AnswerFeatures::extract("I worked on the service").has_technical_terms);
    }

    #[test]
    fn test_numeric_evidence_matches_digits_and_percent() {
        assert!(AnswerFeatures::extract("latency dropped 40ms").has_numeric_evidence);
        assert!(AnswerFeatures::extract("throughput rose by %").has_numeric_evidence);
        assert!(!AnswerFeatures::extract("it got much faster").has_numeric_evidence);
    }

    #[test]
    fn test_project_mention() {
        assert!(AnswerFeatures::extract("on our billing platform").has_project_mention);
        assert!(!AnswerFeatures::extract("at my last job").has_project_mention);
    }

    #[test]
    fn test_tech_stack_vocabulary() {
        assert!(AnswerFeatures::extract("a Python service").has_tech_stack);
        assert!(AnswerFeatures::extract("plain JavaScript").has_tech_stack);
        assert!(!AnswerFeatures::extract("a small service").has_tech_stack);
    }
}
