//! Answer evaluation — deterministic rule-based scorer and feedback builder.
//!
//! The scorer is a pure function of the answer text: named feature
//! predicates (see `features`) feed a declarative weighted-rule list, so
//! individual rules can be tuned and tested in isolation. Only the
//! next-question draw is non-deterministic, and that goes through the
//! injectable `QuestionPicker`.

pub mod features;
pub mod questions;

use serde::Serialize;
use tracing::debug;

use crate::evaluation::features::AnswerFeatures;
use crate::evaluation::questions::{QuestionPicker, QUESTION_POOL};

const BASE_SCORE: f64 = 5.0;
const MAX_SCORE: f64 = 10.0;

/// Feedback tier thresholds.
const EXCELLENT_THRESHOLD: f64 = 8.0;
const GOOD_THRESHOLD: f64 = 6.0;

/// One scoring rule: a named predicate over the extracted features and the
/// score contribution it grants when satisfied.
struct ScoringRule {
    name: &'static str,
    weight: f64,
    applies: fn(&AnswerFeatures) -> bool,
}

/// All rules are additive with positive weights, which gives the evaluator
/// its monotonicity property: adding a detectable signal never lowers the
/// score.
const SCORING_RULES: &[ScoringRule] = &[
    ScoringRule {
        name: "substantial_length",
        weight: 1.0,
        applies: |f| f.word_count > 50,
    },
    ScoringRule {
        name: "extended_length",
        weight: 1.0,
        applies: |f| f.word_count > 100,
    },
    ScoringRule {
        name: "multi_sentence",
        weight: 0.5,
        applies: |f| f.sentence_count >= 3,
    },
    ScoringRule {
        name: "technical_terms",
        weight: 1.0,
        applies: |f| f.has_technical_terms,
    },
    ScoringRule {
        name: "numeric_evidence",
        weight: 1.0,
        applies: |f| f.has_numeric_evidence,
    },
    ScoringRule {
        name: "project_mention",
        weight: 0.5,
        applies: |f| f.has_project_mention,
    },
    ScoringRule {
        name: "tech_stack",
        weight: 1.0,
        applies: |f| f.has_tech_stack,
    },
];

/// Result of evaluating one answer.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub score: f64,
    pub feedback: String,
    pub next_question: String,
}

/// Scores a free-text answer and builds tiered feedback. Callers must reject
/// blank input before calling; the evaluator always produces a result.
pub fn evaluate(answer: &str, picker: &dyn QuestionPicker) -> Evaluation {
    let features = AnswerFeatures::extract(answer);
    let score = compute_score(&features);
    let feedback = build_feedback(score, &features);
    let next_question = QUESTION_POOL[picker.pick(QUESTION_POOL.len())].to_string();

    Evaluation {
        score,
        feedback,
        next_question,
    }
}

/// Base score plus the weight of every satisfied rule, capped at 10 and
/// rounded to the nearest 0.1.
fn compute_score(features: &AnswerFeatures) -> f64 {
    let satisfied: Vec<&ScoringRule> = SCORING_RULES
        .iter()
        .filter(|rule| (rule.applies)(features))
        .collect();
    debug!(
        "Satisfied scoring rules: {:?}",
        satisfied.iter().map(|rule| rule.name).collect::<Vec<_>>()
    );

    let raw: f64 = BASE_SCORE + satisfied.iter().map(|rule| rule.weight).sum::<f64>();
    ((raw.min(MAX_SCORE)) * 10.0).round() / 10.0
}

/// Detected strengths and the complementary improvement suggestions, composed
/// into a fixed template per score tier.
fn build_feedback(score: f64, features: &AnswerFeatures) -> String {
    let mut strengths: Vec<&str> = Vec::new();
    let mut improvements: Vec<&str> = Vec::new();

    if features.word_count > 80 {
        strengths.push("detailed explanation");
    } else if features.word_count < 40 {
        improvements.push("provide more details and context");
    }

    if features.has_technical_terms {
        strengths.push("clear technical approach");
    } else {
        improvements.push("include more technical details about your implementation");
    }

    if features.has_numeric_evidence {
        strengths.push("quantifiable results");
    } else {
        improvements.push("add specific metrics or results");
    }

    if features.has_project_mention && features.has_tech_stack {
        strengths.push("relevant project experience");
    } else {
        improvements.push("mention specific projects and technologies used");
    }

    let strengths = strengths.join(", ");
    let improvements = improvements.join(", ");

    if score >= EXCELLENT_THRESHOLD {
        let mut feedback = format!("Excellent response! You've demonstrated {strengths}. ");
        if improvements.is_empty() {
            feedback.push_str(
                "Your answer thoroughly addresses the question with clear examples and impact.",
            );
        } else {
            feedback.push_str(&format!(
                "To make it even stronger, consider: {improvements}."
            ));
        }
        feedback
    } else if score >= GOOD_THRESHOLD {
        format!("Good answer. You've shown {strengths}. To improve further: {improvements}.")
    } else {
        format!(
            "Your response needs more depth. Please {improvements}. \
             Provide concrete examples from your experience with specific outcomes."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::questions::RotationPicker;

    fn score_of(answer: &str) -> f64 {
        compute_score(&AnswerFeatures::extract(answer))
    }

    #[test]
    fn test_scoring_rule_names_are_unique() {
        let mut names: Vec<&str> = SCORING_RULES.iter().map(|rule| rule.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCORING_RULES.len());
    }

    #[test]
    fn test_minimal_answer_scores_base() {
        assert_eq!(score_of("yes"), 5.0);
    }

    #[test]
    fn test_strong_answer_reaches_excellent_tier() {
        let answer = "I built a React app that improved performance by 20% for 100000 users, \
                      tested and deployed with Docker, debugging issues across sprints.";
        let picker = RotationPicker::default();
        let eval = evaluate(answer, &picker);

        assert!(eval.score >= 8.0, "expected >= 8.0, got {}", eval.score);
        assert!(
            eval.feedback.starts_with("Excellent response!"),
            "unexpected feedback: {}",
            eval.feedback
        );
        assert_eq!(eval.next_question, QUESTION_POOL[0]);
    }

    #[test]
    fn test_adding_signals_never_decreases_score() {
        let base = "I worked on improving the service for a while";
        let with_term = "I optimized and improved the service for a while";
        let with_number = "I worked on improving the service by 30% recently";
        let with_stack = "I worked on improving the Python service recently too";

        assert!(score_of(with_term) >= score_of(base));
        assert!(score_of(with_number) >= score_of(base));
        assert!(score_of(with_stack) >= score_of(base));
    }

    #[test]
    fn test_score_is_capped_at_ten() {
        let long = "I implemented and deployed a React platform project. \
                    I optimized Python and SQL paths by 45%. "
            .repeat(10);
        assert_eq!(score_of(&long), 10.0);
    }

    #[test]
    fn test_score_rounds_to_one_decimal() {
        // Base + multi_sentence only: 5.5 exactly.
        let answer = "One. Two. Three.";
        assert_eq!(score_of(answer), 5.5);
    }

    #[test]
    fn test_good_tier_template() {
        // Three sentences plus tech terms and stack: 5 + 0.5 + 1 + 1 = 7.5.
        let answer = "I designed the flow. I used Python heavily. It shipped on time.";
        let picker = RotationPicker::default();
        let eval = evaluate(answer, &picker);
        assert_eq!(eval.score, 7.5);
        assert!(eval.feedback.starts_with("Good answer."));
    }

    #[test]
    fn test_needs_depth_tier_lists_improvements() {
        let picker = RotationPicker::default();
        let eval = evaluate("it went fine", &picker);
        assert!(eval.score < 6.0);
        assert!(eval.feedback.starts_with("Your response needs more depth."));
        assert!(eval.feedback.contains("provide more details and context"));
    }

    #[test]
    fn test_rotation_picker_drives_next_question_sequence() {
        let picker = RotationPicker::default();
        let first = evaluate("fine", &picker).next_question;
        let second = evaluate("fine", &picker).next_question;
        assert_eq!(first, QUESTION_POOL[0]);
        assert_eq!(second, QUESTION_POOL[1]);
    }
}
