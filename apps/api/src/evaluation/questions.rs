//! Follow-up question pool and the pluggable picker that selects from it.
//!
//! Question choice is deliberately independent of score and history; true
//! context-sensitive follow-ups are out of scope. The picker is a trait so
//! production can use a uniform random draw while tests pin the sequence
//! with a deterministic rotation.

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Behavioral follow-up questions asked after each evaluated answer.
pub const QUESTION_POOL: &[&str] = &[
    "Can you describe a situation where you had to learn a new technology quickly? How did you approach it?",
    "Tell me about a time when you had to debug a complex issue. What was your process?",
    "How do you stay updated with the latest trends and technologies in software development?",
    "Describe a project where you had to work with a difficult team member. How did you handle it?",
    "Whats your approach to code review and ensuring code quality?",
    "Can you explain a technical decision you made that had significant impact on a project?",
    "How do you prioritize tasks when you have multiple urgent deadlines?",
    "Tell me about a time when you had to optimize performance in an application.",
];

/// Picks the index of the next follow-up question. Implement this to swap
/// selection strategies without touching the evaluator or its callers.
///
/// Carried in `AppState` as `Arc<dyn QuestionPicker>`.
pub trait QuestionPicker: Send + Sync {
    fn pick(&self, pool_len: usize) -> usize;
}

/// Uniform random draw over the pool.
pub struct UniformPicker;

impl QuestionPicker for UniformPicker {
    fn pick(&self, pool_len: usize) -> usize {
        rand::rng().random_range(0..pool_len)
    }
}

/// Deterministic round-robin over the pool. Used in tests to make evaluator
/// output exactly assertable.
#[derive(Default)]
pub struct RotationPicker {
    next: AtomicUsize,
}

impl QuestionPicker for RotationPicker {
    fn pick(&self, pool_len: usize) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed) % pool_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_has_eight_questions() {
        assert_eq!(QUESTION_POOL.len(), 8);
    }

    #[test]
    fn test_uniform_picker_stays_in_bounds() {
        let picker = UniformPicker;
        for _ in 0..100 {
            assert!(picker.pick(QUESTION_POOL.len()) < QUESTION_POOL.len());
        }
    }

    #[test]
    fn test_rotation_picker_cycles_in_order() {
        let picker = RotationPicker::default();
        let picks: Vec<usize> = (0..10).map(|_| picker.pick(4)).collect();
        assert_eq!(picks, vec![0, 1, 2, 3, 0, 1, 2, 3, 0, 1]);
    }
}
