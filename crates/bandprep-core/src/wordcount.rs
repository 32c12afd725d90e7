//! Word counting and the minimum-length check.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::task::TaskKind;

/// Number of whitespace-separated words in `text`.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A response shorter than its task's minimum. Not fatal: the user may
/// submit anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub words: usize,
    pub minimum: usize,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Your response has only {} words (minimum {})",
            self.words, self.minimum
        )
    }
}

pub fn check_minimum(kind: TaskKind, text: &str) -> Option<ValidationWarning> {
    let words = count_words(text);
    let minimum = kind.min_words();
    (words < minimum).then_some(ValidationWarning { words, minimum })
}
