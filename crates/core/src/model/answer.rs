use serde::{Deserialize, Serialize};

/// What was recorded for a question slot once it was locked.
///
/// Slots without a record are unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerRecord {
    Answered { selected: usize },
    TimedOut,
}

impl AnswerRecord {
    /// Index of the chosen option, if one was chosen.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        match self {
            AnswerRecord::Answered { selected } => Some(*selected),
            AnswerRecord::TimedOut => None,
        }
    }

    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, AnswerRecord::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_has_no_selection() {
        assert_eq!(AnswerRecord::TimedOut.selected(), None);
        assert!(AnswerRecord::TimedOut.is_timed_out());
        assert_eq!(AnswerRecord::Answered { selected: 2 }.selected(), Some(2));
    }
}
