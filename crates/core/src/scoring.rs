//! Scoring is a pure function of the recorded answers.

use std::collections::BTreeMap;

use crate::model::{AnswerRecord, Question};

/// Whether `record` is a correct answer to `question`.
///
/// Timeouts never count as correct.
#[must_use]
pub fn is_correct(question: &Question, record: AnswerRecord) -> bool {
    record
        .selected()
        .is_some_and(|selected| question.is_correct(selected))
}

/// Number of slots answered with the correct option.
///
/// Records pointing past the end of `questions` are ignored.
#[must_use]
pub fn score(questions: &[Question], answers: &BTreeMap<usize, AnswerRecord>) -> u32 {
    let correct = answers
        .iter()
        .filter(|(index, record)| {
            questions
                .get(**index)
                .is_some_and(|question| is_correct(question, **record))
        })
        .count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}
