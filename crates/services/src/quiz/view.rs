//! Presentation-agnostic projections of a quiz session.
//!
//! None of these carry pre-formatted or localized strings apart from the
//! `NO_ANSWER` sentinel; the view decides how to render them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use quiz_core::model::{AnswerRecord, AttemptId, Question, SubjectKey};

/// Shown in reports for questions without a chosen option.
pub const NO_ANSWER: &str = "No Answer";

/// Feedback state of one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionStatus {
    Neutral,
    SelectedCorrect,
    SelectedWrong,
    /// The right answer, shown after a wrong choice or a timeout.
    CorrectNotSelected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub text: String,
    pub status: OptionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<OptionView>,
    pub answer: Option<AnswerRecord>,
    pub locked: bool,
    pub is_first: bool,
    pub is_last: bool,
}

impl QuestionView {
    pub(crate) fn build(
        index: usize,
        total: usize,
        question: &Question,
        answer: Option<AnswerRecord>,
    ) -> Self {
        let options = question
            .options()
            .iter()
            .enumerate()
            .map(|(option, text)| OptionView {
                text: text.clone(),
                status: option_status(question, answer, option),
            })
            .collect();

        Self {
            index,
            total,
            text: question.text().to_owned(),
            options,
            answer,
            locked: answer.is_some(),
            is_first: index == 0,
            is_last: index + 1 == total,
        }
    }
}

fn option_status(question: &Question, answer: Option<AnswerRecord>, option: usize) -> OptionStatus {
    let correct = question.is_correct(option);
    match answer {
        None => OptionStatus::Neutral,
        Some(AnswerRecord::Answered { selected }) if selected == option => {
            if correct {
                OptionStatus::SelectedCorrect
            } else {
                OptionStatus::SelectedWrong
            }
        }
        Some(AnswerRecord::Answered { selected }) => {
            if correct && !question.is_correct(selected) {
                OptionStatus::CorrectNotSelected
            } else {
                OptionStatus::Neutral
            }
        }
        Some(AnswerRecord::TimedOut) => {
            if correct {
                OptionStatus::CorrectNotSelected
            } else {
                OptionStatus::Neutral
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub score: u32,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOutcome {
    Correct,
    Wrong,
    TimedOut,
    Unanswered,
}

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub position: usize,
    pub question: String,
    /// Chosen option text, or `NO_ANSWER`.
    pub chosen: String,
    pub correct_answer: String,
    pub outcome: EntryOutcome,
}

impl ReportEntry {
    pub(crate) fn build(position: usize, question: &Question, answer: Option<AnswerRecord>) -> Self {
        let chosen = answer
            .and_then(|record| record.selected())
            .and_then(|selected| question.option(selected))
            .unwrap_or(NO_ANSWER)
            .to_owned();
        let outcome = match answer {
            None => EntryOutcome::Unanswered,
            Some(AnswerRecord::TimedOut) => EntryOutcome::TimedOut,
            Some(AnswerRecord::Answered { selected }) if question.is_correct(selected) => {
                EntryOutcome::Correct
            }
            Some(AnswerRecord::Answered { .. }) => EntryOutcome::Wrong,
        };

        Self {
            position,
            question: question.text().to_owned(),
            chosen,
            correct_answer: question.correct_option().to_owned(),
            outcome,
        }
    }
}

/// Immutable breakdown of a submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizReport {
    pub attempt_id: AttemptId,
    pub subject: SubjectKey,
    pub score: u32,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question::new("2+2?", vec!["3".into(), "4".into(), "5".into()], 1).unwrap()
    }

    fn statuses(view: &QuestionView) -> Vec<OptionStatus> {
        view.options.iter().map(|o| o.status).collect()
    }

    #[test]
    fn unanswered_question_is_all_neutral() {
        let view = QuestionView::build(0, 2, &question(), None);
        assert!(!view.locked);
        assert!(view.is_first);
        assert!(!view.is_last);
        assert!(statuses(&view).iter().all(|s| *s == OptionStatus::Neutral));
    }

    #[test]
    fn correct_choice_marks_only_the_choice() {
        let view = QuestionView::build(1, 2, &question(), Some(AnswerRecord::Answered { selected: 1 }));
        assert_eq!(
            statuses(&view),
            vec![
                OptionStatus::Neutral,
                OptionStatus::SelectedCorrect,
                OptionStatus::Neutral
            ]
        );
        assert!(view.is_last);
    }

    #[test]
    fn wrong_choice_also_reveals_correct_option() {
        let view = QuestionView::build(0, 1, &question(), Some(AnswerRecord::Answered { selected: 2 }));
        assert_eq!(
            statuses(&view),
            vec![
                OptionStatus::Neutral,
                OptionStatus::CorrectNotSelected,
                OptionStatus::SelectedWrong
            ]
        );
    }

    #[test]
    fn timeout_reveals_correct_option() {
        let view = QuestionView::build(0, 1, &question(), Some(AnswerRecord::TimedOut));
        assert_eq!(
            statuses(&view),
            vec![
                OptionStatus::Neutral,
                OptionStatus::CorrectNotSelected,
                OptionStatus::Neutral
            ]
        );
        assert!(view.locked);
    }

    #[test]
    fn report_entry_uses_sentinel_without_choice() {
        let timed_out = ReportEntry::build(0, &question(), Some(AnswerRecord::TimedOut));
        assert_eq!(timed_out.chosen, NO_ANSWER);
        assert_eq!(timed_out.correct_answer, "4");
        assert_eq!(timed_out.outcome, EntryOutcome::TimedOut);

        let skipped = ReportEntry::build(0, &question(), None);
        assert_eq!(skipped.chosen, NO_ANSWER);
        assert_eq!(skipped.outcome, EntryOutcome::Unanswered);

        let wrong = ReportEntry::build(0, &question(), Some(AnswerRecord::Answered { selected: 0 }));
        assert_eq!(wrong.chosen, "3");
        assert_eq!(wrong.outcome, EntryOutcome::Wrong);
    }
}
