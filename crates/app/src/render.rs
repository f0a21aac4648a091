//! Plain-text rendering of session projections.

use std::io::{self, Write};

use services::{EntryOutcome, OptionStatus, QuestionView, QuizReport};

fn marker(status: OptionStatus) -> &'static str {
    match status {
        OptionStatus::Neutral => "   ",
        OptionStatus::SelectedCorrect => "[+]",
        OptionStatus::SelectedWrong => "[x]",
        OptionStatus::CorrectNotSelected => "[>]",
    }
}

pub fn question(view: &QuestionView, remaining: Option<u32>) {
    println!();
    println!("Question {} of {}", view.index + 1, view.total);
    println!("{}", view.text);
    for (number, option) in view.options.iter().enumerate() {
        println!("  {} {}. {}", marker(option.status), number + 1, option.text);
    }

    if view.locked {
        if view.answer.is_some_and(|answer| answer.is_timed_out()) {
            println!("Time ran out on this question.");
        }
    } else if let Some(secs) = remaining {
        println!("{secs}s to answer.");
    }

    let mut moves = Vec::new();
    if !view.locked {
        moves.push(format!("1-{} answer", view.options.len()));
    }
    if !view.is_first {
        moves.push("p previous".to_owned());
    }
    if !view.is_last {
        moves.push("n next".to_owned());
    }
    moves.push("s submit".to_owned());
    moves.push("q quit".to_owned());
    println!("({})", moves.join(", "));
}

pub fn tick(remaining: u32) {
    if let Err(err) = draw_tick(&mut io::stdout().lock(), remaining) {
        tracing::debug!(%err, remaining, "countdown redraw failed");
    }
}

/// Overwrite the countdown in place on the current line.
fn draw_tick(out: &mut impl Write, remaining: u32) -> io::Result<()> {
    write!(out, "\r{remaining:>3}s left ").and_then(|()| out.flush())
}

pub fn timed_out(view: &QuestionView) {
    let correct = view
        .options
        .iter()
        .find(|option| option.status == OptionStatus::CorrectNotSelected)
        .map_or("?", |option| option.text.as_str());
    println!();
    println!("Time's up! The correct answer was: {correct}");
}

pub fn report(report: &QuizReport) {
    println!();
    println!(
        "{} quiz finished: {} / {}",
        report.subject.display_name(),
        report.score,
        report.total
    );
    for entry in &report.entries {
        let verdict = match entry.outcome {
            EntryOutcome::Correct => "correct",
            EntryOutcome::Wrong => "wrong",
            EntryOutcome::TimedOut => "timed out",
            EntryOutcome::Unanswered => "unanswered",
        };
        println!("{}. {}", entry.position + 1, entry.question);
        println!("   your answer:    {} ({verdict})", entry.chosen);
        println!("   correct answer: {}", entry.correct_answer);
    }
    println!();
    println!("Play again? (y to restart, q to quit)");
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tick_redraws_the_same_line() {
        let mut out = Vec::new();
        draw_tick(&mut out, 7).unwrap();
        draw_tick(&mut out, 12).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\r  7s left \r 12s left ");
    }

    #[test]
    fn tick_reports_write_failures() {
        let err = draw_tick(&mut BrokenPipe, 3).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
