use std::fmt;
use std::path::PathBuf;

use quiz_core::model::SubjectKey;
use services::{
    BankService, Clock, InvalidOperation, QuizDriver, QuizError, QuizLoopService, QuizPhase,
    QuizReport, TimerOutcome, TokioCountdown,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSubject { raw: String },
    InvalidTimeLimit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSubject { raw } => write!(f, "invalid --subject value: {raw}"),
            ArgsError::InvalidTimeLimit { raw } => write!(f, "invalid --time-limit value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [play] [--db <sqlite_url>] [--subject <key>] [--time-limit <secs>]");
    eprintln!("                             [--report-json <path>]");
    eprintln!("  cargo run -p app -- subjects [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- import --subject <key> --file <csv> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_SUBJECT, QUIZ_TIME_LIMIT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Subjects,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "subjects" => Some(Self::Subjects),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    subject: Option<SubjectKey>,
    question_time_secs: Option<u32>,
    file: Option<PathBuf>,
    report_json: Option<PathBuf>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut subject = std::env::var("QUIZ_SUBJECT")
            .ok()
            .and_then(|raw| SubjectKey::from_display_name(&raw).ok());
        let mut question_time_secs = std::env::var("QUIZ_TIME_LIMIT")
            .ok()
            .and_then(|raw| raw.parse::<u32>().ok());
        let mut file = None;
        let mut report_json = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--subject" => {
                    let value = require_value(args, "--subject")?;
                    let key = SubjectKey::from_display_name(&value)
                        .map_err(|_| ArgsError::InvalidSubject { raw: value.clone() })?;
                    subject = Some(key);
                }
                "--time-limit" => {
                    let value = require_value(args, "--time-limit")?;
                    let parsed = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidTimeLimit { raw: value.clone() })?;
                    question_time_secs = Some(parsed);
                }
                "--file" => file = Some(PathBuf::from(require_value(args, "--file")?)),
                "--report-json" => {
                    report_json = Some(PathBuf::from(require_value(args, "--report-json")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            subject,
            question_time_secs,
            file,
            report_json,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

//
// ─── PLAY ──────────────────────────────────────────────────────────────────────
//

type InputLines = Lines<BufReader<Stdin>>;

enum Flow {
    Continue,
    Quit,
}

async fn choose_subject(
    subjects: &[SubjectKey],
    input: &mut InputLines,
) -> Result<Option<SubjectKey>, Box<dyn std::error::Error>> {
    if subjects.is_empty() {
        println!("No subjects available. Import some questions first.");
        return Ok(None);
    }

    println!("Choose a subject:");
    for (number, subject) in subjects.iter().enumerate() {
        println!("  {}. {}", number + 1, subject.display_name());
    }

    while let Some(line) = input.next_line().await? {
        let line = line.trim();
        if line == "q" {
            return Ok(None);
        }
        let picked = line
            .parse::<usize>()
            .ok()
            .and_then(|number| number.checked_sub(1))
            .and_then(|index| subjects.get(index));
        match picked {
            Some(subject) => return Ok(Some(subject.clone())),
            None => println!("Enter a number between 1 and {}, or q.", subjects.len()),
        }
    }
    Ok(None)
}

fn show_current(driver: &QuizDriver) {
    let session = driver.session();
    if let Some(view) = session.current_question_view() {
        render::question(&view, session.remaining_secs());
    }
}

fn finish(report: &QuizReport, json_path: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = json_path {
        std::fs::write(path, serde_json::to_string_pretty(report)?)?;
        tracing::info!(path = %path.display(), "report written");
    }
    render::report(report);
    Ok(())
}

fn handle_line(
    driver: &mut QuizDriver,
    line: &str,
    json_path: Option<&PathBuf>,
) -> Result<Flow, Box<dyn std::error::Error>> {
    if line == "q" {
        return Ok(Flow::Quit);
    }

    if driver.session().phase() == QuizPhase::Completed {
        if line == "y" {
            driver.restart()?;
            show_current(driver);
        } else {
            println!("Enter y to play again or q to quit.");
        }
        return Ok(Flow::Continue);
    }

    let result = match line {
        "n" => driver.session_mut().go_next().map(|_| ()),
        "p" => driver.session_mut().go_previous().map(|_| ()),
        "s" => {
            let report = driver.session_mut().submit()?;
            finish(&report, json_path)?;
            return Ok(Flow::Continue);
        }
        other => match other.parse::<usize>() {
            Ok(number) if number > 0 => {
                let index = driver.session().current_index().unwrap_or(0);
                driver
                    .session_mut()
                    .select_answer(index, number - 1)
                    .map(|_| ())
            }
            _ => {
                println!("Enter an option number, n, p, s or q.");
                return Ok(Flow::Continue);
            }
        },
    };

    match result {
        Ok(()) => show_current(driver),
        Err(QuizError::InvalidOperation(InvalidOperation::AlreadyLocked { .. })) => {
            println!("This question is already locked.");
        }
        Err(QuizError::InvalidOperation(InvalidOperation::OptionOutOfRange { count, .. })) => {
            println!("Pick an option between 1 and {count}.");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(Flow::Continue)
}

fn handle_timer(
    driver: &mut QuizDriver,
    outcome: TimerOutcome,
    json_path: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        TimerOutcome::Ignored => {}
        TimerOutcome::Tick { remaining, .. } => render::tick(remaining),
        TimerOutcome::TimedOut { .. } => {
            if let Some(view) = driver.session().current_question_view() {
                render::timed_out(&view);
            }
        }
        TimerOutcome::Advanced { .. } => show_current(driver),
        TimerOutcome::Submitted(report) => {
            if let Some(view) = driver.session().current_question_view() {
                render::timed_out(&view);
            }
            finish(&report, json_path)?;
        }
    }
    Ok(())
}

async fn play(service: QuizLoopService, args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let subject = match args.subject {
        Some(subject) => subject,
        None => {
            let subjects = service.subjects().await?;
            match choose_subject(&subjects, &mut input).await? {
                Some(subject) => subject,
                None => return Ok(()),
            }
        }
    };

    let mut settings = service.load_settings().await?;
    if let Some(secs) = args.question_time_secs {
        settings = settings.with_question_time_secs(secs)?;
    }

    let timer = TokioCountdown::from_current()?;
    let mut driver = service
        .start_quiz_with(&subject, settings, Box::new(timer))
        .await?;
    show_current(&driver);

    let json_path = args.report_json.as_ref();
    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let Flow::Quit = handle_line(&mut driver, line.trim(), json_path)? {
                    break;
                }
            }
            Some(event) = driver.next_event() => {
                let outcome = driver.dispatch(event)?;
                handle_timer(&mut driver, outcome, json_path)?;
            }
        }
    }

    Ok(())
}

//
// ─── ADMIN ─────────────────────────────────────────────────────────────────────
//

async fn list_subjects(banks: BankService) -> Result<(), Box<dyn std::error::Error>> {
    for subject in banks.list_subjects().await? {
        let count = banks.questions(&subject).await?.len();
        println!("{:<24} {} ({count} questions)", subject.as_str(), subject.display_name());
    }
    Ok(())
}

async fn import(banks: BankService, args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let subject = args
        .subject
        .ok_or(ArgsError::MissingFlag { flag: "--subject" })?;
    let path = args.file.ok_or(ArgsError::MissingFlag { flag: "--file" })?;

    let file = std::fs::File::open(&path)?;
    let summary = banks.import_csv(&subject, file).await?;
    println!(
        "Imported {} questions into {} ({} lines skipped).",
        summary.added,
        subject.display_name(),
        summary.skipped
    );
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    match cmd {
        Command::Play => {
            let service = QuizLoopService::new(
                Clock::system(),
                storage.banks.clone(),
                storage.settings.clone(),
            );
            play(service, parsed).await
        }
        Command::Subjects => list_subjects(BankService::new(storage.banks.clone())).await,
        Command::Import => import(BankService::new(storage.banks.clone()), parsed).await,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
