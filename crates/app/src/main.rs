use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use client::http::HttpExamApi;
use client::remote::ExamApi;
use client::session_ref::{FileSessionRefStore, SessionRefStore};
use exam_core::Clock;
use exam_core::model::{
    AnswerLetter, Domain, MAX_QUESTIONS, MIN_QUESTIONS, TestConfig, TestResults,
    subjects_for_class,
};
use services::{CollectorService, RunnerWorkflow, SessionTimer, TestRunner, format_elapsed};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
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
    eprintln!("  cargo run -p app -- new    [--api <base_url>] [--store <path>]");
    eprintln!("  cargo run -p app -- resume [--api <base_url>] [--store <path>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api http://localhost:8000");
    eprintln!("  --store .exam-session");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_API_URL, EXAM_SESSION_FILE");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    New,
    Resume,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "new" => Some(Self::New),
            "resume" => Some(Self::Resume),
            _ => None,
        }
    }
}

struct Args {
    api_url: String,
    store_path: PathBuf,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api_url =
            std::env::var("EXAM_API_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        let mut store_path = std::env::var("EXAM_SESSION_FILE")
            .map_or_else(|_| PathBuf::from(".exam-session"), PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    api_url = value;
                }
                "--store" => {
                    let value = require_value(args, "--store")?;
                    store_path = PathBuf::from(value);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            api_url,
            store_path,
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: resume the stored session when no subcommand is
    // provided, mirroring a revisit of the test page.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Resume,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Resume,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
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

    // Composition root: wire the HTTP client and the file-backed session
    // reference into the service layer. Everything below stays pure.
    let api: Arc<dyn ExamApi> = Arc::new(HttpExamApi::new(&parsed.api_url)?);
    let store: Arc<dyn SessionRefStore> = Arc::new(FileSessionRefStore::new(parsed.store_path));
    let clock = Clock::default_clock();

    let collector = CollectorService::new(Arc::clone(&api), Arc::clone(&store));
    let workflow = RunnerWorkflow::new(api, store, clock);

    match cmd {
        Command::New => {
            if configure_test(&collector).await? {
                run_session(&workflow).await?;
            }
            Ok(())
        }
        Command::Resume => run_session(&workflow).await,
    }
}

/// Configuration form loop. Returns true when a session was created.
///
/// Validation and service errors re-display the form with the message, so a
/// failed attempt never leaves the flow stuck.
async fn configure_test(collector: &CollectorService) -> Result<bool, Box<dyn std::error::Error>> {
    let options = match collector.options().await {
        Ok(options) => options,
        Err(e) => {
            log::warn!("config options unavailable: {e}");
            Default::default()
        }
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("=== New Test ===");
        let domain = loop {
            let Some(input) = prompt(&mut lines, "Domain [school/college/competitive]: ")? else {
                return Ok(false);
            };
            match input.as_str() {
                "school" => break Domain::School,
                "college" => break Domain::College,
                "competitive" => break Domain::Competitive,
                // A blank line backs out of the form.
                "" => return Ok(false),
                other => println!("unrecognized domain: {other}"),
            }
        };

        // Only the selected domain's fields are collected; switching domain
        // on the next attempt drops the others entirely.
        let config = match domain {
            Domain::School => {
                let class_level: u8 = prompt_field(&mut lines, "Class level [6-12]: ")?
                    .parse()
                    .unwrap_or(0);
                let subjects = subjects_for_class(class_level);
                if !subjects.is_empty() {
                    println!("Subjects: {}", subjects.join(", "));
                }
                let subject = prompt_field(&mut lines, "Subject: ")?;
                let topic = prompt_field(&mut lines, "Topic: ")?;
                let count = prompt_count(&mut lines)?;
                TestConfig::school(class_level, subject, topic, count)
            }
            Domain::College => {
                if !options.college_courses.is_empty() {
                    println!("Courses: {}", options.college_courses.join(", "));
                }
                let course = prompt_field(&mut lines, "Course: ")?;
                let semester: u8 = prompt_field(&mut lines, "Semester [1-8]: ")?
                    .parse()
                    .unwrap_or(0);
                let topic = prompt_field(&mut lines, "Topic: ")?;
                let count = prompt_count(&mut lines)?;
                TestConfig::college(course, semester, topic, count)
            }
            Domain::Competitive => {
                if !options.competitive_exams.is_empty() {
                    println!("Exams: {}", options.competitive_exams.join(", "));
                }
                let exam = prompt_field(&mut lines, "Exam: ")?;
                let topic = prompt_field(&mut lines, "Topic: ")?;
                let count = prompt_count(&mut lines)?;
                TestConfig::competitive(exam, topic, count)
            }
        };

        println!("Generating test...");
        match collector.create_test(&config).await {
            Ok(created) => {
                println!(
                    "Session {} ready with {} questions.\n",
                    created.session_id, created.num_questions
                );
                return Ok(true);
            }
            Err(e) => {
                // Equivalent of the form's error banner: show the message
                // and fall through to a fresh, usable form.
                println!("Error: {e}\n");
            }
        }
    }
}

async fn run_session(workflow: &RunnerWorkflow) -> Result<(), Box<dyn std::error::Error>> {
    let mut runner = match workflow.resume().await {
        Ok(runner) => runner,
        Err(e) => {
            // Fatal to this page instance: the redirect-to-home equivalent.
            eprintln!("{e}");
            if RunnerWorkflow::is_fatal(&e) {
                eprintln!("Start a new test with: cargo run -p app -- new");
                return Ok(());
            }
            return Err(e.into());
        }
    };

    let timer = SessionTimer::start();
    println!("{}", runner.config().info_line());
    render(&runner, &timer);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let Some(input) = prompt(&mut lines, "> ")? else {
            // Stdin closed: leave like a closed tab. The session reference
            // stays, so a later `resume` picks up where this left off.
            println!();
            return Ok(());
        };
        let mut parts = input.split_whitespace();
        let verb = parts.next().unwrap_or("");

        let outcome = match verb {
            "" => Ok(()),
            "n" | "next" => {
                let target = runner.current_index() + 1;
                workflow.goto(&mut runner, target).await
            }
            "p" | "prev" => {
                let current = runner.current_index();
                if current == 0 {
                    println!("already on the first question");
                    Ok(())
                } else {
                    workflow.goto(&mut runner, current - 1).await
                }
            }
            "g" | "goto" => match parts.next().and_then(|raw| raw.parse::<usize>().ok()) {
                Some(number) if number >= 1 => workflow.goto(&mut runner, number - 1).await,
                _ => {
                    println!("usage: goto <question number>");
                    Ok(())
                }
            },
            "a" | "b" | "c" | "d" | "A" | "B" | "C" | "D" => {
                match AnswerLetter::parse(verb) {
                    Some(letter) => workflow.select(&mut runner, letter).await,
                    None => Ok(()),
                }
            }
            "s" | "submit" => {
                if !runner.is_submit_ready() {
                    println!("answer every question before submitting");
                    Ok(())
                } else if confirm(
                    &mut lines,
                    "Submit the test? You cannot change answers after submission.",
                )? {
                    match workflow.submit(&mut runner).await {
                        Ok(results) => {
                            timer.stop();
                            render_results(&results, timer.elapsed_seconds());
                            return Ok(());
                        }
                        Err(e) => Err(e),
                    }
                } else {
                    Ok(())
                }
            }
            "x" | "exit" => {
                if confirm(
                    &mut lines,
                    "Exit the test? All progress will be lost.",
                )? {
                    timer.stop();
                    workflow.exit(&mut runner).await?;
                    println!("Test abandoned.");
                    return Ok(());
                }
                Ok(())
            }
            "h" | "help" => {
                println!("commands: next (n), prev (p), goto <n> (g), a/b/c/d, submit (s), exit (x)");
                Ok(())
            }
            other => {
                println!("unknown command: {other} (try 'help')");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            // Non-fatal errors leave the current question displayed and are
            // retried by the user.
            println!("Error: {e}");
        }
        render(&runner, &timer);
    }
}

fn render(runner: &TestRunner, timer: &SessionTimer) {
    let Ok(view) = runner.question_view() else {
        return;
    };
    let progress = runner.progress();

    let strip: String = runner
        .indicators()
        .iter()
        .map(|indicator| {
            if indicator.current {
                '●'
            } else if indicator.answered {
                'x'
            } else {
                '·'
            }
        })
        .collect();

    println!();
    println!(
        "[{}] Question {}/{}  answered {}/{}  {}",
        format_elapsed(timer.elapsed_seconds()),
        view.number,
        view.total,
        progress.answered,
        progress.total,
        strip
    );
    println!("{}", view.text);
    for option in &view.options {
        let marker = if option.selected { "*" } else { " " };
        println!("  {marker}{}. {}", option.letter, option.text);
    }
    if progress.submit_ready {
        println!("All questions answered. Type 'submit' when ready.");
    }
}

fn render_results(results: &TestResults, elapsed_seconds: u64) {
    println!();
    println!("=== Results ===");
    println!(
        "Score: {}/{} ({}%)  time {}",
        results.score,
        results.total,
        results.percentage,
        format_elapsed(elapsed_seconds)
    );
    for item in &results.results {
        let status = if item.is_correct { "correct" } else { "incorrect" };
        println!();
        println!("Q{}: {} [{status}]", item.question_index + 1, item.question);
        for (position, option) in item.options.iter().enumerate() {
            let letter = AnswerLetter::from_position(position)
                .map_or_else(|| "?".into(), |l| l.to_string());
            let mut note = String::new();
            if *option == item.correct_answer {
                note.push_str(" ✓");
            }
            if Some(option.as_str()) == item.user_answer.as_deref() && !item.is_correct {
                note.push_str(" ✗ your answer");
            }
            println!("  {letter}. {option}{note}");
        }
        if item.user_answer.is_none() {
            println!("  (Not answered)");
        }
    }
}

/// Read one trimmed line for a form field; closed stdin reads as empty,
/// which validation then rejects.
fn prompt_field(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    label: &str,
) -> io::Result<String> {
    Ok(prompt(lines, label)?.unwrap_or_default())
}

/// Read one trimmed line; `None` means stdin is closed.
fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    label: &str,
) -> io::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_owned())),
        None => Ok(None),
    }
}

fn prompt_count(
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> io::Result<u8> {
    let raw = prompt(
        lines,
        &format!("Number of questions [{MIN_QUESTIONS}-{MAX_QUESTIONS}]: "),
    )?;
    // Unparseable input becomes 0 and fails validation with the range message.
    Ok(raw.and_then(|raw| raw.parse().ok()).unwrap_or(0))
}

fn confirm(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    message: &str,
) -> io::Result<bool> {
    let answer = prompt(lines, &format!("{message} [y/N] "))?;
    Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes")))
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
