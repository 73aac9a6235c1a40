use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use quiz_core::model::{ModuleId, ResultId, TestId};
use serde::Serialize;
use services::{AppServices, Clock, SessionError, SessionStatus, TestSession, TestSessionService};
use storage::BackendConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidTimeout { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
            ArgsError::InvalidTimeout { raw } => {
                write!(f, "invalid --timeout value (expected seconds): {raw}")
            }
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

fn parse_id<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- take      --test-id <id>");
    eprintln!("  cargo run -p app -- result    --result-id <id> [--json]");
    eprintln!("  cargo run -p app -- progress  --test-id <id> [--json]");
    eprintln!("  cargo run -p app -- dashboard [--module-id <id>]... [--json]");
    eprintln!();
    eprintln!("Backend options (all commands):");
    eprintln!("  --base-url <url>  --token <token>  --timeout <seconds>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_API_TOKEN, QUIZ_API_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    Result,
    Progress,
    Dashboard,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "result" => Some(Self::Result),
            "progress" => Some(Self::Progress),
            "dashboard" => Some(Self::Dashboard),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    base_url: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
    test_id: Option<TestId>,
    result_id: Option<ResultId>,
    module_ids: Vec<ModuleId>,
    json: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => parsed.base_url = Some(require_value(args, "--base-url")?),
                "--token" => parsed.token = Some(require_value(args, "--token")?),
                "--timeout" => {
                    let value = require_value(args, "--timeout")?;
                    let timeout = storage::http::parse_timeout(&value)
                        .map_err(|_| ArgsError::InvalidTimeout { raw: value.clone() })?;
                    parsed.timeout = Some(timeout);
                }
                "--test-id" => {
                    let value = require_value(args, "--test-id")?;
                    parsed.test_id = Some(parse_id(value, "--test-id")?);
                }
                "--result-id" => {
                    let value = require_value(args, "--result-id")?;
                    parsed.result_id = Some(parse_id(value, "--result-id")?);
                }
                "--module-id" => {
                    let value = require_value(args, "--module-id")?;
                    parsed.module_ids.push(parse_id(value, "--module-id")?);
                }
                "--json" => parsed.json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }

    fn backend_config(&self) -> Result<BackendConfig, Box<dyn std::error::Error>> {
        // Flags override the environment one field at a time.
        let mut config = BackendConfig::from_env()?;
        if let Some(url) = &self.base_url {
            config.base_url = BackendConfig::new(url)?.base_url;
        }
        if let Some(token) = &self.token {
            config = config.with_token(token.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            ArgsError::UnknownArg(first.clone())
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = args.backend_config()?;
    info!(base_url = %config.base_url, "using backend");
    let services = AppServices::new_http(&config, Clock::default())?;

    match cmd {
        Command::Take => {
            let test_id = args
                .test_id
                .clone()
                .ok_or(ArgsError::MissingFlag { flag: "--test-id" })?;
            take_test(&services.sessions(), test_id).await?;
        }
        Command::Result => {
            let result_id = args
                .result_id
                .as_ref()
                .ok_or(ArgsError::MissingFlag { flag: "--result-id" })?;
            let view = services.analytics().result_view(result_id).await?;
            if args.json {
                print_json(&view)?;
            } else {
                render::result(&view);
            }
        }
        Command::Progress => {
            let test_id = args
                .test_id
                .as_ref()
                .ok_or(ArgsError::MissingFlag { flag: "--test-id" })?;
            let view = services.analytics().test_progress(test_id).await?;
            if args.json {
                print_json(&view)?;
            } else {
                render::test_progress(&view);
            }
        }
        Command::Dashboard => {
            let view = services.analytics().dashboard(&args.module_ids).await;
            if args.json {
                print_json(&view)?;
            } else {
                render::dashboard(&view);
            }
        }
    }
    Ok(())
}

//
// ─── INTERACTIVE SESSION ───────────────────────────────────────────────────────
//

enum Input {
    Select(usize),
    Next,
    Previous,
    Goto(usize),
    Submit,
    Resume,
    Quit,
    Help,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let input = match head {
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Previous,
        "g" | "goto" => Input::Goto(parts.next()?.parse::<usize>().ok()?.checked_sub(1)?),
        "s" | "submit" => Input::Submit,
        "r" | "resume" => Input::Resume,
        "q" | "quit" => Input::Quit,
        "h" | "help" | "?" => Input::Help,
        other => Input::Select(other.parse::<usize>().ok()?.checked_sub(1)?),
    };
    Some(input)
}

fn print_controls() {
    println!("Controls: <number> choose option, n/p next/previous, g <k> go to question k,");
    println!("          s submit, r resume after a failed submit, q quit without saving");
}

async fn take_test(
    sessions: &TestSessionService,
    test_id: TestId,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = sessions.open_session(test_id).await;
    if session.status() == SessionStatus::Failed {
        println!("{}", render::session_state(&session));
        return Ok(());
    }

    print_controls();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        render::question(&session, sessions.now());
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!("Input closed; attempt abandoned.");
            return Ok(());
        };
        let Some(input) = parse_input(&line) else {
            println!("Unrecognized input.");
            continue;
        };

        let outcome = match input {
            Input::Select(option) => session.select_current(option).map(|_| ()),
            Input::Next => session.next().map(|_| ()),
            Input::Previous => session.previous().map(|_| ()),
            Input::Goto(index) => session.move_to(index),
            Input::Resume => session.resume(),
            Input::Help => {
                print_controls();
                Ok(())
            }
            Input::Quit => {
                println!("Attempt abandoned.");
                return Ok(());
            }
            Input::Submit => match sessions.submit(&mut session).await {
                Ok(result_id) => {
                    println!("Submitted. Result id: {result_id}");
                    finish(sessions, &session, &result_id).await;
                    return Ok(());
                }
                Err(err) => Err(err),
            },
        };

        match outcome {
            Ok(()) => {}
            Err(SessionError::IncompleteSubmission { unanswered }) => {
                let ids: Vec<&str> = unanswered.iter().map(|id| id.as_str()).collect();
                println!("Still unanswered: {}", ids.join(", "));
            }
            Err(SessionError::SubmissionTransportFailure(err)) => {
                println!("Submission failed ({err}). Your answers are kept; enter s to retry.");
            }
            Err(err) => println!("{err}"),
        }
    }
}

async fn finish(sessions: &TestSessionService, session: &TestSession, result_id: &ResultId) {
    println!(
        "Time taken: {}",
        render::duration(session.elapsed(sessions.now()))
    );
    match sessions.result(result_id).await {
        Ok(record) => render::result(&services::analytics::ResultView::from(record)),
        Err(err) => println!("Result not available yet: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn parses_repeated_module_ids() {
        let args = parse(&["--module-id", "m1", "--module-id", "m2", "--json"]).unwrap();
        assert_eq!(args.module_ids, vec![ModuleId::new("m1"), ModuleId::new("m2")]);
        assert!(args.json);
    }

    #[test]
    fn rejects_blank_ids_and_bad_timeouts() {
        assert!(matches!(
            parse(&["--test-id", "  "]),
            Err(ArgsError::InvalidId { flag: "--test-id", .. })
        ));
        assert!(matches!(
            parse(&["--timeout", "soon"]),
            Err(ArgsError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            parse(&["--result-id"]),
            Err(ArgsError::MissingValue { flag: "--result-id" })
        ));
    }

    #[test]
    fn interactive_input_is_one_based() {
        assert!(matches!(parse_input("2"), Some(Input::Select(1))));
        assert!(matches!(parse_input("g 3"), Some(Input::Goto(2))));
        assert!(parse_input("0").is_none());
        assert!(parse_input("").is_none());
        assert!(matches!(parse_input("s"), Some(Input::Submit)));
    }
}
