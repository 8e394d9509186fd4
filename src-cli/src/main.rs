//! mailscope: inspect a mailbox over IMAP without storing anything.
//!
//! Connect, search by sender/recipient/subject/date, view results as a
//! table, tabulate folder statistics, and optionally assemble the matching
//! messages into a prompt for an external LLM analysis step.

use std::fs;
use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mailscope_core::{prompt, Folder, MessageRecord, SearchFilter, DEFAULT_RESULT_LIMIT};

mod config;
mod display;
mod imap;

use display::ConsoleProgress;
use imap::Session;

#[derive(Parser, Debug)]
#[command(
    name = "mailscope",
    version,
    about = "Inspect a mailbox over IMAP — search, statistics, analysis prompts. Nothing is stored."
)]
struct Args {
    /// Email address to sign in with (prompted when absent)
    #[arg(short, long)]
    email: Option<String>,

    /// IMAP server (auto-detected from the address when absent)
    #[arg(short, long)]
    server: Option<String>,

    /// IMAP port
    #[arg(short, long, default_value_t = imap::STANDARD_TLS_PORT)]
    port: u16,
}

fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mailscope=info,mailscope_core=info"));

    // Log to a daily-rolling file, keeping the console clean for the menu.
    let log_dir = dirs::data_dir().map(|d| d.join("mailscope").join("logs"));
    match log_dir {
        Some(dir) => {
            let _ = fs::create_dir_all(&dir);
            let appender = tracing_appender::rolling::daily(&dir, "mailscope.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            None
        }
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush().context("flush failed")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read input")?;
    Ok(line.trim().to_string())
}

fn prompt_optional(label: &str) -> Result<Option<String>> {
    let value = prompt_line(label)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

fn prompt_date(label: &str) -> Result<Option<NaiveDate>> {
    match prompt_optional(label)? {
        None => Ok(None),
        Some(text) => match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            Ok(date) => Ok(Some(date)),
            Err(_) => {
                println!("Ignoring unparseable date {:?} (expected YYYY-MM-DD)", text);
                Ok(None)
            }
        },
    }
}

#[async_std::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = setup_logging();

    println!("mailscope — analyze your mailbox on the go, nothing stored");
    println!();

    let email = match args.email {
        Some(e) => e,
        None => prompt_line("Email address: ")?,
    };
    if email.is_empty() {
        bail!("an email address is required");
    }

    let secret =
        rpassword::prompt_password("Password (input hidden): ").context("failed to read password")?;

    println!("Connecting...");
    let mut session = match imap::connect(&email, &secret, args.server.as_deref(), args.port).await
    {
        Ok(session) => session,
        Err(failure) => {
            eprintln!("{}", failure);
            eprintln!("{}", config::connection_help(&email));
            bail!("could not connect to the mail server");
        }
    };
    println!(
        "Connected to {}:{} via {}",
        session.host, session.port, session.strategy
    );

    let folders = imap::folders::list_folders(&mut session).await;
    info!("Resolved {} folder(s)", folders.len());

    let outcome = run_menu(&mut session, &folders).await;

    session.disconnect().await;
    println!("Goodbye!");
    outcome
}

async fn run_menu(session: &mut Session, folders: &[Folder]) -> Result<()> {
    let mut last_results: Vec<MessageRecord> = Vec::new();

    loop {
        println!();
        println!("{}", "=".repeat(50));
        println!("What would you like to do?");
        println!("  1. Mailbox statistics");
        println!("  2. Search messages");
        println!("  3. Build an analysis prompt from the last results");
        println!("  4. List folders");
        println!("  5. Provider setup notes");
        println!("  6. Exit");

        match prompt_line("Choose an option: ")?.as_str() {
            "1" => run_stats(session).await?,
            "2" => {
                if let Some(records) = run_search(session, folders).await? {
                    last_results = records;
                }
            }
            "3" => save_analysis_prompt(&last_results)?,
            "4" => display::print_folders(folders),
            "5" => println!("{}", config::connection_help(&session.email)),
            "6" | "" => break,
            other => println!("Unknown option {:?}", other),
        }
    }

    Ok(())
}

async fn run_stats(session: &mut Session) -> Result<()> {
    let folder = prompt_line("Folder to analyze [INBOX]: ")?;
    let folder = if folder.is_empty() { "INBOX" } else { folder.as_str() };

    let mut progress = ConsoleProgress::default();
    match imap::stats::summarize(session, folder, &mut progress).await {
        Ok(snapshot) => display::print_stats(&snapshot),
        Err(e) => {
            warn!("Statistics pass failed: {}", e);
            println!("Could not analyze {}: {}", folder, e);
        }
    }
    Ok(())
}

async fn run_search(
    session: &mut Session,
    folders: &[Folder],
) -> Result<Option<Vec<MessageRecord>>> {
    println!("Leave any field empty to skip it.");
    let filter = SearchFilter {
        from: prompt_optional("From address: ")?,
        to: prompt_optional("To address: ")?,
        cc: prompt_optional("Cc address: ")?,
        subject: prompt_optional("Subject keyword: ")?,
        since: prompt_date("Since date (YYYY-MM-DD, inclusive): ")?,
        before: prompt_date("Before date (YYYY-MM-DD, exclusive): ")?,
        limit: prompt_line(&format!("Result limit [{}]: ", DEFAULT_RESULT_LIMIT))?
            .parse()
            .unwrap_or(DEFAULT_RESULT_LIMIT),
    };

    if filter.is_empty() {
        println!("Enter at least one search field.");
        return Ok(None);
    }

    let folder = prompt_line("Folder to search [INBOX]: ")?;
    let hints = vec![if folder.is_empty() {
        "INBOX".to_string()
    } else {
        folder
    }];

    let hits = match imap::search::run_search(session, &filter, &hints, folders).await {
        Ok(hits) => hits,
        Err(e) => {
            println!("Search failed: {}", e);
            return Ok(None);
        }
    };
    if hits.is_empty() {
        println!("No matching messages.");
        return Ok(None);
    }
    println!("Found {} matching message(s), fetching details...", hits.len());

    let mut progress = ConsoleProgress::default();
    let batch = imap::fetch::fetch_details(session, &hits, None, &mut progress).await;
    if batch.failed > 0 {
        println!(
            "{} message(s) could not be fetched{}",
            batch.failed,
            if batch.aborted {
                "; gave up early, results are incomplete"
            } else {
                ""
            }
        );
    }

    display::print_message_table(&batch.records, "Search results");
    Ok(Some(batch.records))
}

fn save_analysis_prompt(records: &[MessageRecord]) -> Result<()> {
    if records.is_empty() {
        println!("Run a search first — there are no results to analyze.");
        return Ok(());
    }

    let request = prompt_line("What should the analysis focus on? ")?;
    if request.is_empty() {
        println!("Analysis request cannot be empty.");
        return Ok(());
    }

    let text = prompt::build_analysis_prompt(&request, records);
    let filename = prompt::prompt_filename(Local::now());
    fs::write(&filename, &text).with_context(|| format!("failed to write {}", filename))?;

    info!("Wrote analysis prompt ({} bytes) to {}", text.len(), filename);
    println!(
        "Saved prompt covering {} message(s) to {}",
        records.len(),
        filename
    );
    Ok(())
}
