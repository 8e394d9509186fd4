//! Console rendering: result tables, statistics panels, and the progress
//! sink the pipelines report into. Pure presentation, no protocol logic.

use std::io::{self, Write};

use chrono::{Local, TimeZone};

use mailscope_core::progress::ProgressSink;
use mailscope_core::{stats, Folder, FolderKind, MessageRecord, StatsSnapshot};

const TABLE_ROW_LIMIT: usize = 50;
const FROM_COL_WIDTH: usize = 38;
const SUBJECT_COL_WIDTH: usize = 60;

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// Render a raw Date header as local `YYYY-MM-DD HH:MM` when it parses,
/// otherwise show the raw value shortened.
pub fn format_date(raw: &str) -> String {
    match mailparse::dateparse(raw) {
        Ok(epoch) => match Local.timestamp_opt(epoch, 0) {
            chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            _ => truncate(raw, 20),
        },
        Err(_) => truncate(raw, 20),
    }
}

/// Print a results table: From / Subject / Date.
pub fn print_message_table(records: &[MessageRecord], title: &str) {
    if records.is_empty() {
        println!("No emails to display");
        return;
    }

    println!("\n{}", title);
    println!("{}", "-".repeat(FROM_COL_WIDTH + SUBJECT_COL_WIDTH + 20));
    println!(
        "{:<from$}  {:<subj$}  {}",
        "From",
        "Subject",
        "Date",
        from = FROM_COL_WIDTH,
        subj = SUBJECT_COL_WIDTH
    );
    println!("{}", "-".repeat(FROM_COL_WIDTH + SUBJECT_COL_WIDTH + 20));

    for record in records.iter().take(TABLE_ROW_LIMIT) {
        // Show a bare address when one can be extracted from the From field.
        let from = stats::extract_address(&record.from.to_string())
            .unwrap_or_else(|| record.from.address.clone());
        println!(
            "{:<from$}  {:<subj$}  {}",
            truncate(&from, FROM_COL_WIDTH),
            truncate(&record.subject, SUBJECT_COL_WIDTH),
            format_date(&record.date),
            from = FROM_COL_WIDTH,
            subj = SUBJECT_COL_WIDTH
        );
    }

    if records.len() > TABLE_ROW_LIMIT {
        println!("... and {} more emails", records.len() - TABLE_ROW_LIMIT);
    }
}

/// Print the statistics panels: totals, top senders, top subject keywords.
pub fn print_stats(snapshot: &StatsSnapshot) {
    println!("\nGeneral statistics");
    println!("  Total emails: {}", snapshot.total_emails);
    println!("  Analyzed:     {}", snapshot.analyzed_emails);

    if !snapshot.top_senders.is_empty() {
        println!("\nTop senders");
        for (sender, count) in &snapshot.top_senders {
            println!("  {:<44} {:>6}", truncate(sender, 44), count);
        }
    }

    if !snapshot.top_subject_keywords.is_empty() {
        println!("\nTop subject keywords");
        for (word, count) in &snapshot.top_subject_keywords {
            println!("  {:<24} {:>6}", word, count);
        }
    }
}

/// Print the folder list with classification tags.
pub fn print_folders(folders: &[Folder]) {
    println!("\nFolders ({}):", folders.len());
    for folder in folders {
        let tag = match folder.kind {
            FolderKind::Inbox => " [inbox]",
            FolderKind::SentLike => " [sent]",
            FolderKind::Other => "",
        };
        println!("  {}{}", folder.name, tag);
    }
}

/// Progress sink that repaints an `n/total` counter on one console line.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl ProgressSink for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        if total > 0 {
            print!("Processing 0/{}\r", total);
            io::stdout().flush().ok();
        }
    }

    fn advance(&mut self) {
        self.done += 1;
        print!("Processing {}/{}\r", self.done, self.total);
        io::stdout().flush().ok();
    }

    fn finish(&mut self) {
        if self.total > 0 {
            println!();
        }
    }
}
