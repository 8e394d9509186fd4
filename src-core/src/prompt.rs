//! Turns fetched messages plus a free-text analysis request into a prompt
//! for an external LLM step. Pure templating; the caller writes the file.

use chrono::{DateTime, Local};

use crate::types::{EmailAddress, MessageRecord};

fn join_addresses(addrs: &[EmailAddress]) -> String {
    addrs
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the analysis prompt. Bodies are already capped at parse time, so
/// the output stays bounded by the number of records.
pub fn build_analysis_prompt(request: &str, records: &[MessageRecord]) -> String {
    let mut out = String::new();
    out.push_str("You are analyzing a set of emails fetched live from a mailbox.\n");
    out.push_str("Nothing below was stored anywhere; treat it as a one-off snapshot.\n\n");
    out.push_str(&format!("Analysis request: {}\n\n", request.trim()));
    out.push_str(&format!("Messages ({} total):\n\n", records.len()));

    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!("--- Message {} ---\n", i + 1));
        out.push_str(&format!("Folder: {}\n", record.folder));
        out.push_str(&format!("From: {}\n", record.from));
        out.push_str(&format!("To: {}\n", join_addresses(&record.to)));
        if !record.cc.is_empty() {
            out.push_str(&format!("Cc: {}\n", join_addresses(&record.cc)));
        }
        out.push_str(&format!("Subject: {}\n", record.subject));
        out.push_str(&format!("Date: {}\n", record.date));
        out.push_str(&format!("Body:\n{}\n\n", record.body));
    }

    out.push_str("Answer the analysis request using only the messages above.\n");
    out
}

/// File name for a saved prompt, timestamped to the second.
pub fn prompt_filename(now: DateTime<Local>) -> String {
    format!("email_analysis_prompt_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(subject: &str) -> MessageRecord {
        MessageRecord {
            uid: 1,
            folder: "INBOX".into(),
            from: EmailAddress {
                name: Some("Alice".into()),
                address: "alice@example.com".into(),
            },
            to: vec![EmailAddress {
                name: None,
                address: "bob@example.com".into(),
            }],
            cc: Vec::new(),
            subject: subject.into(),
            date: "Mon, 6 May 2024 10:15:00 +0000".into(),
            body: "Status is green.".into(),
        }
    }

    #[test]
    fn prompt_carries_request_and_every_message() {
        let records = vec![record("Project Update"), record("Follow-up")];
        let prompt = build_analysis_prompt("Summarize open action items", &records);
        assert!(prompt.contains("Analysis request: Summarize open action items"));
        assert!(prompt.contains("Messages (2 total)"));
        assert!(prompt.contains("--- Message 2 ---"));
        assert!(prompt.contains("Subject: Follow-up"));
        assert!(prompt.contains("Alice <alice@example.com>"));
        // Empty Cc lists are omitted entirely.
        assert!(!prompt.contains("Cc:"));
    }

    #[test]
    fn prompt_filename_is_timestamped() {
        let when = Local.with_ymd_and_hms(2024, 5, 6, 9, 30, 15).unwrap();
        assert_eq!(
            prompt_filename(when),
            "email_analysis_prompt_20240506_093015.txt"
        );
    }
}
