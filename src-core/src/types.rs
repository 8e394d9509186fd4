use std::fmt;

use serde::Serialize;

/// A parsed mailbox address with an optional display name.
#[derive(Debug, Clone, Serialize)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub address: String,
}

impl Default for EmailAddress {
    fn default() -> Self {
        Self {
            name: Some("Unknown".to_string()),
            address: "unknown@unknown.com".to_string(),
        }
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if !name.is_empty() => write!(f, "{} <{}>", name, self.address),
            _ => write!(f, "{}", self.address),
        }
    }
}

/// A search result: the server-side identifier plus the folder the query
/// that found it ran against. Identifiers are only unique per folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MessageHit {
    pub folder: String,
    pub uid: u32,
}

impl MessageHit {
    pub fn new(folder: impl Into<String>, uid: u32) -> Self {
        Self {
            folder: folder.into(),
            uid,
        }
    }
}

/// One fetched message. Immutable once built, never persisted.
///
/// `date` is the raw Date header as the server sent it — display code
/// reformats it when it happens to parse. `body` is a capped plain-text
/// preview, never the full MIME tree.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    pub uid: u32,
    pub folder: String,
    pub from: EmailAddress,
    pub to: Vec<EmailAddress>,
    pub cc: Vec<EmailAddress>,
    pub subject: String,
    pub date: String,
    pub body: String,
}

/// Outcome of one best-effort fetch pass.
///
/// A short `records` list is not "no more matches": the pass skips messages
/// that fail and gives up entirely once `failed` passes the abort threshold,
/// in which case `aborted` is set.
#[derive(Debug, Default)]
pub struct FetchBatch {
    pub records: Vec<MessageRecord>,
    pub failed: u32,
    pub aborted: bool,
}

/// Sender and subject-keyword frequencies for one folder, recomputed fresh
/// on every call.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Messages in the folder, before sampling.
    pub total_emails: usize,
    /// Messages actually analyzed (capped by the sampling ceiling).
    pub analyzed_emails: usize,
    pub top_senders: Vec<(String, usize)>,
    pub top_subject_keywords: Vec<(String, usize)>,
}
