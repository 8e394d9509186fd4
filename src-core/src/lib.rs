//! Shared core for mailscope: message records, search filters, header and
//! MIME parsing, frequency statistics, and prompt templating.
//!
//! Everything here is synchronous and network-free; the binary crate owns
//! the IMAP transport and calls down into these helpers.

pub mod error;
pub mod filter;
pub mod folder;
pub mod parse;
pub mod progress;
pub mod prompt;
pub mod stats;
pub mod types;

pub use error::{ConnectFailure, MailError, StrategyFailure};
pub use filter::{SearchFilter, DEFAULT_RESULT_LIMIT};
pub use folder::{Folder, FolderKind};
pub use progress::{NullProgress, ProgressSink, RecordingProgress};
pub use types::{EmailAddress, FetchBatch, MessageHit, MessageRecord, StatsSnapshot};
