use std::fmt;

use thiserror::Error;

/// Failure kinds produced by the mail pipeline.
///
/// Search and fetch failures are localized (one folder, one message) and the
/// pipelines that raise them keep going; `EmptyFilter` is rejected before any
/// network call is made.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("search in {folder} failed: {message}")]
    Search { folder: String, message: String },

    #[error("fetch of message {uid} failed: {message}")]
    Fetch { uid: u32, message: String },

    #[error("search filter has no predicates")]
    EmptyFilter,
}

/// One failed connection strategy, recorded in attempted order.
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: MailError,
}

/// Every connection strategy failed. Carries the per-strategy error
/// summaries so the caller can print remediation guidance.
#[derive(Debug)]
pub struct ConnectFailure {
    pub attempts: Vec<StrategyFailure>,
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "all {} connection strategies failed:", self.attempts.len())?;
        for attempt in &self.attempts {
            writeln!(f, "  - {}: {}", attempt.strategy, attempt.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConnectFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_failure_lists_every_attempt_in_order() {
        let failure = ConnectFailure {
            attempts: vec![
                StrategyFailure {
                    strategy: "Direct TLS (port 993)".into(),
                    error: MailError::Transport("connection refused".into()),
                },
                StrategyFailure {
                    strategy: "Direct TLS, relaxed protocol versions".into(),
                    error: MailError::Transport("handshake failed".into()),
                },
                StrategyFailure {
                    strategy: "Port 143 with STARTTLS".into(),
                    error: MailError::Auth("LOGIN rejected".into()),
                },
            ],
        };

        let text = failure.to_string();
        assert!(text.contains("all 3 connection strategies failed"));
        let tls = text.find("Direct TLS (port 993)").unwrap();
        let relaxed = text.find("relaxed protocol versions").unwrap();
        let starttls = text.find("Port 143 with STARTTLS").unwrap();
        assert!(tls < relaxed && relaxed < starttls);
        assert!(text.contains("LOGIN rejected"));
    }

    #[test]
    fn error_messages_name_the_failing_scope() {
        let search = MailError::Search {
            folder: "Archive".into(),
            message: "BAD parse error".into(),
        };
        assert!(search.to_string().contains("Archive"));

        let fetch = MailError::Fetch {
            uid: 42,
            message: "no body in response".into(),
        };
        assert!(fetch.to_string().contains("42"));
    }
}
