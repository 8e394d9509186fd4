//! The slice of IMAP the pipelines need, behind a trait so they can run
//! against a recording fake in tests.

use async_trait::async_trait;
use futures::StreamExt;

use mailscope_core::MailError;

use super::Session;

/// Server operations used by the search/fetch/statistics pipelines.
///
/// Folder selection is server-side session state, so every operation that
/// depends on it re-selects the folder immediately before use — nothing
/// assumes a selection persists across calls.
#[async_trait]
pub trait MailBackend {
    /// Raw LIST results: `(delimiter, name)` per mailbox.
    async fn list_folders(&mut self) -> Result<Vec<(Option<String>, String)>, MailError>;

    /// UID SEARCH in one folder. Identifiers come back ascending.
    async fn uid_search(&mut self, folder: &str, query: &str) -> Result<Vec<u32>, MailError>;

    /// Full message source for one identifier.
    async fn fetch_message(&mut self, folder: &str, uid: u32) -> Result<Vec<u8>, MailError>;

    /// Header block only, for the degraded path and statistics.
    async fn fetch_headers(&mut self, folder: &str, uid: u32) -> Result<Vec<u8>, MailError>;
}

#[async_trait]
impl MailBackend for Session {
    async fn list_folders(&mut self) -> Result<Vec<(Option<String>, String)>, MailError> {
        let session = self.session_mut()?;
        let stream = session
            .list(Some(""), Some("*"))
            .await
            .map_err(|e| MailError::Transport(format!("LIST failed: {}", e)))?;

        let names: Vec<async_imap::types::Name> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();

        Ok(names
            .iter()
            .map(|n| (n.delimiter().map(|d| d.to_string()), n.name().to_string()))
            .collect())
    }

    async fn uid_search(&mut self, folder: &str, query: &str) -> Result<Vec<u32>, MailError> {
        let session = self.session_mut()?;
        session.select(folder).await.map_err(|e| MailError::Search {
            folder: folder.to_string(),
            message: format!("SELECT failed: {}", e),
        })?;

        let uids = session
            .uid_search(query)
            .await
            .map_err(|e| MailError::Search {
                folder: folder.to_string(),
                message: format!("SEARCH failed: {}", e),
            })?;

        let mut result: Vec<u32> = uids.into_iter().collect();
        result.sort_unstable();
        Ok(result)
    }

    async fn fetch_message(&mut self, folder: &str, uid: u32) -> Result<Vec<u8>, MailError> {
        let session = self.session_mut()?;
        session.select(folder).await.map_err(|e| MailError::Fetch {
            uid,
            message: format!("SELECT {} failed: {}", folder, e),
        })?;

        let stream = session
            .uid_fetch(uid.to_string(), "(UID BODY.PEEK[])")
            .await
            .map_err(|e| MailError::Fetch {
                uid,
                message: format!("UID FETCH failed: {}", e),
            })?;

        let fetches: Vec<async_imap::types::Fetch> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();

        let fetch = fetches.first().ok_or_else(|| MailError::Fetch {
            uid,
            message: "no FETCH response".to_string(),
        })?;
        let body = fetch.body().ok_or_else(|| MailError::Fetch {
            uid,
            message: "no body in FETCH response".to_string(),
        })?;
        Ok(body.to_vec())
    }

    async fn fetch_headers(&mut self, folder: &str, uid: u32) -> Result<Vec<u8>, MailError> {
        let session = self.session_mut()?;
        session.select(folder).await.map_err(|e| MailError::Fetch {
            uid,
            message: format!("SELECT {} failed: {}", folder, e),
        })?;

        let stream = session
            .uid_fetch(uid.to_string(), "(UID RFC822.HEADER)")
            .await
            .map_err(|e| MailError::Fetch {
                uid,
                message: format!("UID FETCH (headers) failed: {}", e),
            })?;

        let fetches: Vec<async_imap::types::Fetch> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .collect();

        let fetch = fetches.first().ok_or_else(|| MailError::Fetch {
            uid,
            message: "no FETCH response".to_string(),
        })?;
        let header = fetch.header().ok_or_else(|| MailError::Fetch {
            uid,
            message: "no header block in FETCH response".to_string(),
        })?;
        Ok(header.to_vec())
    }
}
