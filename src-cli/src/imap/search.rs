use std::collections::HashSet;

use tracing::{info, warn};

use mailscope_core::{Folder, MailError, MessageHit, SearchFilter};

use super::backend::MailBackend;

/// Run `filter` against the candidate folders and aggregate identifiers.
///
/// A filter whose only predicate is the sender address is assumed to target
/// outgoing mail: resolved sent-like folders are tried ahead of the
/// requested folders and the scan stops at the first folder that yields a
/// match. Duplicated identifiers keep the attribution of the folder that
/// found them first, and the result limit keeps the tail of the aggregate
/// (most recent, server order assumed ascending).
///
/// A per-folder search failure is logged and skipped, never fatal to the
/// remaining folders. An empty filter is rejected before any server call.
pub async fn run_search<B: MailBackend>(
    backend: &mut B,
    filter: &SearchFilter,
    folder_hints: &[String],
    folders: &[Folder],
) -> Result<Vec<MessageHit>, MailError> {
    let query = filter.build_query()?;

    let from_only = filter.is_from_only();
    let mut candidates: Vec<String> = Vec::new();
    if from_only {
        candidates.extend(
            folders
                .iter()
                .filter(|f| f.is_sent_like())
                .map(|f| f.name.clone()),
        );
    }
    for hint in folder_hints {
        if !candidates.iter().any(|c| c == hint) {
            candidates.push(hint.clone());
        }
    }
    if candidates.is_empty() {
        candidates.push("INBOX".to_string());
    }

    let mut seen: HashSet<u32> = HashSet::new();
    let mut hits: Vec<MessageHit> = Vec::new();

    for folder in &candidates {
        match backend.uid_search(folder, &query).await {
            Ok(uids) => {
                let found = !uids.is_empty();
                for uid in uids {
                    if seen.insert(uid) {
                        hits.push(MessageHit::new(folder.clone(), uid));
                    }
                }
                if from_only && found {
                    // Outgoing-mail heuristic: first folder with matches wins.
                    break;
                }
            }
            Err(e) => {
                warn!("Search in {} failed, skipping folder: {}", folder, e);
            }
        }
    }

    if filter.limit > 0 && hits.len() > filter.limit {
        hits.drain(..hits.len() - filter.limit);
    }

    info!(
        "Search matched {} message(s) across {} candidate folder(s)",
        hits.len(),
        candidates.len()
    );
    Ok(hits)
}
