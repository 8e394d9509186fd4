use tracing::{info, warn};

use mailscope_core::parse;
use mailscope_core::progress::ProgressSink;
use mailscope_core::stats::{self, FrequencyTable, SAMPLE_CEILING, TOP_KEYWORDS, TOP_SENDERS};
use mailscope_core::{MailError, StatsSnapshot};

use super::backend::MailBackend;

/// Sample a folder and tabulate sender and subject-keyword frequencies.
///
/// The total comes from an unconstrained search; when it exceeds the
/// sampling ceiling only the most recent identifiers are analyzed — a
/// documented approximation, not an exhaustive pass. Recomputed fresh every
/// call; nothing is cached.
pub async fn summarize<B: MailBackend>(
    backend: &mut B,
    folder: &str,
    progress: &mut dyn ProgressSink,
) -> Result<StatsSnapshot, MailError> {
    let uids = backend.uid_search(folder, "ALL").await?;
    let total = uids.len();

    let sampled = stats::sample_tail(&uids, SAMPLE_CEILING);
    if sampled.len() < total {
        info!(
            "Sampling {} most recent of {} messages in {}",
            sampled.len(),
            total,
            folder
        );
    }

    let mut senders = FrequencyTable::new();
    let mut keywords = FrequencyTable::new();
    progress.begin(sampled.len());

    for &uid in sampled {
        match backend.fetch_headers(folder, uid).await {
            Ok(raw) => {
                let record = parse::parse_header_block(&raw, folder, uid);
                // Permissive pattern match keeps malformed From lines out of
                // the tally instead of polluting it.
                if let Some(address) = stats::extract_address(&record.from.address) {
                    senders.add(address);
                }
                for word in stats::subject_keywords(&record.subject) {
                    keywords.add(word);
                }
            }
            Err(e) => warn!("Skipping headers for {} in {}: {}", uid, folder, e),
        }
        progress.advance();
    }
    progress.finish();

    Ok(StatsSnapshot {
        total_emails: total,
        analyzed_emails: sampled.len(),
        top_senders: senders.top(TOP_SENDERS),
        top_subject_keywords: keywords.top(TOP_KEYWORDS),
    })
}
