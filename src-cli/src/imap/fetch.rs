use std::time::Duration;

use async_std::task;
use tracing::{debug, warn};

use mailscope_core::parse;
use mailscope_core::progress::ProgressSink;
use mailscope_core::{FetchBatch, MailError, MessageHit, MessageRecord};

use super::backend::MailBackend;

/// Messages that may fail before the rest of a batch is abandoned.
pub const FETCH_FAILURE_BUDGET: u32 = 5;

/// A pause is inserted after every this-many processed messages.
pub const THROTTLE_EVERY: usize = 5;

const THROTTLE_PAUSE: Duration = Duration::from_millis(200);

/// Fetch full details for `hits`, best effort.
///
/// Output order follows the (possibly limit-truncated) input order, skipping
/// only messages that failed. A message that fails the full fetch is retried
/// headers-only before counting as a failure. Once more than
/// [`FETCH_FAILURE_BUDGET`] messages have failed, the remaining batch is
/// abandoned and whatever was collected is returned with `aborted` set —
/// callers must treat a short list as potentially incomplete.
pub async fn fetch_details<B: MailBackend>(
    backend: &mut B,
    hits: &[MessageHit],
    limit: Option<usize>,
    progress: &mut dyn ProgressSink,
) -> FetchBatch {
    // The tail is the most recent end under ascending server order.
    let hits: &[MessageHit] = match limit {
        Some(l) if l > 0 && hits.len() > l => &hits[hits.len() - l..],
        _ => hits,
    };

    let mut batch = FetchBatch::default();
    progress.begin(hits.len());

    for (index, hit) in hits.iter().enumerate() {
        if index > 0 && index % THROTTLE_EVERY == 0 {
            task::sleep(THROTTLE_PAUSE).await;
        }

        match fetch_one(backend, hit).await {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!("Skipping message {} in {}: {}", hit.uid, hit.folder, e);
                batch.failed += 1;
                if batch.failed > FETCH_FAILURE_BUDGET {
                    warn!(
                        "Fetch failure budget exhausted after {} failures, abandoning {} remaining message(s)",
                        batch.failed,
                        hits.len() - index - 1
                    );
                    batch.aborted = true;
                    progress.finish();
                    return batch;
                }
            }
        }
        progress.advance();
    }

    progress.finish();
    batch
}

/// Full fetch, degrading to a headers-only parse when the message source
/// cannot be retrieved or parsed.
async fn fetch_one<B: MailBackend>(
    backend: &mut B,
    hit: &MessageHit,
) -> Result<MessageRecord, MailError> {
    match backend.fetch_message(&hit.folder, hit.uid).await {
        Ok(raw) => match parse::parse_message(&raw, &hit.folder, hit.uid) {
            Ok(record) => return Ok(record),
            Err(e) => debug!("Full parse failed for {}, degrading to headers: {}", hit.uid, e),
        },
        Err(e) => debug!("Full fetch failed for {}, degrading to headers: {}", hit.uid, e),
    }

    let raw = backend.fetch_headers(&hit.folder, hit.uid).await?;
    Ok(parse::parse_header_block(&raw, &hit.folder, hit.uid))
}

#[cfg(test)]
mod tests {
    use super::super::backend::testing::{raw_message, FakeBackend};
    use super::*;
    use mailscope_core::progress::{NullProgress, RecordingProgress};

    fn hits(folder: &str, uids: &[u32]) -> Vec<MessageHit> {
        uids.iter().map(|&u| MessageHit::new(folder, u)).collect()
    }

    fn seeded(uids: &[u32]) -> FakeBackend {
        let mut backend = FakeBackend::new();
        for &uid in uids {
            backend.put(
                "INBOX",
                uid,
                raw_message(
                    "alice@example.com",
                    "me@example.com",
                    &format!("Message {}", uid),
                    "hello",
                ),
            );
        }
        backend
    }

    #[async_std::test]
    async fn output_order_follows_input_order() {
        let mut backend = seeded(&[1, 2, 3]);
        let input = hits("INBOX", &[3, 1, 2]);

        let batch = fetch_details(&mut backend, &input, None, &mut NullProgress).await;
        let uids: Vec<u32> = batch.records.iter().map(|r| r.uid).collect();
        assert_eq!(uids, vec![3, 1, 2]);
        assert_eq!(batch.failed, 0);
        assert!(!batch.aborted);
    }

    #[async_std::test]
    async fn failed_messages_are_skipped_and_counted() {
        let mut backend = seeded(&[1, 2, 3]);
        backend.fail_fetch.insert(2);
        backend.fail_headers.insert(2);

        let batch =
            fetch_details(&mut backend, &hits("INBOX", &[1, 2, 3]), None, &mut NullProgress).await;
        let uids: Vec<u32> = batch.records.iter().map(|r| r.uid).collect();
        assert_eq!(uids, vec![1, 3]);
        assert_eq!(batch.failed, 1);
        assert!(!batch.aborted);
    }

    #[async_std::test]
    async fn full_fetch_failure_degrades_to_headers_only() {
        let mut backend = seeded(&[5]);
        backend.fail_fetch.insert(5);

        let batch =
            fetch_details(&mut backend, &hits("INBOX", &[5]), None, &mut NullProgress).await;
        assert_eq!(batch.records.len(), 1);
        let record = &batch.records[0];
        assert_eq!(record.subject, "Message 5");
        assert_eq!(record.from.address, "alice@example.com");
        // The degraded path never has a body.
        assert_eq!(record.body, parse::NO_BODY);
        assert_eq!(batch.failed, 0);
    }

    #[async_std::test]
    async fn batch_aborts_once_failures_exceed_the_budget() {
        let mut backend = FakeBackend::new();
        let input = hits("INBOX", &(1..=10).collect::<Vec<u32>>());
        for uid in 1..=10 {
            backend.fail_fetch.insert(uid);
            backend.fail_headers.insert(uid);
        }

        let batch = fetch_details(&mut backend, &input, None, &mut NullProgress).await;
        assert!(batch.records.is_empty());
        assert_eq!(batch.failed, FETCH_FAILURE_BUDGET + 1);
        assert!(batch.aborted);
        // Messages 7..=10 were never attempted.
        assert!(!backend.calls.iter().any(|c| c.ends_with("/7")));
    }

    #[async_std::test]
    async fn limit_truncation_keeps_the_tail() {
        let mut backend = seeded(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let input = hits("INBOX", &[1, 2, 3, 4, 5, 6, 7, 8]);

        let batch = fetch_details(&mut backend, &input, Some(3), &mut NullProgress).await;
        let uids: Vec<u32> = batch.records.iter().map(|r| r.uid).collect();
        assert_eq!(uids, vec![6, 7, 8]);
    }

    #[async_std::test]
    async fn progress_sink_sees_the_truncated_total_and_each_advance() {
        let mut backend = seeded(&[1, 2, 3, 4]);
        let input = hits("INBOX", &[1, 2, 3, 4]);
        let mut sink = RecordingProgress::default();

        let batch = fetch_details(&mut backend, &input, Some(2), &mut sink).await;
        assert_eq!(batch.records.len(), 2);
        assert_eq!(sink.begun, vec![2]);
        assert_eq!(sink.advanced, 2);
        assert_eq!(sink.finished, 1);
    }
}
