//! Message parsing on top of `mailparse`: full RFC 822 parses for the happy
//! path and a tolerant manual header-block parser for the degraded
//! headers-only path.

use std::collections::HashMap;

use mailparse::ParsedMail;

use crate::error::MailError;
use crate::types::{EmailAddress, MessageRecord};

/// Body previews are capped at this many characters.
pub const BODY_PREVIEW_LIMIT: usize = 2000;

/// Leaf parts scanned per message before giving up on a body.
pub const MAX_BODY_PARTS: usize = 10;

pub const UNKNOWN_FIELD: &str = "Unknown";
pub const NO_SUBJECT: &str = "No Subject";
pub const NO_BODY: &str = "(no readable body)";

/// Parse a complete RFC 822 message into a record.
pub fn parse_message(raw: &[u8], folder: &str, uid: u32) -> Result<MessageRecord, MailError> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| MailError::Fetch {
        uid,
        message: format!("message parse failed: {}", e),
    })?;

    let headers = &parsed.headers;
    let get_header = |name: &str| -> Option<String> {
        headers
            .iter()
            .find(|h| h.get_key().eq_ignore_ascii_case(name))
            .map(|h| h.get_value())
    };

    Ok(MessageRecord {
        uid,
        folder: folder.to_string(),
        from: parse_address(get_header("From").as_deref().unwrap_or_default()),
        to: parse_address_list(get_header("To").as_deref().unwrap_or_default()),
        cc: parse_address_list(get_header("Cc").as_deref().unwrap_or_default()),
        subject: get_header("Subject").unwrap_or_else(|| NO_SUBJECT.to_string()),
        date: get_header("Date").unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        body: extract_body(&parsed),
    })
}

/// Degraded parse of a raw header block, used when the full-message fetch
/// failed. Tolerates arbitrary key casing, folded continuation lines, and a
/// missing trailing newline; absent fields get explicit placeholders.
pub fn parse_header_block(raw: &[u8], folder: &str, uid: u32) -> MessageRecord {
    let text = String::from_utf8_lossy(raw);
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            // Folded continuation of the previous field.
            if let Some(key) = &current {
                if let Some(value) = fields.get_mut(key) {
                    value.push(' ');
                    value.push_str(line.trim());
                }
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_ascii_lowercase();
            fields.insert(key.clone(), value.trim().to_string());
            current = Some(key);
        }
    }

    let from = fields
        .get("from")
        .map(|v| parse_address(&decode_encoded_words(v)))
        .unwrap_or_default();
    let to = fields
        .get("to")
        .map(|v| parse_address_list(v))
        .unwrap_or_default();
    let cc = fields
        .get("cc")
        .map(|v| parse_address_list(v))
        .unwrap_or_default();
    let subject = fields
        .get("subject")
        .map(|v| decode_encoded_words(v))
        .unwrap_or_else(|| NO_SUBJECT.to_string());
    let date = fields
        .get("date")
        .cloned()
        .unwrap_or_else(|| UNKNOWN_FIELD.to_string());

    MessageRecord {
        uid,
        folder: folder.to_string(),
        from,
        to,
        cc,
        subject,
        date,
        body: NO_BODY.to_string(),
    }
}

/// Best-effort plain-text body: scan up to [`MAX_BODY_PARTS`] leaf parts,
/// preferring `text/plain` and falling back to `text/html`. Decode failures
/// yield the placeholder, never an error.
pub fn extract_body(parsed: &ParsedMail<'_>) -> String {
    let mut plain: Option<String> = None;
    let mut html: Option<String> = None;
    let mut scanned = 0usize;
    collect_text_parts(parsed, &mut plain, &mut html, &mut scanned);

    let text = plain
        .or(html)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| NO_BODY.to_string());
    truncate_chars(&text, BODY_PREVIEW_LIMIT)
}

fn collect_text_parts(
    part: &ParsedMail<'_>,
    plain: &mut Option<String>,
    html: &mut Option<String>,
    scanned: &mut usize,
) {
    if plain.is_some() || *scanned >= MAX_BODY_PARTS {
        return;
    }

    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_text_parts(sub, plain, html, scanned);
            if plain.is_some() || *scanned >= MAX_BODY_PARTS {
                return;
            }
        }
        return;
    }

    *scanned += 1;
    let content_type = part.ctype.mimetype.to_lowercase();
    if content_type == "text/plain" && plain.is_none() {
        *plain = part.get_body().ok();
    } else if content_type == "text/html" && html.is_none() {
        *html = part.get_body().ok();
    }
}

/// Decode RFC 2047 encoded-words (e.g. `=?utf-8?Q?...?=`) in a header value.
/// Falls back to the input if decoding fails.
pub fn decode_encoded_words(raw: &str) -> String {
    // Fast path: no encoded-word marker present.
    if !raw.contains("=?") {
        return raw.to_string();
    }
    // Build a synthetic header so mailparse can decode it.
    let fake_header = format!("X: {}", raw);
    match mailparse::parse_header(fake_header.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(_) => raw.to_string(),
    }
}

/// Parse the first address of a header value, defaulting to the `Unknown`
/// placeholder when the value is blank or unparseable beyond repair.
pub fn parse_address(value: &str) -> EmailAddress {
    if value.trim().is_empty() {
        return EmailAddress::default();
    }
    match mailparse::addrparse(value) {
        Ok(addrs) => addrs
            .iter()
            .next()
            .map(|a| match a {
                mailparse::MailAddr::Single(info) => EmailAddress {
                    name: info.display_name.clone(),
                    address: info.addr.clone(),
                },
                mailparse::MailAddr::Group(group) => group
                    .addrs
                    .first()
                    .map(|info| EmailAddress {
                        name: info.display_name.clone(),
                        address: info.addr.clone(),
                    })
                    .unwrap_or_default(),
            })
            .unwrap_or_default(),
        Err(_) => EmailAddress {
            name: None,
            address: value.trim().to_string(),
        },
    }
}

/// Parse every address of a header value; blank values yield an empty list.
pub fn parse_address_list(value: &str) -> Vec<EmailAddress> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    match mailparse::addrparse(value) {
        Ok(addrs) => addrs
            .iter()
            .flat_map(|a| match a {
                mailparse::MailAddr::Single(info) => vec![EmailAddress {
                    name: info.display_name.clone(),
                    address: info.addr.clone(),
                }],
                mailparse::MailAddr::Group(group) => group
                    .addrs
                    .iter()
                    .map(|info| EmailAddress {
                        name: info.display_name.clone(),
                        address: info.addr.clone(),
                    })
                    .collect(),
            })
            .collect(),
        Err(_) => vec![EmailAddress {
            name: None,
            address: value.trim().to_string(),
        }],
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = b"From: Alice <alice@example.com>\r\n\
To: bob@example.com\r\n\
Cc: carol@example.com, Dave <dave@example.com>\r\n\
Subject: Project Update\r\n\
Date: Mon, 6 May 2024 10:15:00 +0000\r\n\
\r\n\
Status is green.\r\n";

    #[test]
    fn full_parse_fills_every_field() {
        let record = parse_message(SIMPLE, "INBOX", 2).unwrap();
        assert_eq!(record.uid, 2);
        assert_eq!(record.folder, "INBOX");
        assert_eq!(record.from.address, "alice@example.com");
        assert_eq!(record.from.name.as_deref(), Some("Alice"));
        assert_eq!(record.to.len(), 1);
        assert_eq!(record.cc.len(), 2);
        assert_eq!(record.cc[1].address, "dave@example.com");
        assert_eq!(record.subject, "Project Update");
        assert!(record.date.starts_with("Mon, 6 May 2024"));
        assert!(record.body.contains("Status is green."));
    }

    #[test]
    fn missing_headers_get_placeholders() {
        let record = parse_message(b"X-Other: 1\r\n\r\nhello\r\n", "INBOX", 9).unwrap();
        assert_eq!(record.subject, NO_SUBJECT);
        assert_eq!(record.date, UNKNOWN_FIELD);
        assert_eq!(record.from.address, "unknown@unknown.com");
        assert!(record.to.is_empty());
        assert!(record.cc.is_empty());
    }

    #[test]
    fn multipart_prefers_plain_text_over_html() {
        let raw = b"From: a@b.c\r\n\
Subject: mixed\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"xyz\"\r\n\
\r\n\
--xyz\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>rich</p>\r\n\
--xyz\r\n\
Content-Type: text/plain\r\n\
\r\n\
plain wins\r\n\
--xyz--\r\n";
        let record = parse_message(raw, "INBOX", 1).unwrap();
        assert!(record.body.contains("plain wins"));
        assert!(!record.body.contains("<p>"));
    }

    #[test]
    fn html_is_the_fallback_when_no_plain_part_exists() {
        let raw = b"From: a@b.c\r\n\
Content-Type: multipart/alternative; boundary=\"xyz\"\r\n\
\r\n\
--xyz\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>only html</p>\r\n\
--xyz--\r\n";
        let record = parse_message(raw, "INBOX", 1).unwrap();
        assert!(record.body.contains("only html"));
    }

    #[test]
    fn unreadable_bodies_become_a_placeholder() {
        let raw = b"From: a@b.c\r\n\
Content-Type: application/octet-stream\r\n\
\r\n\
\x00\x01\x02\r\n";
        let record = parse_message(raw, "INBOX", 1).unwrap();
        assert_eq!(record.body, NO_BODY);
    }

    #[test]
    fn body_preview_is_capped() {
        let mut raw = b"From: a@b.c\r\nSubject: big\r\n\r\n".to_vec();
        raw.extend(std::iter::repeat(b'x').take(BODY_PREVIEW_LIMIT * 2));
        let record = parse_message(&raw, "INBOX", 1).unwrap();
        assert_eq!(record.body.chars().count(), BODY_PREVIEW_LIMIT);
    }

    #[test]
    fn header_block_parse_tolerates_casing_and_missing_newline() {
        // Non-standard casing, folded subject, no trailing newline.
        let raw = b"FROM: Alice <alice@example.com>\r\n\
subject: Quarterly\r\n numbers\r\n\
DATE: Tue, 7 May 2024 09:00:00 +0000";
        let record = parse_header_block(raw, "Archive", 7);
        assert_eq!(record.uid, 7);
        assert_eq!(record.folder, "Archive");
        assert_eq!(record.from.address, "alice@example.com");
        assert_eq!(record.subject, "Quarterly numbers");
        assert!(record.date.contains("2024"));
        assert_eq!(record.body, NO_BODY);
    }

    #[test]
    fn header_block_parse_fills_placeholders_for_absent_fields() {
        let record = parse_header_block(b"X-Nothing: here\r\n", "INBOX", 3);
        assert_eq!(record.subject, NO_SUBJECT);
        assert_eq!(record.date, UNKNOWN_FIELD);
        assert_eq!(record.from.address, "unknown@unknown.com");
    }

    #[test]
    fn encoded_words_decode_in_the_degraded_path() {
        let raw = b"Subject: =?utf-8?Q?Caf=C3=A9_menu?=\r\nFrom: a@b.c\r\n";
        let record = parse_header_block(raw, "INBOX", 1);
        assert_eq!(record.subject, "Caf\u{e9} menu");
    }

    #[test]
    fn bare_addresses_parse_without_a_display_name() {
        let addr = parse_address("alice@example.com");
        assert_eq!(addr.address, "alice@example.com");
        assert!(parse_address("   ").address.contains("unknown"));
        assert!(parse_address_list("").is_empty());
    }
}
