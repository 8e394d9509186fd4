use serde::Serialize;

/// Heuristic classification of a mailbox folder. Used only to order search
/// candidates, never for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FolderKind {
    Inbox,
    SentLike,
    Other,
}

/// Lowercase substrings that mark a folder as holding outgoing mail.
/// Non-exhaustive — extend as servers show up with new spellings.
pub const SENT_FOLDER_MARKERS: &[&str] = &[
    "sent", "enviado", "envoy", "gesendet", "wyslane", "verzonden", "skickat",
];

#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub name: String,
    pub kind: FolderKind,
}

impl Folder {
    /// Classify `name` against the default marker table.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = classify(&name, SENT_FOLDER_MARKERS);
        Self { name, kind }
    }

    /// The default folder every account is assumed to have.
    pub fn inbox() -> Self {
        Self::new("INBOX")
    }

    pub fn is_sent_like(&self) -> bool {
        self.kind == FolderKind::SentLike
    }
}

/// Classify a folder name against a caller-supplied marker table.
pub fn classify(name: &str, sent_markers: &[&str]) -> FolderKind {
    let lower = name.to_lowercase();
    if lower == "inbox" {
        return FolderKind::Inbox;
    }
    if sent_markers.iter().any(|m| lower.contains(m)) {
        return FolderKind::SentLike;
    }
    FolderKind::Other
}

/// Strip the surrounding quotes some servers leave on mailbox names.
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Extract the mailbox name from a raw LIST response line.
///
/// Servers disagree on the shape of the name field: it may be a quoted
/// string or the whitespace-joined tail after the delimiter field. Returns
/// `None` for lines with no recognizable name.
pub fn name_from_list_line(line: &str) -> Option<String> {
    let rest = line.trim();
    if rest.is_empty() {
        return None;
    }

    // Quoted name field: content of the trailing quote pair.
    if rest.ends_with('"') && rest.len() >= 2 {
        if let Some(open) = rest[..rest.len() - 1].rfind('"') {
            let name = &rest[open + 1..rest.len() - 1];
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    // Whitespace-joined form: drop the attribute group and the delimiter
    // field, keep the remaining tokens verbatim.
    let after_attrs = match rest.find(')') {
        Some(i) => rest[i + 1..].trim_start(),
        None => rest,
    };
    let mut tokens = after_attrs.splitn(2, char::is_whitespace);
    let _delimiter = tokens.next()?;
    let name = tokens.next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(normalize_name(name))
    }
}

/// Short display segment after the last hierarchy delimiter.
pub fn short_name<'a>(name: &'a str, delimiter: Option<&str>) -> &'a str {
    match delimiter {
        Some(d) if !d.is_empty() => name.rsplit(d).next().unwrap_or(name),
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_and_sent_variants_classify() {
        assert_eq!(classify("INBOX", SENT_FOLDER_MARKERS), FolderKind::Inbox);
        assert_eq!(classify("inbox", SENT_FOLDER_MARKERS), FolderKind::Inbox);
        for name in ["Sent", "[Gmail]/Sent Mail", "Enviados", "Wyslane", "Gesendet"] {
            assert_eq!(
                classify(name, SENT_FOLDER_MARKERS),
                FolderKind::SentLike,
                "{name} should be sent-like"
            );
        }
        assert_eq!(classify("Receipts", SENT_FOLDER_MARKERS), FolderKind::Other);
    }

    #[test]
    fn marker_table_is_configuration_not_control_flow() {
        assert_eq!(classify("Skutki", &["skutki"]), FolderKind::SentLike);
        assert_eq!(classify("Sent", &[]), FolderKind::Other);
    }

    #[test]
    fn quoted_list_lines_yield_the_quoted_name() {
        assert_eq!(
            name_from_list_line(r#"(\HasNoChildren) "/" "Sent Items""#),
            Some("Sent Items".to_string())
        );
        assert_eq!(
            name_from_list_line(r#"(\Noselect \HasChildren) "." "INBOX.Archive""#),
            Some("INBOX.Archive".to_string())
        );
    }

    #[test]
    fn unquoted_list_lines_join_the_trailing_tokens() {
        assert_eq!(
            name_from_list_line(r#"(\HasNoChildren) "/" Sent Items"#),
            Some("Sent Items".to_string())
        );
        assert_eq!(
            name_from_list_line("(\\HasNoChildren) . INBOX.Drafts"),
            Some("INBOX.Drafts".to_string())
        );
        assert_eq!(name_from_list_line(""), None);
    }

    #[test]
    fn normalize_strips_only_surrounding_quotes() {
        assert_eq!(normalize_name("\"Sent Items\""), "Sent Items");
        assert_eq!(normalize_name("INBOX"), "INBOX");
        assert_eq!(normalize_name("  \"A\"  "), "A");
    }

    #[test]
    fn short_name_takes_the_trailing_segment() {
        assert_eq!(short_name("INBOX.Work.2024", Some(".")), "2024");
        assert_eq!(short_name("Archive", Some("/")), "Archive");
        assert_eq!(short_name("A/B", None), "A/B");
    }
}
