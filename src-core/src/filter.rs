use chrono::NaiveDate;

use crate::error::MailError;

/// Results retained per search when the caller does not choose a limit.
pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// Optional predicates for a server-side search.
///
/// At least one predicate must be present before a query is issued; a fully
/// empty filter is rejected with [`MailError::EmptyFilter`] and no network
/// call is made. `limit` is not a predicate.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub subject: Option<String>,
    /// Inclusive lower bound (IMAP `SINCE`).
    pub since: Option<NaiveDate>,
    /// Exclusive upper bound (IMAP `BEFORE`).
    pub before: Option<NaiveDate>,
    pub limit: usize,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            cc: None,
            subject: None,
            since: None,
            before: None,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().map_or(false, |s| !s.trim().is_empty())
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no predicate is set. Blank strings do not count.
    pub fn is_empty(&self) -> bool {
        !present(&self.from)
            && !present(&self.to)
            && !present(&self.cc)
            && !present(&self.subject)
            && self.since.is_none()
            && self.before.is_none()
    }

    /// True when the sender address is the only predicate — the case the
    /// search executor treats as targeting outgoing mail.
    pub fn is_from_only(&self) -> bool {
        present(&self.from)
            && !present(&self.to)
            && !present(&self.cc)
            && !present(&self.subject)
            && self.since.is_none()
            && self.before.is_none()
    }

    /// Render the conjoined IMAP search criteria.
    pub fn build_query(&self) -> Result<String, MailError> {
        if self.is_empty() {
            return Err(MailError::EmptyFilter);
        }

        let mut parts: Vec<String> = Vec::new();
        for (keyword, field) in [
            ("FROM", &self.from),
            ("TO", &self.to),
            ("CC", &self.cc),
            ("SUBJECT", &self.subject),
        ] {
            if let Some(term) = field.as_deref() {
                let term = term.trim();
                if !term.is_empty() {
                    parts.push(format!("{} \"{}\"", keyword, term.replace('"', "\\\"")));
                }
            }
        }
        if let Some(d) = self.since {
            parts.push(format!("SINCE {}", d.format("%d-%b-%Y")));
        }
        if let Some(d) = self.before {
            parts.push(format!("BEFORE {}", d.format("%d-%b-%Y")));
        }

        Ok(parts.join(" "))
    }
}
