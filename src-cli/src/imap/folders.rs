use tracing::warn;

use mailscope_core::folder::{self, Folder};

use super::backend::MailBackend;

/// List and classify the account's folders, in server order.
///
/// Listing failure degrades to the lone INBOX fallback so a search can
/// always proceed against the default folder; this never errors.
pub async fn list_folders<B: MailBackend>(backend: &mut B) -> Vec<Folder> {
    let raw = match backend.list_folders().await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("LIST failed, falling back to INBOX only: {}", e);
            return vec![Folder::inbox()];
        }
    };

    let mut result: Vec<Folder> = Vec::new();
    for (_delimiter, name) in raw {
        // Servers vary: most hand back a clean name, some leave quoting in
        // place, and a raw descriptor line can slip through verbatim.
        let cleaned = if name.trim_start().starts_with('(') {
            folder::name_from_list_line(&name)
        } else {
            Some(folder::normalize_name(&name))
        };
        match cleaned {
            Some(n) if !n.is_empty() => result.push(Folder::new(n)),
            _ => warn!("Ignoring unparseable folder entry: {:?}", name),
        }
    }

    if result.is_empty() {
        result.push(Folder::inbox());
    }
    result
}
