use relay_core::{HistoryEntry, HistoryPage};

/// Cut `text` to `max` characters, marking the cut with "...".
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[must_use]
pub fn format_entry(entry: &HistoryEntry) -> String {
    match entry {
        HistoryEntry::Prompt(p) => format!("You: {}", truncate(&p.prompt, 100)),
        HistoryEntry::Response(r) => format!("Assistant: {}", truncate(&r.text, 100)),
    }
}

#[must_use]
pub fn format_history(page: &HistoryPage) -> String {
    let mut out = format!(
        "Message history (showing {} of {})\n",
        page.messages.len(),
        page.total
    );
    for entry in &page.messages {
        out.push_str(&format_entry(entry));
        out.push('\n');
    }
    out
}
