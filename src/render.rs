use crate::config::MessageFormat;

/// Characters Telegram MarkdownV2 requires to be escaped outside entities.
pub const MARKDOWN_V2_RESERVED: [char; 18] = [
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

fn is_reserved(c: char) -> bool {
    MARKDOWN_V2_RESERVED.contains(&c)
}

/// Backslash-escape every reserved character. A reserved character that is
/// already preceded by a backslash is kept as-is, so escaping twice is the
/// same as escaping once.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(c);
            if let Some(&next) = chars.peek() {
                if is_reserved(next) {
                    out.push(next);
                    chars.next();
                }
            }
            continue;
        }
        if is_reserved(c) {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

const MARKDOWN_HEADER: &str = "🚨 *Upptime Alert*\n\n*Site:* ";
const MARKDOWN_FIELD: &str = "\n*Message:* ";
const PLAIN_HEADER: &str = "🚨 Upptime Alert\n\nSite: ";
const PLAIN_FIELD: &str = "\nMessage: ";
// No reserved characters, so valid in either format.
const FALLBACK: &str = "🚨 Upptime Alert";

/// Smallest limit that leaves room for the template and a usable message.
pub const MIN_MESSAGE_LEN: usize = 64;

/// Cut already-formatted text to `max_chars`. In MarkdownV2 a cut can leave
/// a lone trailing backslash, which Telegram rejects, so it is dropped.
fn fit(text: &str, max_chars: usize, format: MessageFormat) -> String {
    let mut out = truncate_chars(text, max_chars).to_string();
    if format == MessageFormat::MarkdownV2 {
        let trailing = out.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            out.pop();
        }
    }
    out
}

/// Build the outgoing notification text, at most `max_chars` long. The
/// template is never cut: the site label and then the message shrink to fit
/// the space it leaves.
pub fn render(format: MessageFormat, site: &str, message: &str, max_chars: usize) -> String {
    let message = truncate_chars(message, max_chars);

    let (header, field, site, message) = match format {
        MessageFormat::MarkdownV2 => (
            MARKDOWN_HEADER,
            MARKDOWN_FIELD,
            escape_markdown_v2(site),
            escape_markdown_v2(message),
        ),
        MessageFormat::Plain => (PLAIN_HEADER, PLAIN_FIELD, site.to_string(), message.to_string()),
    };

    let frame = header.chars().count() + field.chars().count();
    let Some(budget) = max_chars.checked_sub(frame) else {
        return truncate_chars(FALLBACK, max_chars).to_string();
    };

    let site = fit(&site, budget, format);
    let message = fit(&message, budget - site.chars().count(), format);

    format!("{header}{site}{field}{message}")
}
