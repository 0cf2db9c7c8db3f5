//! Formatting of variable assignment text for inserts and replacements.

use crate::parser::Assignment;
use crate::planner::UpdateRequest;
use crate::scan::{has_whitespace, is_blank};

/// Render the assignment text for an update.
///
/// When an original occurrence exists its prefix and suffix bytes are
/// preserved verbatim; otherwise the prefix is built from the request.
/// Quoting reuses the original quote character when the occurrence was
/// quoted, and otherwise quotes only values containing whitespace.
pub fn format_var(
    update: &UpdateRequest,
    orig: Option<&Assignment>,
    ensure_newline: bool,
    default_quote: char,
) -> String {
    let (prefix, mut suffix) = match orig {
        Some(orig) => (orig.prefix.clone(), orig.suffix.clone()),
        None => {
            let mut prefix =
                String::with_capacity(update.prefix.len() + update.key.len() + 1);
            prefix.push_str(&update.prefix);
            prefix.push_str(&update.key);
            prefix.push('=');
            (prefix, String::new())
        }
    };

    let quote = match orig {
        Some(orig) if orig.quote.is_some() => orig.quote,
        _ if has_whitespace(&update.value) => Some(default_quote),
        _ => None,
    };

    let value = match quote {
        Some(q) => quote_value(&update.value, q),
        None => update.value.clone(),
    };

    if is_blank(&suffix) && !update.inline_comment.is_empty() {
        suffix = format!(" # {}", update.inline_comment);
    }

    if ensure_newline && !suffix.ends_with('\n') {
        suffix.push('\n');
    }

    let mut out = String::with_capacity(prefix.len() + value.len() + suffix.len());
    out.push_str(&prefix);
    out.push_str(&value);
    out.push_str(&suffix);
    out
}

/// Wrap a value in quotes, escaping embedded backslashes and the quote
/// character itself.
fn quote_value(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        if c == quote || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}
