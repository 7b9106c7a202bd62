//! Light normalisation applied to comment text before classification.
//!
//! Case, emojis and emotional punctuation are kept; links, `@mentions` and
//! `#hashtags` are dropped and whitespace is compacted.

const LINK_PREFIXES: [&str; 2] = ["http", "www"];

pub fn clean_text(text: &str) -> String {
    let stripped = strip_tags(&strip_links(text));
    let mut out = String::with_capacity(stripped.len());
    for word in stripped.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    attach_punctuation(&out)
}

/// Removes `http…`/`www…` runs up to the next whitespace.
fn strip_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if let Some(prefix) = LINK_PREFIXES.iter().find(|prefix| rest.starts_with(*prefix)) {
            let tail = &rest[prefix.len()..];
            if tail.chars().next().is_some_and(|c| !c.is_whitespace()) {
                let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
                rest = &tail[end..];
                continue;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if matches!(ch, '@' | '#') && chars.peek().copied().is_some_and(is_word_char) {
            while chars.peek().copied().is_some_and(is_word_char) {
                chars.next();
            }
            continue;
        }
        out.push(ch);
    }
    out
}

fn attach_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '?' | '.' | '!' | ',') && out.ends_with(' ') {
            out.pop();
        }
        out.push(ch);
    }
    out
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
