const FENCE: &str = "```";

/// Resolve `\n`, `\r`, `\t`, `\"` and `\\` escapes left over from a JSON
/// encoded reply. Unknown escapes are kept verbatim.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            _ => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }
    out
}

fn is_language_tag(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '#'))
}

/// Source text of the first fenced block of a reply, or `None` when the
/// reply has no complete fence or the block is empty.
pub fn extract_code(raw: &str) -> Option<String> {
    let text = unescape(raw);

    let start = text.find(FENCE)? + FENCE.len();
    let end = start + text[start..].find(FENCE)?;
    let mut block = &text[start..end];

    // first line is either empty or a language tag
    if let Some(newline) = block.find('\n') {
        let first = &block[..newline];
        if first.trim().is_empty() || is_language_tag(first) {
            block = &block[newline + 1..];
        }
    }

    let code = block.trim_end();
    if code.trim().is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}
