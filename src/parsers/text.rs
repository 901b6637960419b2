/// Options for normalizing converted page text
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOptions {
    /// Keep paragraph structure (exactly one empty line between paragraphs)
    pub preserve_paragraphs: bool,
    /// Keep single newlines within paragraphs
    pub preserve_line_breaks: bool,
}

/// Normalizes whitespace in text
///
/// Lines are trimmed, runs of spaces collapse to one, and runs of blank
/// lines collapse to a single paragraph break (or disappear entirely when
/// paragraphs are not preserved).
pub fn normalize(text: &str, options: &TextOptions) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let paragraphs = split_into_paragraphs(text);
    let separator = if options.preserve_line_breaks { "\n" } else { " " };

    let joined: Vec<String> = paragraphs
        .iter()
        .map(|para| {
            para.iter()
                .map(|line| collapse_spaces(line))
                .collect::<Vec<_>>()
                .join(separator)
        })
        .collect();

    if options.preserve_paragraphs {
        joined.join("\n\n")
    } else {
        collapse_spaces(&joined.join(" "))
    }
}

/// Splits text into paragraphs of trimmed, non-empty lines
pub fn split_into_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(trimmed);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Truncates to at most `max_chars` characters, on a character boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn collapse_spaces(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}
