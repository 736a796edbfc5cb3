//! Post-processing: deterministic cleanup of converter-generated Markdown.
//!
//! The format readers concentrate on *what* to extract; layout quirks are
//! fixed here in one place. Each rule is a pure `&str → String` pass and is
//! tested on its own.
//!
//! ## Rule Order
//!
//! Line endings are normalised before anything inspects lines, invisible
//! characters go before whitespace trimming (a trailing zero-width space
//! would otherwise hide trailing blanks), and the final-newline pass runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to converter output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
/// 3. Trim trailing whitespace per line (hard breaks and code fences kept)
/// 4. Collapse runs of blank lines down to one (outside code fences)
/// 5. Ensure heading lines have a blank line before them (outside code fences)
/// 6. Insert a missing GFM separator row after a table header
/// 7. Ensure the text ends with exactly one newline (empty stays empty)
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = normalise_heading_spacing(&s);
    let s = fix_table_headers(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

/// Lines inside fenced code blocks are left untouched. Outside them, two or
/// more trailing spaces before a non-blank line are a hard line break and
/// are kept as exactly two.
fn trim_trailing_whitespace(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut result: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_fence = false;

    for (i, line) in lines.iter().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            result.push(line.trim_end().to_string());
            continue;
        }
        if in_fence {
            result.push(line.to_string());
            continue;
        }
        let trimmed = line.trim_end();
        let next_has_text = lines.get(i + 1).is_some_and(|next| !next.trim().is_empty());
        if !trimmed.is_empty() && line.ends_with("  ") && next_has_text {
            result.push(format!("{trimmed}  "));
        } else {
            result.push(trimmed.to_string());
        }
    }

    result.join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

/// At most one blank line in a row, except inside fenced code blocks.
fn collapse_blank_lines(input: &str) -> String {
    let mut result: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut prev_blank = false;

    for line in input.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
        }
        let blank = line.trim().is_empty();
        if !in_fence && blank && prev_blank {
            continue;
        }
        prev_blank = blank && !in_fence;
        result.push(line);
    }

    result.join("\n")
}

// ── Rule 5: Normalise heading spacing ────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+\S").unwrap());

fn normalise_heading_spacing(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 64);
    let mut in_fence = false;
    for (i, line) in input.lines().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
        }
        if !in_fence && i > 0 && RE_HEADING.is_match(line) {
            let trimmed = result.trim_end_matches('\n');
            result.truncate(trimmed.len());
            result.push_str("\n\n");
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}

fn is_fence(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("```") || line.starts_with("~~~")
}

// ── Rule 6: Fix table headers missing a separator row ────────────────────────

/// A table block starts at a table row that does not follow another table
/// row. When its second line is not a separator, one is inserted.
fn fix_table_headers(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut result: Vec<String> = Vec::with_capacity(lines.len() + 4);
    let mut prev_is_table = false;

    for (i, line) in lines.iter().enumerate() {
        result.push(line.to_string());
        let is_table = is_table_row(line);
        if is_table && !prev_is_table && !is_separator_row(line) {
            let next = lines.get(i + 1).copied().unwrap_or("");
            if is_table_row(next) && !is_separator_row(next) {
                let col_count = line.trim().matches('|').count().saturating_sub(1).max(1);
                let sep: String = std::iter::once("|")
                    .chain(std::iter::repeat_n(" --- |", col_count))
                    .collect();
                result.push(sep);
            }
        }
        prev_is_table = is_table;
    }

    result.join("\n")
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 2
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') {
        return false;
    }
    trimmed
        .chars()
        .all(|c| c == '|' || c == '-' || c == ':' || c == ' ')
}

// ── Rule 7: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
