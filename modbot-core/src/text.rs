//! Text helpers: splitting long texts to fit the message length limit, indentation trimming
//! and markdown escaping.

/// Maximum length of one Telegram text message, in chars.
pub const TEXT_LENGTH_LIMIT: usize = 4096;

/// Size of the pieces a single over-long line is cut into.
const HARD_CUT_LEN: usize = 1000;

const CODE_FENCE: &str = "```";

/// Splits `text` into parts that each fit into one message.
///
/// A fenced code block is kept in a part of its own when possible, so the fence markers are not
/// torn apart. When the block spans the whole text it is cut like ordinary lines.
pub fn longtext_split(text: &str) -> Vec<String> {
    if text.chars().count() < TEXT_LENGTH_LIMIT {
        return vec![text.to_string()];
    }
    let lines: Vec<&str> = text.split('\n').collect();

    let mut fence_start = None;
    let mut fence_end = None;
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with(CODE_FENCE) {
            if fence_start.is_none() {
                fence_start = Some(i);
            } else {
                fence_end = Some(i);
                break;
            }
        }
    }

    let (start, end) = match (fence_start, fence_end) {
        (Some(s), Some(e)) => (s, e),
        _ => return force_longtext_split(&lines),
    };
    if start == 0 && end == lines.len() - 1 {
        return force_longtext_split(&lines);
    }

    let mut parts = Vec::new();
    let before = &lines[..start];
    let block = &lines[start..=end];
    let after = &lines[end + 1..];
    if !before.is_empty() {
        parts.extend(force_longtext_split(before));
    }
    parts.extend(longtext_split(&block.join("\n")));
    if !after.is_empty() {
        parts.extend(longtext_split(&after.join("\n")));
    }
    parts
}

/// Greedily packs `lines` (joined by `\n`) into parts below [`TEXT_LENGTH_LIMIT`].
/// A line that alone does not fit is cut into pieces of 1000 chars.
pub fn force_longtext_split(lines: &[&str]) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for line in lines {
        let mut line = (*line).to_string();
        loop {
            let line_len = line.chars().count();
            let sep = usize::from(!current.is_empty());
            if current_len + line_len + sep < TEXT_LENGTH_LIMIT {
                current_len += line_len + sep;
                current.push(line);
                break;
            }
            if current.is_empty() {
                let cut = byte_offset_of_char(&line, HARD_CUT_LEN);
                let rest = line.split_off(cut);
                parts.push(line);
                line = rest;
            } else {
                parts.push(current.join("\n"));
                current.clear();
                current_len = 0;
            }
        }
    }
    if !current.is_empty() {
        parts.push(current.join("\n"));
    }
    parts
}

fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Removes the indentation (leading spaces) shared by all non-blank lines.
/// Blank lines become empty.
pub fn trim_spaces_before_line(code: &str) -> String {
    let lines: Vec<&str> = code.split('\n').collect();
    let common = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min();
    match common {
        None | Some(0) => code.to_string(),
        Some(common) => lines
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    ""
                } else {
                    &line[common..]
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Escapes the characters special to Telegram's legacy Markdown.
pub fn markdown_escape(s: &str) -> String {
    escape_chars(s, &['`', '*', '_', '['])
}

/// Escapes the characters special to Telegram's MarkdownV2.
pub fn markdown_v2_escape(s: &str) -> String {
    escape_chars(
        s,
        &[
            '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.',
            '!',
        ],
    )
}

fn escape_chars(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
