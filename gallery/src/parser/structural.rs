use std::sync::LazyLock;

use regex::Regex;

use crate::block::Block;

// A header is a line of 20+ `#`, or a `# %%` cell marker. The `#` lines that
// directly follow it are the text block.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?P<header>^#{20,}.*|^# ?%%.*)\s(?P<text>(?:^#.*\s?)*)")
        .expect("separator pattern is valid")
});

/// Split the part of a script after its docstring into code and text blocks.
///
/// `offset` and `first_line` locate `source` inside the whole file.
pub fn split_blocks(source: &str, offset: usize, first_line: usize) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut line = first_line;
    let mut pos = 0;

    for caps in SEPARATOR.captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        let code = &source[pos..whole.start()];
        if !code.trim().is_empty() {
            blocks.push(Block::code(code, line, offset + pos..offset + whole.start()));
        }
        line += code.matches('\n').count();
        // The header line itself.
        line += 1;

        if let Some(text) = caps.name("text") {
            let content = dedent(&strip_comment_markers(text.as_str()));
            let content = content.trim_start();
            if !content.trim().is_empty() {
                blocks.push(Block::text(
                    content,
                    line,
                    offset + text.start()..offset + text.end(),
                ));
            }
            line += text.as_str().matches('\n').count();
        }

        pos = whole.end();
    }

    let remaining = &source[pos..];
    if !remaining.trim().is_empty() {
        blocks.push(Block::code(remaining, line, offset + pos..offset + source.len()));
    }

    blocks
}

/// Drop one leading `#` from every line.
fn strip_comment_markers(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| line.strip_prefix('#').unwrap_or(line))
        .collect()
}

/// Remove the indentation shared by all non-blank lines. Lines holding only
/// spaces and tabs are emptied first and do not count towards the margin.
pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text
        .split_inclusive('\n')
        .map(|line| {
            let body = line.trim_end_matches('\n');
            if !body.is_empty() && body.chars().all(|c| c == ' ' || c == '\t') {
                &line[body.len()..]
            } else {
                line
            }
        })
        .collect();

    let mut margin: Option<&str> = None;
    for line in &lines {
        let body = line.trim_end_matches('\n');
        if body.is_empty() {
            continue;
        }
        let indent = &body[..body.len() - body.trim_start_matches([' ', '\t']).len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }

    let margin = margin.unwrap_or("");
    lines
        .iter()
        .map(|line| line.strip_prefix(margin).unwrap_or(line))
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}
