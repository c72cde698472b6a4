use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as CmarkParser, Tag, TagEnd};

/// A piece of a text block after cell-magic promotion.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Markdown(String),
    /// Body of a fenced code block starting with `%%`.
    Magic(String),
}

/// Cut `markdown` around fenced code blocks whose body starts with `%%`.
///
/// Without any such block the whole input comes back as one Markdown segment.
/// Otherwise whitespace-only Markdown between the blocks is dropped.
pub fn split_cell_magic(markdown: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut promoted = false;

    let mut events = CmarkParser::new_ext(markdown, Options::empty()).into_offset_iter();
    while let Some((event, range)) = events.next() {
        let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) = event else {
            continue;
        };

        let mut body = String::new();
        for (inner, _) in events.by_ref() {
            match inner {
                Event::Text(text) => body.push_str(&text),
                Event::End(TagEnd::CodeBlock) => break,
                _ => {}
            }
        }
        if !body.starts_with("%%") {
            continue;
        }

        let before = &markdown[cursor..range.start];
        if !before.trim().is_empty() {
            segments.push(Segment::Markdown(before.to_string()));
        }
        segments.push(Segment::Magic(body));
        cursor = range.end;
        promoted = true;
    }

    if !promoted {
        return vec![Segment::Markdown(markdown.to_string())];
    }

    let rest = &markdown[cursor..];
    if !rest.trim().is_empty() {
        segments.push(Segment::Markdown(rest.to_string()));
    }
    segments
}
