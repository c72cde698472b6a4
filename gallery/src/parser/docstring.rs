use std::iter::Peekable;
use std::ops::Range;
use std::str::Chars;

use crate::parser::error::ParseError;

/// The module docstring of a script and where the remaining source begins.
#[derive(Debug, Clone, PartialEq)]
pub struct Docstring {
    /// The literal's value with escape sequences decoded.
    pub value: String,
    /// Byte span of the whole literal, prefix and quotes included.
    pub span: Range<usize>,
    /// Byte offset of the first line after the one that closes the literal.
    pub rest_offset: usize,
    /// 1-based line number of `rest_offset`.
    pub rest_line: usize,
}

/// Locate the module docstring: the first statement, if it is a string literal.
///
/// Blank lines and `#` comments before it are skipped. Returns `Ok(None)` when
/// the first statement is anything else.
pub fn find_docstring(source: &str, file_id: usize) -> Result<Option<Docstring>, ParseError> {
    let Some(start) = first_statement_offset(source) else {
        return Ok(None);
    };

    let stmt = &source[start..];
    let prefix_len = stmt
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    let prefix = stmt[..prefix_len].to_ascii_lowercase();
    let raw = match prefix.as_str() {
        "" | "u" => false,
        "r" => true,
        _ => return Ok(None),
    };

    let quote_start = start + prefix_len;
    let quote = match source[quote_start..].chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return Ok(None),
    };
    let triple: String = std::iter::repeat_n(quote, 3).collect();
    let closing = if source[quote_start..].starts_with(&triple) {
        triple.as_str()
    } else {
        &triple[..1]
    };
    let body_start = quote_start + closing.len();

    let (body_end, close_end) = scan_literal(source, body_start, closing).ok_or_else(|| {
        ParseError::error("unterminated docstring literal", start..source.len(), file_id)
            .with_label("string starts here")
            .with_note("the first statement of a gallery script is read as its docstring")
    })?;

    let body = &source[body_start..body_end];
    let value = if raw {
        body.to_string()
    } else {
        decode_escapes(body)
    };

    let closing_line = source[..close_end].matches('\n').count() + 1;
    let rest_offset = match source[close_end..].find('\n') {
        Some(nl) => close_end + nl + 1,
        None => source.len(),
    };

    Ok(Some(Docstring {
        value,
        span: start..close_end,
        rest_offset,
        rest_line: closing_line + 1,
    }))
}

/// Byte offset of the first non-blank, non-comment character in the source.
fn first_statement_offset(source: &str) -> Option<usize> {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim_start_matches([' ', '\t', '\x0c']);
        let content = trimmed.trim_end_matches(['\n', '\r']);
        if !content.is_empty() && !content.starts_with('#') {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Find the closing quote. Returns (end of body, end of closing quote).
/// `None` means the literal never closes; a single-quoted literal may not
/// span lines.
fn scan_literal(source: &str, body_start: usize, closing: &str) -> Option<(usize, usize)> {
    let single_line = closing.len() == 1;
    let mut iter = source[body_start..].char_indices();
    while let Some((i, c)) = iter.next() {
        let at = body_start + i;
        match c {
            '\\' => {
                iter.next();
            }
            '\n' if single_line => return None,
            _ if source[at..].starts_with(closing) => return Some((at, at + closing.len())),
            _ => {}
        }
    }
    None
}

/// Decode Python string escapes. `\N{...}` and unknown escapes stay verbatim.
pub fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(&next) = chars.peek() else {
            out.push('\\');
            break;
        };
        let decoded = match next {
            '\n' => {
                chars.next();
                continue;
            }
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'f' => Some('\x0c'),
            'v' => Some('\x0b'),
            '0'..='7' => {
                let mut value = 0u32;
                let mut taken = 0;
                while taken < 3 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                            taken += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
                continue;
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut lookahead = chars.clone();
                lookahead.next();
                match take_hex(&mut lookahead, width).and_then(char::from_u32) {
                    Some(ch) => {
                        chars = lookahead;
                        out.push(ch);
                        continue;
                    }
                    None => None,
                }
            }
            _ => None,
        };
        match decoded {
            Some(ch) => {
                chars.next();
                out.push(ch);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn take_hex(chars: &mut Peekable<Chars<'_>>, width: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..width {
        let digit = chars.peek()?.to_digit(16)?;
        value = value * 16 + digit;
        chars.next();
    }
    Some(value)
}
