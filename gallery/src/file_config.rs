//! In-file `# sphinx_gallery_<name> = <value>` options.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::parser::ParseError;
use crate::parser::docstring::decode_escapes;

/// Options set by config comments, in order of first appearance.
pub type FileConfig = Map<String, Value>;

static CONFIG_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#[ \t]*sphinx_gallery_([A-Za-z0-9_]+)(?:[ \t]*=[ \t]*(.+))?[ \t]*\n?")
        .expect("config comment pattern is valid")
});

/// Collect config comments from `source`. `offset` is the byte position of
/// `source` inside the file, so warning spans point at the right place.
pub fn extract_file_config(
    source: &str,
    offset: usize,
    file_id: usize,
) -> (FileConfig, Vec<ParseError>) {
    let mut conf = FileConfig::new();
    let mut warnings = Vec::new();

    for caps in CONFIG_COMMENT.captures_iter(source) {
        let name = caps[1].to_string();
        let Some(raw) = caps.get(2) else {
            conf.insert(name, Value::Bool(true));
            continue;
        };
        match literal_value(raw.as_str()) {
            Some(value) => {
                conf.insert(name, value);
            }
            None => {
                let span = offset + raw.start()..offset + raw.end();
                warnings.push(
                    ParseError::warning(
                        format!(
                            "sphinx_gallery_{} was passed invalid value {}",
                            name,
                            raw.as_str().trim()
                        ),
                        span,
                        file_id,
                    )
                    .with_label("not a Python literal")
                    .with_note("the option is ignored"),
                );
            }
        }
    }

    (conf, warnings)
}

/// Strip every config comment line from a code block.
pub fn remove_config_comments(code: &str) -> String {
    CONFIG_COMMENT.replace_all(code, "").into_owned()
}

/// Read a Python literal: `True`, `False`, `None`, numbers, and quoted
/// strings. JSON-compatible containers are accepted as well.
pub fn literal_value(text: &str) -> Option<Value> {
    let text = text.trim();
    match text {
        "True" => return Some(Value::Bool(true)),
        "False" => return Some(Value::Bool(false)),
        "None" => return Some(Value::Null),
        _ => {}
    }

    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    if text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
        if let Some(n) = text.parse::<f64>().ok().and_then(Number::from_f64) {
            return Some(Value::Number(n));
        }
    }

    if let Some(s) = quoted_string(text) {
        return Some(Value::String(s));
    }

    serde_json::from_str(text).ok()
}

fn quoted_string(text: &str) -> Option<String> {
    let (raw, rest) = match text.strip_prefix(['r', 'R']) {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix(['u', 'U']).unwrap_or(text)),
    };
    let quote = rest.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let inner = rest.strip_prefix(quote)?.strip_suffix(quote)?;

    // A bare quote inside means this was several literals, not one.
    let mut escaped = false;
    for c in inner.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return None,
            _ => escaped = false,
        }
    }
    if escaped {
        return None;
    }

    Some(if raw { inner.to_string() } else { decode_escapes(inner) })
}
