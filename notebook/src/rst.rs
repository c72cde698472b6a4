//! Rewrite the reStructuredText found in gallery text blocks as notebook
//! Markdown.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::{Captures, Regex};

use crate::config::{GalleryConfig, NotebookImages};
use crate::error::RenderError;

/// Characters docutils recommends for section adornments.
const ADORNMENTS: &str = "=`:.'\"~^_*+#<>-";

static MATH_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| directive_pattern("math"));
static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s):math:`(.+?)`").expect("inline math pattern is valid"));
static NOTE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| directive_pattern("note"));
static WARNING_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| directive_pattern("warning"));
static LINK_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ *\.\. _.*:.*$\n").expect("link target pattern is valid"));
static EMBEDDED_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`]*?)\s*<([^`]*)>`_").expect("embedded uri pattern is valid")
});
static CONTENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\.\. contents::.*$(\n +:\S+: *$)*\n").expect("contents pattern is valid")
});
static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\.\. image::(.*$)((?:\n +:\S+:.*$)*)\n").expect("image pattern is valid")
});
static IMAGE_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\n +:(\S+): +(.*)$").expect("image option pattern is valid"));

fn directive_pattern(name: &str) -> Regex {
    Regex::new(&format!(r"(?m)^\.\. {}::((?:.+)?(?:\n+^  .+)*)", name))
        .expect("directive pattern is valid")
}

/// Markdown heading depth per adornment style, numbered by first use.
///
/// One instance is shared by all text blocks of a notebook so that a given
/// underline style maps to the same depth everywhere.
#[derive(Debug, Default)]
pub struct HeadingLevels {
    styles: Vec<(Option<char>, char)>,
}

impl HeadingLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth for an (overline, underline) style, assigning the next one if new.
    pub fn level(&mut self, over: Option<char>, under: char) -> usize {
        let style = (over, under);
        match self.styles.iter().position(|s| *s == style) {
            Some(idx) => idx + 1,
            None => {
                self.styles.push(style);
                self.styles.len()
            }
        }
    }
}

/// Convert one text block.
pub fn rst_to_markdown(
    text: &str,
    config: &GalleryConfig,
    target_dir: &Path,
    levels: &mut HeadingLevels,
) -> Result<String, RenderError> {
    let text = convert_headings(text, levels);

    let text = MATH_DIRECTIVE.replace_all(&text, |caps: &Captures| {
        format!(r"\begin{{align}}{}\end{{align}}", caps[1].trim())
    });
    let text = INLINE_MATH.replace_all(&text, |caps: &Captures| format!("${}$", &caps[1]));

    let text = NOTE_DIRECTIVE.replace_all(&text, |caps: &Captures| alert("info", "Note", &caps[1]));
    let text = WARNING_DIRECTIVE.replace_all(&text, |caps: &Captures| {
        alert("danger", "Warning", &caps[1])
    });

    let text = LINK_TARGET.replace_all(&text, "");
    let text = EMBEDDED_URI.replace_all(&text, "`$1 <$2>`_");
    let text = text.replace(":ref:`", "`");
    let text = CONTENTS.replace_all(&text, "");

    convert_images(&text, config, target_dir)
}

fn alert(kind: &str, title: &str, body: &str) -> String {
    format!(
        r#"<div class="alert alert-{}"><h4>{}</h4><p>{}</p></div>"#,
        kind,
        title,
        body.trim()
    )
}

fn adornment_run(line: &str) -> Option<char> {
    let first = line.chars().next().filter(|c| ADORNMENTS.contains(*c))?;
    line.chars().all(|c| c == first).then_some(first)
}

fn is_blank(line: &str) -> bool {
    line.chars().all(|c| c == ' ' || c == '\t')
}

fn starts_with_non_space(line: &str) -> bool {
    line.chars().next().is_some_and(|c| !c.is_whitespace())
}

/// Replace underlined (and over-and-underlined) section titles with `#`
/// headings. A title only counts at the start of the text or after a blank
/// line.
fn convert_headings(text: &str, levels: &mut HeadingLevels) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if i > 0 && !is_blank(lines[i - 1]) {
            out.push(line.to_string());
            i += 1;
            continue;
        }

        if let (Some(over), Some(title), Some(under)) = (
            adornment_run(line),
            lines.get(i + 1).map(|l| l.trim_start_matches([' ', '\t'])),
            lines.get(i + 2).and_then(|l| adornment_run(l)),
        ) {
            if over == under && starts_with_non_space(title) {
                let depth = levels.level(Some(over), under);
                out.push(format!("{} {}", "#".repeat(depth), title));
                i += 3;
                continue;
            }
        }

        if let Some(under) = lines.get(i + 1).and_then(|l| adornment_run(l)) {
            if starts_with_non_space(line) {
                let depth = levels.level(None, under);
                out.push(format!("{} {}", "#".repeat(depth), line));
                i += 2;
                continue;
            }
        }

        out.push(line.to_string());
        i += 1;
    }

    out.join("\n")
}

fn convert_images(
    text: &str,
    config: &GalleryConfig,
    target_dir: &Path,
) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in IMAGE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let src = image_src(caps[1].trim(), config, target_dir)?;
        let options = caps
            .get(2)
            .map(|m| IMAGE_OPTION.replace_all(m.as_str(), r#" ${1}="${2}""#).into_owned())
            .unwrap_or_default();

        out.push_str(&text[last..whole.start()]);
        out.push_str(&format!("<img src=\"{}\"{}>\n", src, options));
        last = whole.end();
    }
    out.push_str(&text[last..]);

    Ok(out)
}

/// Resolve the `src` attribute for an image directive.
pub fn image_src(
    path: &str,
    config: &GalleryConfig,
    target_dir: &Path,
) -> Result<String, RenderError> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }

    let prefix = match &config.notebook_images {
        NotebookImages::Flag(false) => None,
        NotebookImages::Prefix(prefix) if prefix.is_empty() => None,
        NotebookImages::Prefix(prefix) => Some(prefix),
        NotebookImages::Flag(true) => return embed_image(path, config, target_dir),
    };
    let Some(prefix) = prefix else {
        return Ok(format!("file://{}", path.trim_start_matches('/')));
    };

    let full_path = absolute(&resolve_image_path(path, config, target_dir));
    let src_dir = absolute(&config.src_dir);
    let rel = pathdiff::diff_paths(&full_path, &src_dir).unwrap_or(full_path);
    let rel: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(format!("{}{}", prefix, rel.join("/")))
}

fn embed_image(
    path: &str,
    config: &GalleryConfig,
    target_dir: &Path,
) -> Result<String, RenderError> {
    let full_path = resolve_image_path(path, config, target_dir);
    let data = fs::read(&full_path).map_err(|source| RenderError::Image {
        path: full_path.clone(),
        source,
    })?;
    let mime = mime_guess::from_path(&full_path).first_or_octet_stream();
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(data)))
}

// Absolute paths are relative to the source root, not the example's directory.
fn resolve_image_path(path: &str, config: &GalleryConfig, target_dir: &Path) -> PathBuf {
    match path.strip_prefix('/') {
        Some(rel) => config.src_dir.join(rel.trim_start_matches('/')),
        None => target_dir.join(path),
    }
}

/// Anchor `path` at the working directory, keeping it unchanged if that fails.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
