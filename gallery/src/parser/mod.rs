pub mod docstring;
pub mod error;
mod structural;

pub use error::ParseError;
pub use structural::dedent;

use crate::Script;
use crate::block::Block;
use crate::file_config::extract_file_config;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    /// Line endings are normalized to `\n` and a leading BOM is dropped, so
    /// every span refers to [`Parser::source`], not the raw file bytes.
    pub fn new(source: String, file_id: usize) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(&source);
        let source = source.replace("\r\n", "\n").replace('\r', "\n");
        Parser { source, file_id }
    }

    /// The normalized text that spans point into.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Split the script into its docstring, config comments and blocks.
    pub fn parse(&self) -> Result<Script, Vec<ParseError>> {
        let docstring = docstring::find_docstring(&self.source, self.file_id).map_err(|e| vec![e])?;

        let mut blocks = Vec::new();
        let (rest_offset, rest_line) = match docstring {
            Some(doc) => {
                blocks.push(Block::text(doc.value, 1, doc.span));
                (doc.rest_offset, doc.rest_line)
            }
            None => {
                log::debug!("no module docstring, whole file is block content");
                (0, 1)
            }
        };

        let rest = &self.source[rest_offset..];
        let (file_conf, warnings) = extract_file_config(rest, rest_offset, self.file_id);
        blocks.extend(structural::split_blocks(rest, rest_offset, rest_line));

        log::debug!(
            "parsed {} blocks ({} code), {} config options",
            blocks.len(),
            blocks.iter().filter(|b| b.is_code()).count(),
            file_conf.len()
        );

        Ok(Script {
            file_conf,
            blocks,
            warnings,
            source_id: self.file_id,
        })
    }
}
