pub mod block;
pub mod file_config;
pub mod parser;

use crate::block::Block;
use crate::file_config::FileConfig;
use crate::parser::ParseError;

/// A parsed Sphinx-Gallery example script.
#[derive(Debug, Clone)]
pub struct Script {
    /// `# sphinx_gallery_<name> = <value>` options found in the script body.
    pub file_conf: FileConfig,
    /// Text and code blocks in source order.
    pub blocks: Vec<Block>,
    /// Non-fatal diagnostics (e.g. config comments with unreadable values).
    pub warnings: Vec<ParseError>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl Script {
    /// Split into the per-file settings and the block sequence.
    pub fn into_parts(self) -> (FileConfig, Vec<Block>) {
        (self.file_conf, self.blocks)
    }
}
