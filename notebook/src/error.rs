use std::io;
use std::path::PathBuf;

use gallery::parser::ParseError;

/// Failure while turning text blocks into notebook cells.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unable to open '{}' to embed it in the notebook: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything that can stop a conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("cannot read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `text` is the normalized source the error spans point into.
    #[error("cannot parse '{}': {}", .path.display(), summarize(.errors))]
    Parse {
        path: PathBuf,
        text: String,
        errors: Vec<ParseError>,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("generated notebook has an unexpected shape: {0}")]
    Normalize(#[from] serde_json::Error),

    #[error("cannot create directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn summarize(errors: &[ParseError]) -> String {
    let msgs: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    msgs.join("; ")
}
