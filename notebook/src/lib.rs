pub mod config;
pub mod converter;
pub mod document;
pub mod error;
pub mod magic;
pub mod native;
pub mod rst;
pub mod writer;

pub use config::{GalleryConfig, NotebookImages};
pub use converter::{build_notebook, convert, ensure_install_cell, install_cell};
pub use document::{Cell, Notebook, Source};
pub use error::{ConvertError, RenderError};
