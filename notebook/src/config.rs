use std::path::PathBuf;

use serde::Deserialize;

/// Options that steer notebook generation.
///
/// A value of this type is built once (usually via [`GalleryConfig::default`])
/// and lent to each conversion; nothing in the crate mutates it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Code placed in a cell before the script's first block.
    pub first_notebook_cell: Option<String>,

    /// Code placed in a cell after the script's last block.
    pub last_notebook_cell: Option<String>,

    /// How `.. image::` paths in text blocks are rewritten.
    pub notebook_images: NotebookImages,

    /// Turn fenced `%%` cell-magic snippets in text blocks into code cells.
    pub promote_jupyter_magic: bool,

    /// Strip `# sphinx_gallery_*` comments from code cells.
    pub remove_config_comments: bool,

    /// Root of the example sources. Absolute image paths resolve against it.
    pub src_dir: PathBuf,

    /// Reported in the notebook's kernel and language metadata.
    pub python_version: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        GalleryConfig {
            first_notebook_cell: None,
            last_notebook_cell: None,
            notebook_images: NotebookImages::default(),
            promote_jupyter_magic: false,
            remove_config_comments: false,
            src_dir: PathBuf::from("."),
            python_version: "3.11.0".to_string(),
        }
    }
}

impl GalleryConfig {
    /// Read a (partial) configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Major version component of `python_version`, e.g. `"3"`.
    pub fn python_major(&self) -> &str {
        self.python_version
            .split('.')
            .next()
            .unwrap_or(&self.python_version)
    }
}

/// Image handling for notebooks: `false` links files, `true` embeds them,
/// a string is a URL prefix.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NotebookImages {
    Flag(bool),
    Prefix(String),
}

impl Default for NotebookImages {
    fn default() -> Self {
        NotebookImages::Flag(false)
    }
}
