use std::fs;
use std::path::Path;

use gallery::block::Block;
use gallery::parser::Parser;
use serde_json::Value;

use crate::config::GalleryConfig;
use crate::document::{Cell, Notebook};
use crate::error::ConvertError;
use crate::native::jupyter_notebook;
use crate::writer::save_notebook;

/// Source of the cell prepended to notebooks that lack one.
pub const INSTALL_COMMAND: &str = "%pip install moabb";
/// Substring that marks a package-install invocation.
pub const INSTALL_MARKER: &str = "pip install";
/// Package the install cell provides.
pub const PACKAGE_NAME: &str = "moabb";

/// Convert one gallery script into a notebook file at `output_path`.
///
/// Parent directories of `output_path` are created as needed and an existing
/// file is overwritten.
pub fn convert(
    source_path: &Path,
    output_path: &Path,
    config: &GalleryConfig,
) -> Result<(), ConvertError> {
    let text = fs::read_to_string(source_path).map_err(|source| ConvertError::Read {
        path: source_path.to_path_buf(),
        source,
    })?;

    let parser = Parser::new(text, 0);
    let script = parser.parse().map_err(|errors| ConvertError::Parse {
        path: source_path.to_path_buf(),
        text: parser.source().to_string(),
        errors,
    })?;

    for warning in &script.warnings {
        let line = parser.source()[..warning.span.start].matches('\n').count() + 1;
        log::warn!("{}:{}: {}", source_path.display(), line, warning);
    }

    // Per-file options only matter when building a whole gallery.
    let (_file_conf, blocks) = script.into_parts();

    let base_dir = source_path.parent().unwrap_or_else(|| Path::new("."));
    let mut notebook = build_notebook(&blocks, config, base_dir)?;
    ensure_install_cell(&mut notebook);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConvertError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    save_notebook(&notebook, output_path).map_err(|source| ConvertError::Write {
        path: output_path.to_path_buf(),
        source,
    })?;

    log::debug!(
        "wrote {} cells from '{}' to '{}'",
        notebook.cells.len(),
        source_path.display(),
        output_path.display()
    );
    Ok(())
}

/// Build and normalize the notebook for a block sequence, without the
/// install cell.
pub fn build_notebook(
    blocks: &[Block],
    config: &GalleryConfig,
    base_dir: &Path,
) -> Result<Notebook, ConvertError> {
    let native = jupyter_notebook(blocks, config, base_dir)?;
    Ok(Notebook::from_native(native)?)
}

/// Prepend the install cell unless the first cell already installs the
/// package. Returns whether a cell was inserted.
///
/// The cell goes in when either the install marker or the package name is
/// missing from the first cell's source.
pub fn ensure_install_cell(notebook: &mut Notebook) -> bool {
    let first_source = notebook
        .first_cell()
        .map(|cell| cell.source_text().into_owned())
        .unwrap_or_default();

    if first_source.contains(INSTALL_MARKER) && first_source.contains(PACKAGE_NAME) {
        return false;
    }

    log::info!("prepending install cell: {}", INSTALL_COMMAND);
    notebook.cells.insert(0, install_cell());
    true
}

/// The `%pip install` cell, marked as Python code.
pub fn install_cell() -> Cell {
    let mut cell = Cell::code(INSTALL_COMMAND);
    cell.metadata_mut()
        .insert("language".to_string(), Value::from("python"));
    cell
}
