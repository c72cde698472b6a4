//! Build the notebook dict straight from gallery blocks.

use std::path::Path;

use gallery::block::{Block, BlockKind};
use gallery::file_config::remove_config_comments;
use serde_json::{Value, json};

use crate::config::GalleryConfig;
use crate::error::RenderError;
use crate::magic::{Segment, split_cell_magic};
use crate::rst::{HeadingLevels, rst_to_markdown};

/// Produce an nbformat 4.0 document for `blocks`.
///
/// `target_dir` is the directory of the source script; relative image paths
/// are resolved against it.
pub fn jupyter_notebook(
    blocks: &[Block],
    config: &GalleryConfig,
    target_dir: &Path,
) -> Result<Value, RenderError> {
    let mut cells = Vec::new();

    if let Some(first) = &config.first_notebook_cell {
        cells.push(code_cell(first));
    }
    fill_cells(&mut cells, blocks, config, target_dir)?;
    if let Some(last) = &config.last_notebook_cell {
        cells.push(code_cell(last));
    }

    log::debug!("built {} notebook cells from {} blocks", cells.len(), blocks.len());
    Ok(skeleton(cells, config))
}

fn skeleton(cells: Vec<Value>, config: &GalleryConfig) -> Value {
    let major = config.python_major();
    let codemirror_version = major
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(major));

    json!({
        "cells": cells,
        "metadata": {
            "kernelspec": {
                "display_name": format!("Python {}", major),
                "language": "python",
                "name": format!("python{}", major),
            },
            "language_info": {
                "codemirror_mode": {
                    "name": "ipython",
                    "version": codemirror_version,
                },
                "file_extension": ".py",
                "mimetype": "text/x-python",
                "name": "python",
                "nbconvert_exporter": "python",
                "pygments_lexer": format!("ipython{}", major),
                "version": config.python_version,
            },
        },
        "nbformat": 4,
        "nbformat_minor": 0,
    })
}

fn fill_cells(
    cells: &mut Vec<Value>,
    blocks: &[Block],
    config: &GalleryConfig,
    target_dir: &Path,
) -> Result<(), RenderError> {
    let mut levels = HeadingLevels::new();

    let mut blocks: Vec<Block> = blocks.to_vec();
    if config.remove_config_comments {
        for block in blocks.iter_mut().filter(|b| b.is_code()) {
            block.content = remove_config_comments(&block.content);
        }
        // Removing the comments can leave the final block empty.
        if blocks.last().is_some_and(|b| b.content.trim().is_empty()) {
            blocks.pop();
        }
    }

    for block in &blocks {
        match block.kind {
            BlockKind::Code => cells.push(code_cell(&block.content)),
            BlockKind::Text => {
                let markdown = rst_to_markdown(
                    &format!("{}\n", block.content),
                    config,
                    target_dir,
                    &mut levels,
                )?;
                if config.promote_jupyter_magic {
                    for segment in split_cell_magic(&markdown) {
                        cells.push(match segment {
                            Segment::Markdown(text) => markdown_cell(&text),
                            Segment::Magic(code) => code_cell(&code),
                        });
                    }
                } else {
                    cells.push(markdown_cell(&markdown));
                }
            }
        }
    }

    Ok(())
}

fn code_cell(code: &str) -> Value {
    json!({
        "cell_type": "code",
        "execution_count": null,
        "metadata": {"collapsed": false},
        "outputs": [],
        "source": [code.trim()],
    })
}

fn markdown_cell(markdown: &str) -> Value {
    json!({
        "cell_type": "markdown",
        "metadata": {},
        "source": [markdown],
    })
}
