use std::fs;
use std::path::{Path, PathBuf};

use gallery::parser::Parser;
use notebook::converter::{INSTALL_COMMAND, install_cell};
use notebook::document::CodeCell;
use notebook::writer::write_notebook;
use notebook::{
    Cell, ConvertError, GalleryConfig, Notebook, Source, build_notebook, convert,
    ensure_install_cell,
};
use serde_json::{Map, Value, json};

const MOTOR_IMAGERY: &str = r#""""
====================
Motor Imagery Example
====================

This example shows how to load a dataset.
"""
# Authors: Jane Doe
#
# License: BSD (3-clause)

import moabb
from moabb.datasets import BNCI2014_001

##############################################################################
# Loading data
# ------------
#
# Load the dataset.

dataset = BNCI2014_001()
"#;

fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("failed to write script");
    path
}

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("failed to read notebook");
    serde_json::from_str(&text).expect("notebook is not valid JSON")
}

fn read_notebook(path: &Path) -> Notebook {
    Notebook::from_native(read_json(path)).expect("notebook has an unexpected shape")
}

fn convert_source(source: &str) -> Notebook {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = write_script(dir.path(), "plot_example.py", source);
    let output = dir.path().join("plot_example.ipynb");
    convert(&input, &output, &GalleryConfig::default()).expect("conversion failed");
    read_notebook(&output)
}

fn sources(notebook: &Notebook) -> Vec<String> {
    notebook
        .cells
        .iter()
        .map(|c| c.source_text().into_owned())
        .collect()
}

#[test]
fn gallery_example_gets_install_cell() {
    let nb = convert_source(MOTOR_IMAGERY);

    assert_eq!(
        sources(&nb),
        vec![
            INSTALL_COMMAND.to_string(),
            "\n# Motor Imagery Example\n\nThis example shows how to load a dataset.\n\n".to_string(),
            "# Authors: Jane Doe\n#\n# License: BSD (3-clause)\n\nimport moabb\nfrom moabb.datasets import BNCI2014_001"
                .to_string(),
            "## Loading data\n\nLoad the dataset.\n\n".to_string(),
            "dataset = BNCI2014_001()".to_string(),
        ]
    );
    let kinds: Vec<bool> = nb.cells.iter().map(Cell::is_code).collect();
    assert_eq!(kinds, vec![true, false, true, false, true]);
    assert_eq!(nb.nbformat, 4);
    assert_eq!(nb.nbformat_minor, 0);
}

#[test]
fn percent_script_without_install_mention() {
    let nb = convert_source("# %% [markdown]\n# Title\n\nimport moabb\n");

    assert_eq!(nb.cells.len(), 3);
    assert_eq!(nb.cells[0].source_text(), "%pip install moabb");
    assert_eq!(nb.cells[0].metadata().get("language"), Some(&json!("python")));
    assert_eq!(nb.cells[1].source_text(), "Title\n\n");
    assert_eq!(nb.cells[2].source_text(), "import moabb");
}

#[test]
fn existing_install_cell_is_kept() {
    let nb = convert_source("%pip install moabb\nimport moabb\n");

    assert_eq!(nb.cells.len(), 1);
    assert_eq!(nb.cells[0].source_text(), "%pip install moabb\nimport moabb");
    assert_eq!(nb.cells[0].metadata().get("collapsed"), Some(&json!(false)));
}

#[test]
fn script_without_cells_gets_only_install_cell() {
    let nb = convert_source("\n\n");

    assert_eq!(nb.cells.len(), 1);
    assert_eq!(nb.cells[0], install_cell());
}

#[test]
fn remaining_cells_match_conversion_without_insertion() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = write_script(dir.path(), "plot_mi.py", MOTOR_IMAGERY);
    let output = dir.path().join("plot_mi.ipynb");
    let config = GalleryConfig::default();

    convert(&input, &output, &config).expect("conversion failed");
    let converted = read_notebook(&output);

    let blocks = Parser::new(MOTOR_IMAGERY.to_string(), 0)
        .parse()
        .expect("parse failed")
        .blocks;
    let plain = build_notebook(&blocks, &config, dir.path()).expect("build failed");

    assert_eq!(converted.cells.len(), plain.cells.len() + 1);
    assert_eq!(converted.cells[0], install_cell());
    assert_eq!(&converted.cells[1..], &plain.cells[..]);
    assert_eq!(converted.metadata, plain.metadata);
}

#[test]
fn output_directories_are_created() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = write_script(dir.path(), "plot_a.py", MOTOR_IMAGERY);
    let output = dir.path().join("auto_examples").join("nested").join("plot_a.ipynb");

    convert(&input, &output, &GalleryConfig::default()).expect("conversion failed");
    assert!(output.is_file());

    // Existing directories and files are fine too.
    convert(&input, &output, &GalleryConfig::default()).expect("second conversion failed");
}

#[test]
fn conversion_is_byte_for_byte_repeatable() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = write_script(dir.path(), "plot_b.py", MOTOR_IMAGERY);
    let output = dir.path().join("plot_b.ipynb");
    let config = GalleryConfig::default();

    convert(&input, &output, &config).expect("conversion failed");
    let first = fs::read(&output).unwrap();
    convert(&input, &output, &config).expect("conversion failed");
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn output_layout_matches_json_dump() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = write_script(dir.path(), "plot_c.py", "\"\"\"Caf\u{e9} \u{1d11e}\"\"\"\n");
    let output = dir.path().join("plot_c.ipynb");

    convert(&input, &output, &GalleryConfig::default()).expect("conversion failed");
    let text = fs::read_to_string(&output).unwrap();

    assert!(text.is_ascii());
    assert!(text.contains("Caf\\u00e9 \\ud834\\udd1e"));
    assert!(text.starts_with("{\n  \"cells\": [\n    {\n      \"cell_type\": \"code\",\n"));
    assert!(text.ends_with("\"nbformat\": 4,\n  \"nbformat_minor\": 0\n}"));

    let value = read_json(&output);
    assert_eq!(value["metadata"]["kernelspec"]["name"], json!("python3"));
    assert_eq!(value["metadata"]["language_info"]["version"], json!("3.11.0"));
    assert_eq!(value["cells"][1]["source"], json!(["Caf\u{e9} \u{1d11e}\n"]));
}

#[test]
fn writer_emits_two_space_indent() {
    let nb = Notebook {
        cells: vec![Cell::code("x")],
        metadata: Map::new(),
        nbformat: 4,
        nbformat_minor: 0,
    };
    let mut out = Vec::new();
    write_notebook(&nb, &mut out).unwrap();

    let expected = r#"{
  "cells": [
    {
      "cell_type": "code",
      "execution_count": null,
      "metadata": {},
      "outputs": [],
      "source": "x"
    }
  ],
  "metadata": {},
  "nbformat": 4,
  "nbformat_minor": 0
}"#;
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn parse_errors_propagate_and_nothing_is_written() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = write_script(dir.path(), "plot_bad.py", "\"\"\"Never closed\nx = 1\n");
    let output = dir.path().join("plot_bad.ipynb");

    let err = convert(&input, &output, &GalleryConfig::default()).expect_err("expected failure");
    match err {
        ConvertError::Parse { errors, text, .. } => {
            assert_eq!(errors.len(), 1);
            assert!(text.starts_with("\"\"\"Never closed"));
        }
        other => panic!("expected a parse error, got {other}"),
    }
    assert!(!output.exists());
}

#[test]
fn missing_source_is_a_read_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let err = convert(
        &dir.path().join("missing.py"),
        &dir.path().join("out.ipynb"),
        &GalleryConfig::default(),
    )
    .expect_err("expected failure");
    assert!(matches!(err, ConvertError::Read { .. }));
}

#[test]
fn unwritable_output_is_an_io_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = write_script(dir.path(), "plot_d.py", "x = 1\n");
    // A regular file where a directory is needed.
    let blocker = write_script(dir.path(), "blocker", "");
    let output = blocker.join("out.ipynb");

    let err = convert(&input, &output, &GalleryConfig::default()).expect_err("expected failure");
    assert!(matches!(
        err,
        ConvertError::CreateDir { .. } | ConvertError::Write { .. }
    ));
}

fn notebook_with_first(cell: Cell) -> Notebook {
    Notebook {
        cells: vec![cell, Cell::code("print(1)")],
        metadata: Map::new(),
        nbformat: 4,
        nbformat_minor: 0,
    }
}

#[test]
fn install_cell_needs_both_marker_and_package() {
    let mut only_marker = notebook_with_first(Cell::code("%pip install numpy"));
    assert!(ensure_install_cell(&mut only_marker));
    assert_eq!(only_marker.cells.len(), 3);
    assert_eq!(only_marker.cells[1].source_text(), "%pip install numpy");

    let mut only_package = notebook_with_first(Cell::code("import moabb"));
    assert!(ensure_install_cell(&mut only_package));
    assert_eq!(only_package.cells[0], install_cell());

    let mut both = notebook_with_first(Cell::markdown("Run `pip install moabb` first."));
    assert!(!ensure_install_cell(&mut both));
    assert_eq!(both.cells.len(), 2);
}

#[test]
fn install_check_reads_list_sources() {
    let mut nb = notebook_with_first(Cell::Code(CodeCell {
        execution_count: None,
        metadata: Map::new(),
        outputs: Vec::new(),
        source: Source::Lines(vec!["!pip install ".to_string(), "moabb\n".to_string()]),
    }));
    assert!(!ensure_install_cell(&mut nb));
}

#[test]
fn notebook_without_cell_list_is_treated_as_empty() {
    for native in [json!({"metadata": {}}), json!({"cells": "oops"}), json!(null)] {
        let mut nb = Notebook::from_native(native).expect("normalization failed");
        assert!(nb.first_cell().is_none());
        assert!(ensure_install_cell(&mut nb));
        assert_eq!(nb.cells, vec![install_cell()]);
    }
}

#[test]
fn malformed_cells_are_rejected() {
    let native = json!({"cells": [{"cell_type": "widget", "source": "x"}]});
    assert!(Notebook::from_native(native).is_err());
}

#[test]
fn first_and_last_cells_from_config() {
    let config = GalleryConfig {
        first_notebook_cell: Some("%matplotlib inline".to_string()),
        last_notebook_cell: Some("print('done')".to_string()),
        ..GalleryConfig::default()
    };
    let blocks = Parser::new("x = 1\n".to_string(), 0).parse().unwrap().blocks;
    let nb = build_notebook(&blocks, &config, Path::new(".")).unwrap();

    assert_eq!(
        sources(&nb),
        vec!["%matplotlib inline", "x = 1", "print('done')"]
    );
}

#[test]
fn config_comments_can_be_stripped() {
    let source = "\"\"\"Doc.\"\"\"\nx = 1\n# sphinx_gallery_thumbnail_number = 2\n\n# %%\n# sphinx_gallery_defer_figures\n";
    let blocks = Parser::new(source.to_string(), 0).parse().unwrap().blocks;

    let kept = build_notebook(&blocks, &GalleryConfig::default(), Path::new(".")).unwrap();
    assert_eq!(kept.cells[1].source_text(), "x = 1\n# sphinx_gallery_thumbnail_number = 2");

    let config = GalleryConfig {
        remove_config_comments: true,
        ..GalleryConfig::default()
    };
    let stripped = build_notebook(&blocks, &config, Path::new(".")).unwrap();
    assert_eq!(stripped.cells[1].source_text(), "x = 1");
}

#[test]
fn trailing_config_only_block_is_dropped() {
    let source = "\"\"\"Doc.\"\"\"\nx = 1\n\n# %%\ny = 2\n# %%\n\n# sphinx_gallery_thumbnail_number = 2\n";
    let blocks = Parser::new(source.to_string(), 0).parse().unwrap().blocks;
    let config = GalleryConfig {
        remove_config_comments: true,
        ..GalleryConfig::default()
    };
    let nb = build_notebook(&blocks, &config, Path::new(".")).unwrap();
    assert_eq!(sources(&nb), vec!["Doc.\n", "x = 1", "y = 2"]);
}

#[test]
fn cell_magic_is_promoted_when_enabled() {
    let source = "\"\"\"Doc.\"\"\"\n\n# %%\n# Shell step:\n#\n# ```\n# %%bash\n# ls\n# ```\nx = 1\n";
    let blocks = Parser::new(source.to_string(), 0).parse().unwrap().blocks;
    let config = GalleryConfig {
        promote_jupyter_magic: true,
        ..GalleryConfig::default()
    };
    let nb = build_notebook(&blocks, &config, Path::new(".")).unwrap();

    let magic = nb
        .cells
        .iter()
        .find(|c| c.is_code() && c.source_text().starts_with("%%bash"))
        .expect("magic cell missing");
    assert_eq!(magic.source_text(), "%%bash\nls");

    let plain = build_notebook(&blocks, &GalleryConfig::default(), Path::new(".")).unwrap();
    assert_eq!(nb.cells.len(), plain.cells.len() + 1);
}

#[test]
fn config_from_toml() {
    let config = GalleryConfig::from_toml_str(
        "first_notebook_cell = \"%matplotlib inline\"\nnotebook_images = \"https://example.org/\"\n",
    )
    .expect("valid config");

    assert_eq!(config.first_notebook_cell.as_deref(), Some("%matplotlib inline"));
    assert_eq!(
        config.notebook_images,
        notebook::NotebookImages::Prefix("https://example.org/".to_string())
    );
    assert_eq!(config.python_version, GalleryConfig::default().python_version);

    let embed = GalleryConfig::from_toml_str("notebook_images = true").unwrap();
    assert_eq!(embed.notebook_images, notebook::NotebookImages::Flag(true));

    assert!(GalleryConfig::from_toml_str("no_such_option = 1").is_err());
}
