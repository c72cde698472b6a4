use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A notebook in typed form, ready to be inspected, patched and saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    pub metadata: Map<String, Value>,
    pub nbformat: u64,
    pub nbformat_minor: u64,
}

impl Notebook {
    /// Normalize a JSON notebook into its typed form.
    ///
    /// A document without a usable `cells` array normalizes to a notebook
    /// with no cells. Cells that are present must be well formed.
    pub fn from_native(native: Value) -> Result<Notebook, serde_json::Error> {
        let mut fields = match native {
            Value::Object(fields) => fields,
            other => {
                log::debug!("native notebook is not an object: {}", other);
                Map::new()
            }
        };

        let cells = match fields.remove("cells") {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<Cell>, _>>()?,
            other => {
                log::debug!("native notebook has no cell list ({:?}), treating as empty", other);
                Vec::new()
            }
        };

        let metadata = match fields.remove("metadata") {
            Some(Value::Object(metadata)) => metadata,
            _ => Map::new(),
        };

        Ok(Notebook {
            cells,
            metadata,
            nbformat: fields.get("nbformat").and_then(Value::as_u64).unwrap_or(4),
            nbformat_minor: fields
                .get("nbformat_minor")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
    }

    pub fn first_cell(&self) -> Option<&Cell> {
        self.cells.first()
    }
}

/// One notebook cell, tagged by `cell_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code(CodeCell),
    Markdown(TextCell),
    Raw(TextCell),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCell {
    pub execution_count: Option<u64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub outputs: Vec<Value>,
    #[serde(default)]
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCell {
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub source: Source,
}

impl Cell {
    /// A fresh, unexecuted code cell.
    pub fn code(source: impl Into<String>) -> Self {
        Cell::Code(CodeCell {
            execution_count: None,
            metadata: Map::new(),
            outputs: Vec::new(),
            source: Source::Text(source.into()),
        })
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Cell::Markdown(TextCell {
            metadata: Map::new(),
            source: Source::Text(source.into()),
        })
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Cell::Code(_))
    }

    pub fn source(&self) -> &Source {
        match self {
            Cell::Code(cell) => &cell.source,
            Cell::Markdown(cell) | Cell::Raw(cell) => &cell.source,
        }
    }

    pub fn source_text(&self) -> Cow<'_, str> {
        self.source().text()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        match self {
            Cell::Code(cell) => &cell.metadata,
            Cell::Markdown(cell) | Cell::Raw(cell) => &cell.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            Cell::Code(cell) => &mut cell.metadata,
            Cell::Markdown(cell) | Cell::Raw(cell) => &mut cell.metadata,
        }
    }
}

/// Cell source as stored on disk: a single string or a list of line strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Source {
    /// The full source; list entries are concatenated as-is.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Source::Text(text) => Cow::Borrowed(text),
            Source::Lines(lines) => Cow::Owned(lines.concat()),
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}
