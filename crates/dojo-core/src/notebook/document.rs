//! Minimal nbformat v4 document model.
//!
//! Only the subset the validation notebook needs: markdown and code cells
//! without ids, which corresponds to the nbformat 4.2 schema level.

use crate::domain::{DojoError, DojoResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const NBFORMAT_MAJOR: u32 = 4;
pub const NBFORMAT_MINOR: u32 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

impl Notebook {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            metadata: Map::new(),
            nbformat: NBFORMAT_MAJOR,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }

    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    pub fn extend(&mut self, cells: impl IntoIterator<Item = Cell>) {
        self.cells.extend(cells);
    }

    /// Pretty JSON with a trailing newline, the way notebook files are
    /// written on disk.
    pub fn to_json_string(&self) -> DojoResult<String> {
        let mut rendered = serde_json::to_string_pretty(self).map_err(|source| {
            DojoError::internal(
                "SYS.NOTEBOOK_JSON",
                format!("failed to serialize notebook document: {}", source),
            )
        })?;
        rendered.push('\n');
        Ok(rendered)
    }

    pub fn write_to(&self, path: &Path) -> DojoResult<()> {
        let rendered = self.to_json_string()?;
        fs::write(path, rendered).map_err(|source| {
            DojoError::io_system(
                "IO.NOTEBOOK_WRITE",
                format!("failed to write notebook '{}': {}", path.display(), source),
            )
        })
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "cell_type", rename_all = "snake_case")]
pub enum Cell {
    Markdown {
        metadata: Map<String, Value>,
        source: String,
    },
    Code {
        metadata: Map<String, Value>,
        source: String,
        execution_count: Option<u32>,
        outputs: Vec<Value>,
    },
}

impl Cell {
    pub fn markdown(source: impl Into<String>) -> Self {
        Self::Markdown {
            metadata: Map::new(),
            source: source.into(),
        }
    }

    pub fn code(source: impl Into<String>) -> Self {
        Self::Code {
            metadata: Map::new(),
            source: source.into(),
            execution_count: None,
            outputs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, Notebook};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[test]
    fn markdown_cell_serializes_to_nbformat_shape() {
        let cell = serde_json::to_value(Cell::markdown("# Title")).expect("cell should serialize");
        assert_eq!(
            cell,
            json!({
                "cell_type": "markdown",
                "metadata": {},
                "source": "# Title"
            })
        );
    }

    #[test]
    fn code_cell_carries_null_execution_count_and_empty_outputs() {
        let cell =
            serde_json::to_value(Cell::code("print(1)")).expect("cell should serialize");
        assert_eq!(
            cell,
            json!({
                "cell_type": "code",
                "metadata": {},
                "source": "print(1)",
                "execution_count": null,
                "outputs": []
            })
        );
    }

    #[test]
    fn notebook_document_writes_versioned_json_with_trailing_newline() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("doc.ipynb");

        let mut notebook = Notebook::new();
        notebook.push(Cell::markdown("intro"));
        notebook.push(Cell::code("x = 1"));
        notebook.write_to(&path).expect("notebook should be written");

        let content = std::fs::read_to_string(&path).expect("notebook should be readable");
        assert!(content.ends_with('\n'));

        let parsed: Value = serde_json::from_str(&content).expect("notebook JSON should parse");
        assert_eq!(parsed["nbformat"], Value::from(4));
        assert_eq!(parsed["nbformat_minor"], Value::from(2));
        assert_eq!(parsed["metadata"], json!({}));
        assert_eq!(
            parsed["cells"].as_array().map(Vec::len),
            Some(2),
            "notebook should carry both cells"
        );
    }
}
