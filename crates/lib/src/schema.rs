//! # Schema Context
//!
//! The schema description handed to the model with every SQL generation
//! request. It is read once at startup and never parsed.

use crate::errors::PromptError;
use std::{fmt, path::Path, sync::Arc};
use tracing::info;

/// An immutable, cheaply cloneable schema description.
#[derive(Clone, PartialEq, Eq)]
pub struct SchemaContext(Arc<str>);

impl SchemaContext {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Reads the schema description from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PromptError::SchemaLoad {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), bytes = text.len(), "Loaded schema description.");
        Ok(Self::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SchemaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaContext")
            .field("bytes", &self.0.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_reads_the_file_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"attribute_data\": [\"state\", \"district\"]}}").unwrap();

        let schema = SchemaContext::load(file.path()).unwrap();
        assert_eq!(
            schema.as_str(),
            "{\"attribute_data\": [\"state\", \"district\"]}\n"
        );
    }

    #[test]
    fn load_reports_the_missing_path() {
        let err = SchemaContext::load("/nonexistent/database_schema.json").unwrap_err();
        match err {
            PromptError::SchemaLoad { path, .. } => {
                assert_eq!(path, "/nonexistent/database_schema.json")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
