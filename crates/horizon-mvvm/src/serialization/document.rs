//! Project files holding several models.

use std::fs;
use std::io::Write;
use std::path::Path;

use horizon_mvvm_core::logging::targets;
use serde_json::{Value, json};

use super::format::{JsonFormatAssistant, array_field};
use super::model_converter::{JsonModelConverter, check_target, populate};
use crate::error::{MvvmError, Result};
use crate::model::SessionModel;

/// Saves a fixed list of models into one JSON file and loads them back.
///
/// The file holds `{"models": [<model JSON>, ...]}` in list order. Loading
/// pairs entries with models by position.
///
/// # Example
///
/// ```no_run
/// use horizon_mvvm::model::SessionModel;
/// use horizon_mvvm::serialization::JsonDocument;
///
/// let samples = SessionModel::new("SampleModel");
/// let plots = SessionModel::new("PlotModel");
/// JsonDocument::new(vec![samples, plots]).save("project.json")?;
/// # Ok::<(), horizon_mvvm::MvvmError>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonDocument {
    models: Vec<SessionModel>,
    converter: JsonModelConverter,
}

impl JsonDocument {
    /// Creates a document over `models`.
    pub fn new(models: Vec<SessionModel>) -> Self {
        Self {
            models,
            converter: JsonModelConverter::new(),
        }
    }

    /// The models, in file order.
    pub fn models(&self) -> &[SessionModel] {
        &self.models
    }

    /// The document as JSON.
    pub fn to_json(&self) -> Result<Value> {
        let models = self
            .models
            .iter()
            .map(|model| self.converter.to_json(model))
            .collect::<Result<Vec<_>>>()?;
        Ok(json!({ (JsonFormatAssistant::MODELS_KEY): models }))
    }

    /// Loads `json` into the models.
    ///
    /// Every entry is parsed and checked against its model before anything
    /// is inserted, so a malformed or mismatching document leaves all models
    /// untouched.
    ///
    /// # Errors
    ///
    /// - `Format` if `json` is malformed
    /// - `SchemaMismatch` if the number of models or a model type differs
    /// - `Precondition` if a model is not empty
    pub fn from_json(&self, json: &Value) -> Result<()> {
        if !JsonFormatAssistant::new().is_document(json) {
            return Err(MvvmError::format("value does not describe a document"));
        }
        let entries = array_field(json, JsonFormatAssistant::MODELS_KEY)?;
        if entries.len() != self.models.len() {
            return Err(MvvmError::SchemaMismatch {
                expected: format!("{} model(s)", self.models.len()),
                found: format!("{} model(s)", entries.len()),
            });
        }

        let parsed = entries
            .iter()
            .map(|entry| self.converter.parse(entry))
            .collect::<Result<Vec<_>>>()?;
        for (parsed, model) in parsed.iter().zip(&self.models) {
            check_target(parsed, model)?;
        }
        for (parsed, model) in parsed.into_iter().zip(&self.models) {
            populate(parsed, model)?;
        }
        Ok(())
    }

    /// Writes the document to `path`.
    ///
    /// The JSON goes to a temporary file next to `path` which then replaces
    /// it, so an existing file is never left half written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec_pretty(&self.to_json()?)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        file.persist(path).map_err(|err| err.error)?;

        tracing::debug!(
            target: targets::SERIALIZATION,
            path = %path.display(),
            models = self.models.len(),
            "document saved"
        );
        Ok(())
    }

    /// Reads `path` and loads it into the models. See
    /// [`from_json`](Self::from_json).
    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let json: Value = serde_json::from_str(&text)?;
        self.from_json(&json)?;
        tracing::debug!(
            target: targets::SERIALIZATION,
            path = %path.display(),
            "document loaded"
        );
        Ok(())
    }
}
