//! Batch import of a CSV file into a company's collection.
//!
//! Validation runs before any write: file chosen, actor present, at least a
//! header and one data row. The records are then committed as one atomic
//! batch to `companies/{company_id}/{collection}`.

use chrono::Utc;
use painel_core::models::{CsvFile, RecordKind};
use painel_core::store::{CollectionPath, DocumentStore, DocumentWrite, StoreError};
use painel_core::SessionContext;
use serde::Serialize;
use thiserror::Error;

use crate::parser::parse_csv;
use crate::projection::ImportRecords;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("no file selected: please select a CSV file to import")]
    NoFileSelected,

    #[error("authentication error: you must be logged in to import data")]
    Unauthenticated,

    #[error("CSV file must contain headers and at least one data row")]
    TooFewRows,

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ImportError {
    /// True for failures detected before anything was written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ImportError::NoFileSelected | ImportError::Unauthenticated | ImportError::TooFewRows
        )
    }
}

/// Import form state: the selected kind, target company and chosen file.
#[derive(Debug, Clone)]
pub struct ImportForm {
    pub kind: RecordKind,
    pub company_id: String,
    pub file: Option<CsvFile>,
}

impl ImportForm {
    pub fn new(kind: RecordKind, company_id: impl Into<String>) -> Self {
        Self {
            kind,
            company_id: company_id.into(),
            file: None,
        }
    }

    pub fn with_file(mut self, file: CsvFile) -> Self {
        self.file = Some(file);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub kind: RecordKind,
    pub company_id: String,
    pub file_name: String,
    pub imported: usize,
}

/// Run the import. On success the form's file selection is cleared; on any
/// error the form is left untouched and nothing has been committed.
pub async fn import_csv(
    form: &mut ImportForm,
    ctx: &SessionContext,
    store: &dyn DocumentStore,
) -> Result<ImportReport, ImportError> {
    let file = match &form.file {
        Some(f) if !f.content.is_empty() => f,
        _ => return Err(ImportError::NoFileSelected),
    };

    let actor = ctx.actor.as_ref().ok_or(ImportError::Unauthenticated)?;

    let table = parse_csv(&file.content);
    if table.len() < 2 {
        tracing::warn!(file = %file.name, rows = table.len(), "Rejected CSV without data rows");
        return Err(ImportError::TooFewRows);
    }

    let now = Utc::now();
    let records = ImportRecords::project(form.kind, &table, now.date_naive());
    let imported = records.len();

    let collection = CollectionPath::company(&form.company_id, form.kind.collection());
    let writes: Vec<DocumentWrite> = records
        .into_documents(&now.to_rfc3339(), &actor.uid)?
        .into_iter()
        .map(|doc| DocumentWrite::new(collection.clone(), doc))
        .collect();

    if let Err(e) = store.write_batch(writes).await {
        tracing::error!(
            collection = %collection,
            backend = store.name(),
            error = %e,
            "Import batch commit failed"
        );
        return Err(e.into());
    }

    tracing::info!(
        collection = %collection,
        imported,
        created_by = %actor.uid,
        "Imported {} records",
        form.kind.label()
    );

    let report = ImportReport {
        kind: form.kind,
        company_id: form.company_id.clone(),
        file_name: file.name.clone(),
        imported,
    };
    form.file = None;

    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================
