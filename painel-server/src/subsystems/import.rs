use painel_core::models::{CsvFile, RecordKind};
use painel_core::store::DocumentStore;
use painel_core::SessionContext;
use painel_ingest::{import_csv, ImportError, ImportForm, ImportReport};

/// Import one uploaded CSV file.
///
/// The company id falls back to `default_company_id` when the request omits
/// it or leaves it blank.
pub async fn import_upload(
    kind: RecordKind,
    company_id: Option<String>,
    file: Option<CsvFile>,
    default_company_id: &str,
    ctx: &SessionContext,
    store: &dyn DocumentStore,
) -> Result<ImportReport, ImportError> {
    let company_id = company_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| default_company_id.to_string());

    let mut form = ImportForm::new(kind, company_id);
    form.file = file;

    import_csv(&mut form, ctx, store).await
}
