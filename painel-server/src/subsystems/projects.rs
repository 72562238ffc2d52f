use chrono::Utc;
use painel_core::models::{Project, ProjectRecord, ProjectStatus};
use painel_core::store::{CollectionPath, DocumentStore, DocumentWrite, Query};
use painel_core::{PainelError, SessionContext, StoreError};
use serde::Deserialize;

use crate::subsystems::companies::company_ids_for;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
}

/// Projects across every company of the acting user, each company's list
/// ordered by delivery date ascending.
pub async fn list_projects(
    ctx: &SessionContext,
    store: &dyn DocumentStore,
    filter: &ProjectFilter,
) -> Result<Vec<Project>, PainelError> {
    let actor = ctx.require_actor()?;

    let mut query = Query::all();
    if let Some(status) = filter.status {
        query = query.where_eq("status", status.as_str());
    }
    let query = query.order_by("deliveryDate");

    let mut projects = Vec::new();
    for company_id in company_ids_for(store, &actor.uid).await? {
        let docs = store
            .query(&CollectionPath::company(&company_id, "projects"), &query)
            .await?;
        for doc in docs {
            match serde_json::from_value::<ProjectRecord>(doc.data) {
                Ok(record) => projects.push(Project { id: doc.id, record }),
                Err(e) => {
                    tracing::warn!(
                        company_id = %company_id,
                        id = %doc.id,
                        error = %e,
                        "Skipping malformed project document"
                    )
                }
            }
        }
    }

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        projects.retain(|p| p.record.matches_search(term));
    }

    Ok(projects)
}

/// Add a project to the acting user's first company.
pub async fn create_project(
    ctx: &SessionContext,
    store: &dyn DocumentStore,
    record: ProjectRecord,
) -> Result<Project, PainelError> {
    let actor = ctx.require_actor()?;

    let company_id = company_ids_for(store, &actor.uid)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| PainelError::Validation("no company registered".to_string()))?;

    let mut data = serde_json::to_value(&record).map_err(StoreError::from)?;
    if let Some(obj) = data.as_object_mut() {
        obj.insert("createdAt".to_string(), Utc::now().to_rfc3339().into());
        obj.insert("createdBy".to_string(), actor.uid.clone().into());
    }

    let write = DocumentWrite::new(CollectionPath::company(&company_id, "projects"), data);
    let id = write.id.clone();
    store.write_batch(vec![write]).await?;

    tracing::info!(company_id = %company_id, id = %id, "Project created");
    Ok(Project { id, record })
}
