use painel_core::models::ProjectStatus;
use painel_core::store::{CollectionPath, DocumentStore, Query};
use painel_core::{PainelError, SessionContext};
use serde::Serialize;
use serde_json::Value;

use crate::subsystems::companies::company_ids_for;

/// Totals shown on the dashboard home, summed over every company the actor
/// belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub companies: usize,
    pub employees: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub total_income: f64,
    pub total_expense: f64,
    pub completion_rate: f64,
}

impl DashboardOverview {
    fn finish(mut self) -> Self {
        let projects = self.active_projects + self.completed_projects;
        self.completion_rate = if projects == 0 {
            0.0
        } else {
            self.completed_projects as f64 / projects as f64 * 100.0
        };
        self
    }
}

pub async fn dashboard_overview(
    ctx: &SessionContext,
    store: &dyn DocumentStore,
) -> Result<DashboardOverview, PainelError> {
    let actor = ctx.require_actor()?;
    let company_ids = company_ids_for(store, &actor.uid).await?;

    let mut overview = DashboardOverview {
        companies: company_ids.len(),
        ..Default::default()
    };

    for company_id in &company_ids {
        overview.employees += store
            .list(&CollectionPath::company(company_id, "employees"))
            .await?
            .len();

        let projects = CollectionPath::company(company_id, "projects");
        overview.active_projects +=
            count_with_status(store, &projects, ProjectStatus::Active).await?;
        overview.completed_projects +=
            count_with_status(store, &projects, ProjectStatus::Completed).await?;

        for doc in store
            .list(&CollectionPath::company(company_id, "financials"))
            .await?
        {
            overview.total_income += number_field(&doc.data, "income");
            overview.total_expense += number_field(&doc.data, "expense");
        }
    }

    tracing::debug!(
        uid = %actor.uid,
        companies = overview.companies,
        employees = overview.employees,
        "Dashboard overview computed"
    );
    Ok(overview.finish())
}

async fn count_with_status(
    store: &dyn DocumentStore,
    collection: &CollectionPath,
    status: ProjectStatus,
) -> Result<usize, PainelError> {
    let query = Query::all().where_eq("status", status.as_str());
    Ok(store.query(collection, &query).await?.len())
}

fn number_field(data: &Value, field: &str) -> f64 {
    data.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}
