use chrono::Utc;
use painel_core::models::{Company, CompanyMembership, CompanyRegistration};
use painel_core::store::{CollectionPath, DocumentStore, DocumentWrite};
use painel_core::{PainelError, SessionContext};
use uuid::Uuid;

/// Register a company and make the acting user its admin.
///
/// Both documents go out in one batch so a user never ends up with a
/// membership pointing at a missing company.
pub async fn register_company(
    ctx: &SessionContext,
    store: &dyn DocumentStore,
    registration: CompanyRegistration,
) -> Result<String, PainelError> {
    let actor = ctx.require_actor()?;

    let name = registration.name.trim();
    if name.is_empty() {
        return Err(PainelError::Validation("company name is required".to_string()));
    }

    let company_id = Uuid::new_v4().simple().to_string();
    let now = Utc::now().to_rfc3339();

    let company = Company {
        name: name.to_string(),
        description: registration.description,
        address: registration.address,
        phone: registration.phone,
        website: registration.website,
        created_by: actor.uid.clone(),
        created_at: now.clone(),
    };
    let membership = CompanyMembership {
        company_id: company_id.clone(),
        role: "admin".to_string(),
        added_at: now,
    };

    store
        .write_batch(vec![
            DocumentWrite::with_id(
                CollectionPath::companies(),
                &company_id,
                serde_json::to_value(&company).map_err(painel_core::StoreError::from)?,
            ),
            DocumentWrite::with_id(
                CollectionPath::user_companies(&actor.uid),
                &company_id,
                serde_json::to_value(&membership).map_err(painel_core::StoreError::from)?,
            ),
        ])
        .await?;

    tracing::info!(company_id = %company_id, created_by = %actor.uid, "Company registered");
    Ok(company_id)
}

/// Ids of the companies the user belongs to, in membership order.
pub async fn company_ids_for(
    store: &dyn DocumentStore,
    uid: &str,
) -> Result<Vec<String>, PainelError> {
    let memberships = store.list(&CollectionPath::user_companies(uid)).await?;
    Ok(memberships
        .into_iter()
        .map(|doc| {
            doc.data
                .get("companyId")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or(doc.id)
        })
        .collect())
}
