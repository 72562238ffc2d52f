use serde::{Deserialize, Serialize};

/// Form input for registering a company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRegistration {
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub website: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub created_by: String,
    pub created_at: String,
}

/// Entry under `users/{uid}/companies` linking a user to a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMembership {
    pub company_id: String,
    pub role: String,
    pub added_at: String,
}
