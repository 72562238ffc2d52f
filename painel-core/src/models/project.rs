use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
}

impl ProjectStatus {
    /// `completed` in any case maps to Completed; anything else is Active.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("completed") {
            ProjectStatus::Completed
        } else {
            ProjectStatus::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRecord {
    pub client_name: String,
    pub project_name: String,
    pub leadership: String,
    pub delivery_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    pub status: ProjectStatus,
    pub responsible_employees: Vec<String>,
}

impl ProjectRecord {
    /// Case-insensitive match on project name, client name or leadership.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [&self.project_name, &self.client_name, &self.leadership]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// A stored project together with its document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(flatten)]
    pub record: ProjectRecord,
}
