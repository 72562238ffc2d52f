pub mod company;
pub mod employee;
pub mod financial;
pub mod message;
pub mod project;

use serde::{Deserialize, Serialize};

pub use company::{Company, CompanyMembership, CompanyRegistration};
pub use employee::EmployeeRecord;
pub use financial::FinancialRecord;
pub use message::{Message, Sender};
pub use project::{Project, ProjectRecord, ProjectStatus};

/// A CSV file chosen for import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvFile {
    pub name: String,
    pub content: String,
}

/// Which projection and target collection an import batch uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[serde(alias = "employee")]
    Employees,
    #[serde(alias = "project")]
    Projects,
    #[serde(alias = "financials")]
    Financial,
}

impl RecordKind {
    /// Collection name under `companies/{id}/`.
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Employees => "employees",
            RecordKind::Projects => "projects",
            RecordKind::Financial => "financials",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Employees => "employees",
            RecordKind::Projects => "projects",
            RecordKind::Financial => "financial",
        }
    }
}
