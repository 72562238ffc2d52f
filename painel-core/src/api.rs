use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CompanyRegistration, CsvFile, ProjectRecord, ProjectStatus, RecordKind};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PainelRequest {
    Ping,
    Health,
    Import {
        kind: RecordKind,
        company_id: Option<String>,
        file: Option<CsvFile>,
    },
    Chat {
        session_id: Option<Uuid>,
        message: String,
    },
    Transcript {
        session_id: Uuid,
    },
    EndChat {
        session_id: Uuid,
    },
    RegisterCompany {
        company: CompanyRegistration,
    },
    ListProjects {
        status: Option<ProjectStatus>,
        search: Option<String>,
    },
    CreateProject {
        project: ProjectRecord,
    },
    Dashboard,
}

/// Broad failure class, used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    NotFound,
    Upstream,
    Internal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PainelResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub version: String,
}

impl PainelResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            error_kind: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self::err_kind(ErrorKind::Internal, msg)
    }

    pub fn err_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            error_kind: Some(kind),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
