use serde::{Deserialize, Serialize};

/// One income/expense entry. `date` is kept as the text found in the import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expense: f64,
    #[serde(default)]
    pub date: String,
}
