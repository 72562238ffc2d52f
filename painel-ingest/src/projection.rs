//! Row table → typed records
//!
//! Headers are matched case-insensitively against lower-cased English names.
//! A missing column or a short row reads as "absent": empty text or zero.
//! Numeric cells that do not parse become 0.0. Rows are never dropped.

use std::collections::HashMap;

use chrono::NaiveDate;
use painel_core::models::{
    EmployeeRecord, FinancialRecord, ProjectRecord, ProjectStatus, RecordKind,
};
use serde::Serialize;
use serde_json::Value;

pub mod headers {
    pub const NAME: &str = "name";
    pub const ROLE: &str = "role";
    pub const INCOME: &str = "income";
    pub const EXPENSE: &str = "expense";
    pub const DATE: &str = "date";
    pub const CLIENT_NAME: &str = "client name";
    pub const PROJECT_NAME: &str = "project name";
    pub const RESPONSIBLE_EMPLOYEES: &str = "responsible employees";
    pub const LEADERSHIP: &str = "leadership";
    pub const DELIVERY_DATE: &str = "delivery date";
    pub const COMPLETION_DATE: &str = "completion date";
    pub const STATUS: &str = "status";
}

/// A leniently parsed value and whether it fell back to the default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lenient<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Lenient<T> {
    fn parsed(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    fn defaulted(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

/// Parse a numeric cell from its longest numeric prefix, so `1500.00 BRL`
/// reads as 1500. No prefix, or a non-finite value, yields 0.0.
pub fn parse_amount(raw: Option<&str>) -> Lenient<f64> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Lenient::defaulted(0.0);
    };

    let prefix = float_prefix(s);
    match prefix.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            if prefix.len() < s.len() {
                tracing::debug!(raw = s, value = v, "Trailing text after number ignored");
            }
            Lenient::parsed(v)
        }
        _ => {
            tracing::debug!(raw = s, "Non-numeric cell defaulted to 0");
            Lenient::defaulted(0.0)
        }
    }
}

/// Longest prefix of `s` shaped like `[+-]digits[.digits][e[+-]digits]`.
/// Empty when `s` does not start with a number.
fn float_prefix(s: &str) -> &str {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = if matches!(b.first(), Some(b'+' | b'-')) { 1 } else { 0 };
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if b.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if has_digits || frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return "";
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(b.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }

    &s[..end]
}

/// Column positions keyed by lower-cased header name.
#[derive(Debug)]
pub struct Columns {
    positions: HashMap<String, usize>,
}

impl Columns {
    pub fn from_header(header: &[String]) -> Self {
        let mut positions = HashMap::new();
        for (i, name) in header.iter().enumerate() {
            // First occurrence wins for duplicated headers.
            positions.entry(name.trim().to_lowercase()).or_insert(i);
        }
        Self { positions }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Cell text, or `None` when the column is unknown or the row is short.
    pub fn cell<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.position(name)
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }

    fn text(&self, row: &[String], name: &str) -> String {
        self.cell(row, name).unwrap_or_default().to_string()
    }

    fn non_empty(&self, row: &[String], name: &str) -> Option<String> {
        self.cell(row, name)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn split_table(table: &[Vec<String>]) -> Option<(Columns, &[Vec<String>])> {
    let (header, rows) = table.split_first()?;
    Some((Columns::from_header(header), rows))
}

pub fn project_employees(table: &[Vec<String>]) -> Vec<EmployeeRecord> {
    let Some((cols, rows)) = split_table(table) else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| EmployeeRecord {
            name: cols.text(row, headers::NAME),
            role: cols.text(row, headers::ROLE),
            income: parse_amount(cols.cell(row, headers::INCOME)).value,
        })
        .collect()
}

pub fn project_projects(table: &[Vec<String>]) -> Vec<ProjectRecord> {
    let Some((cols, rows)) = split_table(table) else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| ProjectRecord {
            client_name: cols.text(row, headers::CLIENT_NAME),
            project_name: cols.text(row, headers::PROJECT_NAME),
            leadership: cols.text(row, headers::LEADERSHIP),
            delivery_date: cols.text(row, headers::DELIVERY_DATE),
            completion_date: cols.non_empty(row, headers::COMPLETION_DATE),
            status: ProjectStatus::parse_lenient(
                cols.cell(row, headers::STATUS).unwrap_or_default(),
            ),
            responsible_employees: split_names(
                cols.cell(row, headers::RESPONSIBLE_EMPLOYEES).unwrap_or_default(),
            ),
        })
        .collect()
}

/// `today` fills in rows without a date.
pub fn project_financials(table: &[Vec<String>], today: NaiveDate) -> Vec<FinancialRecord> {
    let Some((cols, rows)) = split_table(table) else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| FinancialRecord {
            income: parse_amount(cols.cell(row, headers::INCOME)).value,
            expense: parse_amount(cols.cell(row, headers::EXPENSE)).value,
            date: cols
                .non_empty(row, headers::DATE)
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
        })
        .collect()
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Projected records of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportRecords {
    Employees(Vec<EmployeeRecord>),
    Projects(Vec<ProjectRecord>),
    Financial(Vec<FinancialRecord>),
}

impl ImportRecords {
    pub fn project(kind: RecordKind, table: &[Vec<String>], today: NaiveDate) -> Self {
        match kind {
            RecordKind::Employees => ImportRecords::Employees(project_employees(table)),
            RecordKind::Projects => ImportRecords::Projects(project_projects(table)),
            RecordKind::Financial => {
                ImportRecords::Financial(project_financials(table, today))
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ImportRecords::Employees(r) => r.len(),
            ImportRecords::Projects(r) => r.len(),
            ImportRecords::Financial(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize each record and stamp it with `createdAt` / `createdBy`.
    pub fn into_documents(
        self,
        created_at: &str,
        created_by: &str,
    ) -> Result<Vec<Value>, serde_json::Error> {
        match self {
            ImportRecords::Employees(r) => stamp_all(r, created_at, created_by),
            ImportRecords::Projects(r) => stamp_all(r, created_at, created_by),
            ImportRecords::Financial(r) => stamp_all(r, created_at, created_by),
        }
    }
}

fn stamp_all<T: Serialize>(
    records: Vec<T>,
    created_at: &str,
    created_by: &str,
) -> Result<Vec<Value>, serde_json::Error> {
    records
        .into_iter()
        .map(|record| {
            let mut value = serde_json::to_value(record)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("createdAt".to_string(), Value::from(created_at));
                obj.insert("createdBy".to_string(), Value::from(created_by));
            }
            Ok(value)
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
