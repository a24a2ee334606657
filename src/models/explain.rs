//! Normalized execution plan model.

use serde::Serialize;

/// Summary used when a plan yields no estimate, index or scan.
pub const NO_PLAN_DETAILS: &str = "No plan details available";

/// Warning added when a plan scans tables without touching any index.
pub const NO_INDEXES_WARNING: &str =
    "No indexes used - consider adding indexes on filtered or joined columns";

/// Dialect-independent reduction of an execution plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainResult {
    pub summary: String,
    /// Each index name appears once, in first-seen order
    pub indexes_used: Vec<String>,
    pub sequential_scans: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_rows: Option<u64>,
    pub warnings: Vec<String>,
}

impl ExplainResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an index, ignoring names already seen.
    pub fn record_index(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.indexes_used.contains(&name) {
            self.indexes_used.push(name);
        }
    }

    /// Record a full scan of `table` together with its warning.
    pub fn record_sequential_scan(&mut self, table: impl Into<String>, rows: Option<u64>) {
        let table = table.into();
        let warning = match rows {
            Some(rows) => format!("Sequential scan on table '{}' (~{} rows)", table, rows),
            None => format!("Sequential scan on table '{}'", table),
        };
        self.sequential_scans.push(table);
        self.warnings.push(warning);
    }

    /// Universal pass run after every dialect reduction.
    pub fn finalize(&mut self) {
        if !self.sequential_scans.is_empty() && self.indexes_used.is_empty() {
            self.warnings.push(NO_INDEXES_WARNING.to_string());
        }

        let mut parts = Vec::new();
        if let Some(rows) = self.estimated_rows {
            parts.push(format!("~{} estimated rows", rows));
        }
        if !self.indexes_used.is_empty() {
            parts.push(format!("{} index(es) used", self.indexes_used.len()));
        }
        if !self.sequential_scans.is_empty() {
            parts.push(format!(
                "{} sequential scan(s)",
                self.sequential_scans.len()
            ));
        }

        self.summary = if parts.is_empty() {
            NO_PLAN_DETAILS.to_string()
        } else {
            parts.join(", ")
        };
    }
}
