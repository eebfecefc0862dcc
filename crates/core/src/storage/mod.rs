use rusqlite::{Connection, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

mod call_logs;
mod quotations;

pub fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Lifecycle states a quotation can move through.
pub const QUOTATION_STATUSES: [&str; 3] = ["active", "archived", "deleted"];

pub fn is_valid_quotation_status(value: &str) -> bool {
    QUOTATION_STATUSES.contains(&value)
}

/// One persisted quotation: the request that was quoted, the quotes SICETAC
/// returned (serialized as JSON) and the caller-supplied metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    pub id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub period: String,
    pub configuration: String,
    pub origin_code: String,
    pub destination_code: String,
    pub cargo_type: Option<String>,
    pub unit_type: Option<String>,
    pub logistics_hours: f64,
    pub quotes_json: String,
    pub user_id: String,
    pub company_name: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub total_cost: Option<f64>,
    pub selected_quote_index: Option<i64>,
}

/// Metadata fields a caller may change after a quotation was stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuotationUpdate {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub selected_quote_index: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Outcome record of one upstream SICETAC call.
#[derive(Debug, Clone, Serialize)]
pub struct SoapCallLog {
    pub endpoint: String,
    pub status: String,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub created_at: i64,
}

pub struct Storage {
    pub(crate) conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.ensure_quotations_table()?;
        self.ensure_quotation_selected_index_column()?;
        self.ensure_call_logs_table()?;
        Ok(())
    }

    pub(crate) fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        let sql = format!("PRAGMA table_info({table})");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            if name == column {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(crate) fn ensure_column(&self, table: &str, column: &str, kind: &str) -> Result<()> {
        if self.has_column(table, column)? {
            return Ok(());
        }
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {kind}");
        self.conn.execute(&sql, [])?;
        Ok(())
    }
}
