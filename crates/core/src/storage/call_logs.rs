use rusqlite::{Result, Row};

use super::{SoapCallLog, Storage};

impl Storage {
    pub fn insert_soap_call_log(&self, log: &SoapCallLog) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO soap_call_logs (endpoint, status, error, duration_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &log.endpoint,
                &log.status,
                &log.error,
                log.duration_ms,
                log.created_at,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_soap_call_logs(&self, limit: i64) -> Result<Vec<SoapCallLog>> {
        let normalized_limit = if limit <= 0 { 200 } else { limit.min(1000) };
        let mut stmt = self.conn.prepare(
            "SELECT endpoint, status, error, duration_ms, created_at
             FROM soap_call_logs
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;
        let mut rows = stmt.query([normalized_limit])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map_call_log_row(row)?);
        }
        Ok(out)
    }

    pub fn clear_soap_call_logs(&self) -> Result<()> {
        self.conn.execute("DELETE FROM soap_call_logs", [])?;
        Ok(())
    }

    pub(super) fn ensure_call_logs_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS soap_call_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                endpoint TEXT NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                duration_ms INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_soap_call_logs_created_at
             ON soap_call_logs(created_at DESC)",
            [],
        )?;
        Ok(())
    }
}

fn map_call_log_row(row: &Row<'_>) -> Result<SoapCallLog> {
    Ok(SoapCallLog {
        endpoint: row.get(0)?,
        status: row.get(1)?,
        error: row.get(2)?,
        duration_ms: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::{now_ts, SoapCallLog, Storage};

    #[test]
    fn call_logs_round_trip_and_clear() {
        let storage = Storage::open_in_memory().expect("open");
        storage.init().expect("init");

        storage
            .insert_soap_call_log(&SoapCallLog {
                endpoint: "http://rndcws.example/ws/rndcService".to_string(),
                status: "ok".to_string(),
                error: None,
                duration_ms: 812,
                created_at: now_ts(),
            })
            .expect("insert ok log");
        storage
            .insert_soap_call_log(&SoapCallLog {
                endpoint: "http://rndcws.example/ws/rndcService".to_string(),
                status: "transport".to_string(),
                error: Some("connect timed out".to_string()),
                duration_ms: 60_000,
                created_at: now_ts(),
            })
            .expect("insert error log");

        let logs = storage.list_soap_call_logs(10).expect("list");
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().any(|log| log.error.is_some()));

        storage.clear_soap_call_logs().expect("clear");
        assert!(storage.list_soap_call_logs(10).expect("list again").is_empty());
    }
}
