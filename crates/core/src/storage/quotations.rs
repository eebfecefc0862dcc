use rusqlite::{Result, Row};

use super::{now_ts, Quotation, QuotationUpdate, Storage};

const QUOTATION_SELECT_SQL: &str = "SELECT
    id, created_at, updated_at, period, configuration, origin_code, destination_code,
    cargo_type, unit_type, logistics_hours, quotes_json, user_id, company_name, notes,
    status, total_cost, selected_quote_index
 FROM quotations";

impl Storage {
    /// Inserts a quotation and returns its row id. `quotation.id` is ignored.
    pub fn insert_quotation(&self, quotation: &Quotation) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO quotations (
                created_at, updated_at, period, configuration, origin_code, destination_code,
                cargo_type, unit_type, logistics_hours, quotes_json, user_id, company_name,
                notes, status, total_cost, selected_quote_index
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            (
                quotation.created_at,
                quotation.updated_at,
                &quotation.period,
                &quotation.configuration,
                &quotation.origin_code,
                &quotation.destination_code,
                &quotation.cargo_type,
                &quotation.unit_type,
                quotation.logistics_hours,
                &quotation.quotes_json,
                &quotation.user_id,
                &quotation.company_name,
                &quotation.notes,
                &quotation.status,
                quotation.total_cost,
                quotation.selected_quote_index,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Without a status filter, soft-deleted rows are excluded in SQL so
    /// limit/offset paginate over visible rows only.
    pub fn list_quotations(
        &self,
        user_id: &str,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Quotation>> {
        let normalized_limit = if limit <= 0 { 100 } else { limit.min(100) };
        let normalized_offset = offset.max(0);
        let mut out = Vec::new();
        match status {
            Some(status) => {
                let sql = format!(
                    "{QUOTATION_SELECT_SQL}
                     WHERE user_id = ?1 AND status = ?2
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?3 OFFSET ?4"
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let mut rows = stmt.query((user_id, status, normalized_limit, normalized_offset))?;
                while let Some(row) = rows.next()? {
                    out.push(map_quotation_row(row)?);
                }
            }
            None => {
                let sql = format!(
                    "{QUOTATION_SELECT_SQL}
                     WHERE user_id = ?1 AND status != 'deleted'
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?2 OFFSET ?3"
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let mut rows = stmt.query((user_id, normalized_limit, normalized_offset))?;
                while let Some(row) = rows.next()? {
                    out.push(map_quotation_row(row)?);
                }
            }
        }
        Ok(out)
    }

    pub fn find_quotation(&self, id: i64, user_id: &str) -> Result<Option<Quotation>> {
        let sql = format!("{QUOTATION_SELECT_SQL} WHERE id = ?1 AND user_id = ?2 LIMIT 1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query((id, user_id))?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_quotation_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Applies the provided metadata fields; absent fields keep their stored
    /// value. Returns false when no row matched.
    pub fn update_quotation(
        &self,
        id: i64,
        user_id: &str,
        update: &QuotationUpdate,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE quotations
             SET company_name = COALESCE(?1, company_name),
                 notes = COALESCE(?2, notes),
                 selected_quote_index = COALESCE(?3, selected_quote_index),
                 status = COALESCE(?4, status),
                 updated_at = ?5
             WHERE id = ?6 AND user_id = ?7",
            (
                &update.company_name,
                &update.notes,
                update.selected_quote_index,
                &update.status,
                now_ts(),
                id,
                user_id,
            ),
        )?;
        Ok(changed > 0)
    }

    /// Marks the quotation deleted instead of removing the row.
    pub fn soft_delete_quotation(&self, id: i64, user_id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE quotations
             SET status = 'deleted', updated_at = ?1
             WHERE id = ?2 AND user_id = ?3",
            (now_ts(), id, user_id),
        )?;
        Ok(changed > 0)
    }

    pub fn quotation_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(1) FROM quotations", [], |row| row.get(0))
    }

    pub(super) fn ensure_quotations_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS quotations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                period TEXT NOT NULL,
                configuration TEXT NOT NULL,
                origin_code TEXT NOT NULL,
                destination_code TEXT NOT NULL,
                cargo_type TEXT,
                unit_type TEXT,
                logistics_hours REAL NOT NULL DEFAULT 0,
                quotes_json TEXT NOT NULL,
                user_id TEXT NOT NULL,
                company_name TEXT,
                notes TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                total_cost REAL
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quotations_user_created_at
             ON quotations(user_id, created_at DESC)",
            [],
        )?;
        Ok(())
    }

    pub(super) fn ensure_quotation_selected_index_column(&self) -> Result<()> {
        self.ensure_column("quotations", "selected_quote_index", "INTEGER")?;
        Ok(())
    }
}

fn map_quotation_row(row: &Row<'_>) -> Result<Quotation> {
    Ok(Quotation {
        id: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        period: row.get(3)?,
        configuration: row.get(4)?,
        origin_code: row.get(5)?,
        destination_code: row.get(6)?,
        cargo_type: row.get(7)?,
        unit_type: row.get(8)?,
        logistics_hours: row.get(9)?,
        quotes_json: row.get(10)?,
        user_id: row.get(11)?,
        company_name: row.get(12)?,
        notes: row.get(13)?,
        status: row.get(14)?,
        total_cost: row.get(15)?,
        selected_quote_index: row.get(16)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::{now_ts, Quotation, QuotationUpdate, Storage};

    fn sample_quotation(user_id: &str) -> Quotation {
        Quotation {
            id: 0,
            created_at: now_ts(),
            updated_at: now_ts(),
            period: "202401".to_string(),
            configuration: "3S3".to_string(),
            origin_code: "11001000".to_string(),
            destination_code: "05001000".to_string(),
            cargo_type: Some("GENERAL".to_string()),
            unit_type: None,
            logistics_hours: 2.0,
            quotes_json: "{}".to_string(),
            user_id: user_id.to_string(),
            company_name: None,
            notes: None,
            status: "active".to_string(),
            total_cost: Some(110_000.0),
            selected_quote_index: None,
        }
    }

    #[test]
    fn list_is_scoped_to_the_owning_user() {
        let storage = Storage::open_in_memory().expect("open");
        storage.init().expect("init");
        storage.insert_quotation(&sample_quotation("user-a")).expect("insert a");
        storage.insert_quotation(&sample_quotation("user-b")).expect("insert b");

        let rows = storage.list_quotations("user-a", None, 100, 0).expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "user-a");
    }

    #[test]
    fn update_keeps_absent_fields() {
        let storage = Storage::open_in_memory().expect("open");
        storage.init().expect("init");
        let mut quotation = sample_quotation("user-a");
        quotation.company_name = Some("Liftit".to_string());
        let id = storage.insert_quotation(&quotation).expect("insert");

        let update = QuotationUpdate {
            notes: Some("negotiated".to_string()),
            ..QuotationUpdate::default()
        };
        assert!(storage.update_quotation(id, "user-a", &update).expect("update"));

        let stored = storage
            .find_quotation(id, "user-a")
            .expect("find")
            .expect("present");
        assert_eq!(stored.company_name.as_deref(), Some("Liftit"));
        assert_eq!(stored.notes.as_deref(), Some("negotiated"));
    }

    #[test]
    fn soft_delete_marks_status_and_survives_in_filtered_list() {
        let storage = Storage::open_in_memory().expect("open");
        storage.init().expect("init");
        let id = storage.insert_quotation(&sample_quotation("user-a")).expect("insert");

        assert!(storage.soft_delete_quotation(id, "user-a").expect("delete"));
        assert_eq!(storage.quotation_count().expect("count"), 1);

        let active = storage
            .list_quotations("user-a", Some("active"), 100, 0)
            .expect("list active");
        assert!(active.is_empty());
        let deleted = storage
            .list_quotations("user-a", Some("deleted"), 100, 0)
            .expect("list deleted");
        assert_eq!(deleted.len(), 1);
    }

    #[test]
    fn default_list_paginates_over_visible_rows_only() {
        let storage = Storage::open_in_memory().expect("open");
        storage.init().expect("init");
        let mut oldest = sample_quotation("user-a");
        oldest.created_at = 100;
        let mut middle = sample_quotation("user-a");
        middle.created_at = 200;
        let mut newest = sample_quotation("user-a");
        newest.created_at = 300;
        storage.insert_quotation(&oldest).expect("insert oldest");
        let middle_id = storage.insert_quotation(&middle).expect("insert middle");
        storage.insert_quotation(&newest).expect("insert newest");

        assert!(storage.soft_delete_quotation(middle_id, "user-a").expect("delete"));

        // The deleted row sits inside the first page's window; the page
        // must still be full.
        let page = storage.list_quotations("user-a", None, 2, 0).expect("list");
        assert_eq!(page.len(), 2);
        assert!(page.iter().all(|row| row.status != "deleted"));
        assert_eq!(page[0].created_at, 300);
        assert_eq!(page[1].created_at, 100);
    }

    #[test]
    fn update_for_foreign_user_touches_nothing() {
        let storage = Storage::open_in_memory().expect("open");
        storage.init().expect("init");
        let id = storage.insert_quotation(&sample_quotation("user-a")).expect("insert");

        let update = QuotationUpdate {
            status: Some("archived".to_string()),
            ..QuotationUpdate::default()
        };
        assert!(!storage.update_quotation(id, "user-b", &update).expect("update"));
        assert!(storage.find_quotation(id, "user-b").expect("find").is_none());
    }
}
