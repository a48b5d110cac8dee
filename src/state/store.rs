use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

use super::data::{NewReport, PotholeReport};
use crate::error::Result;

const SELECT_REPORTS: &str = "SELECT id, timestamp, image_path, latitude, longitude, severity, address
     FROM pothole_reports
     ORDER BY timestamp DESC, id ASC";

/// The ReportStore owns the SQLite database of pothole reports.
/// Rows are only ever appended or wiped wholesale; nothing is updated in place.
pub struct ReportStore {
    conn: Connection,
}

impl ReportStore {
    /// Open (or create) the store at `db_path`, creating parent directories.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        info!("📁 Report store opened at: {}", db_path.display());

        let store = ReportStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let store = ReportStore {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS pothole_reports (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp       INTEGER NOT NULL,
                image_path      TEXT NOT NULL,
                latitude        REAL NOT NULL,
                longitude       REAL NOT NULL,
                severity        INTEGER NOT NULL DEFAULT 1,
                address         TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pothole_reports_timestamp
             ON pothole_reports(timestamp DESC)",
            [],
        )?;

        debug!("Report store schema ready");
        Ok(())
    }

    /// Append a report in its own transaction and return its new ID.
    /// Nothing is visible unless the commit succeeds.
    pub fn insert(&mut self, report: &NewReport) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = insert_report(&tx, report)?;
        tx.commit()?;
        Ok(id)
    }

    /// All reports, newest first. Reports sharing a timestamp keep insertion order.
    pub fn get_all_reports(&self) -> Result<Vec<PotholeReport>> {
        let mut stmt = self.conn.prepare(SELECT_REPORTS)?;
        let reports = stmt
            .query_map([], report_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reports)
    }

    /// Delete every report in one transaction.
    /// Returns the image paths the deleted reports referenced.
    pub fn clear_all(&mut self) -> Result<Vec<String>> {
        let tx = self.conn.transaction()?;
        let paths = image_paths(&tx)?;
        tx.execute("DELETE FROM pothole_reports", [])?;
        tx.commit()?;
        Ok(paths)
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pothole_reports", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Every image path referenced by a report
    pub fn image_paths(&self) -> Result<Vec<String>> {
        image_paths(&self.conn)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn insert_report(conn: &Connection, report: &NewReport) -> Result<i64> {
    conn.execute(
        "INSERT INTO pothole_reports (timestamp, image_path, latitude, longitude, severity, address)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            report.timestamp,
            report.image_path,
            report.latitude,
            report.longitude,
            report.severity,
            report.address,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn image_paths(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT image_path FROM pothole_reports")?;
    let paths = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(paths)
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<PotholeReport> {
    Ok(PotholeReport {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        image_path: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        severity: row.get(5)?,
        address: row.get(6)?,
    })
}

impl std::fmt::Debug for ReportStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportStore")
            .field("path", &self.conn.path())
            .finish()
    }
}
