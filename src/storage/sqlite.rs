use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::Result;
use crate::models::{Insight, Role};

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self { conn };
        storage.init_db()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn };
        storage.init_db()?;
        Ok(storage)
    }

    fn init_db(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS seen_items (
                fingerprint TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                first_seen TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS insights (
                id INTEGER PRIMARY KEY,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                source TEXT NOT NULL,
                vendor TEXT,
                urgency TEXT NOT NULL,
                relevance_score REAL NOT NULL,
                insight_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(url)
            );

            CREATE TABLE IF NOT EXISTS digests (
                id INTEGER PRIMARY KEY,
                run_date TEXT NOT NULL,
                role TEXT NOT NULL,
                recipients INTEGER NOT NULL,
                path TEXT NOT NULL,
                UNIQUE(run_date, role)
            );

            CREATE INDEX IF NOT EXISTS idx_insights_created_at ON insights(created_at);
            CREATE INDEX IF NOT EXISTS idx_insights_vendor ON insights(vendor);
            "#,
        )?;

        Ok(())
    }

    pub fn is_seen(&self, fingerprint: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM seen_items WHERE fingerprint = ?1",
                params![fingerprint],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Returns false when the fingerprint was already recorded.
    pub fn mark_seen(&self, fingerprint: &str, url: &str, title: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO seen_items (fingerprint, url, title, first_seen)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![fingerprint, url, title, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    pub fn save_insights(&mut self, insights: &[Insight]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut saved = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO insights
                    (url, title, source, vendor, urgency, relevance_score, insight_json, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(url) DO UPDATE SET
                    title = excluded.title,
                    vendor = excluded.vendor,
                    urgency = excluded.urgency,
                    relevance_score = excluded.relevance_score,
                    insight_json = excluded.insight_json
                "#,
            )?;

            for insight in insights {
                let insight_json = serde_json::to_string(insight)?;
                saved += stmt.execute(params![
                    insight.url,
                    insight.title,
                    insight.source,
                    insight.vendor,
                    insight.urgency.to_string(),
                    insight.relevance_score,
                    insight_json,
                    insight.created_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(saved)
    }

    /// Insights created at or after `since`, highest score first.
    pub fn recent_insights(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Insight>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT insight_json FROM insights
            WHERE created_at >= ?1
            ORDER BY relevance_score DESC, created_at DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![since.to_rfc3339(), limit as i64], |row| {
            row.get::<_, String>(0)
        })?;

        let mut insights = Vec::new();
        for row in rows {
            let json = row?;
            match serde_json::from_str::<Insight>(&json) {
                Ok(insight) => insights.push(insight),
                Err(e) => tracing::warn!("Skipping unreadable stored insight: {}", e),
            }
        }
        Ok(insights)
    }

    pub fn record_digest(
        &self,
        run_date: NaiveDate,
        role: Role,
        recipients: usize,
        path: &Path,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO digests (run_date, role, recipients, path)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(run_date, role) DO UPDATE SET
                recipients = excluded.recipients,
                path = excluded.path
            "#,
            params![
                run_date.to_string(),
                role.to_string(),
                recipients as i64,
                path.to_string_lossy(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Urgency;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn insight(url: &str, score: f64, urgency: Urgency) -> Insight {
        let mut summaries = BTreeMap::new();
        summaries.insert(Role::Executive, format!("summary for {}", url));
        Insight {
            title: format!("title {}", url),
            url: url.to_string(),
            source: "reddit".into(),
            vendor: Some("vmware".into()),
            urgency,
            relevance_score: score,
            summaries,
            key_points: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mark_seen_is_idempotent() {
        let storage = Storage::in_memory().unwrap();
        assert!(!storage.is_seen("abc").unwrap());
        assert!(storage.mark_seen("abc", "https://u", "t").unwrap());
        assert!(!storage.mark_seen("abc", "https://u", "t").unwrap());
        assert!(storage.is_seen("abc").unwrap());
    }

    #[test]
    fn test_recent_insights_sorted_by_score() {
        let mut storage = Storage::in_memory().unwrap();
        storage
            .save_insights(&[
                insight("https://a", 3.0, Urgency::Low),
                insight("https://b", 9.0, Urgency::High),
            ])
            .unwrap();

        let recent = storage.recent_insights(Utc::now() - Duration::hours(1), 10).unwrap();
        let urls: Vec<&str> = recent.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b", "https://a"]);
        assert_eq!(recent[0].urgency, Urgency::High);
    }

    #[test]
    fn test_save_insights_upserts_by_url() {
        let mut storage = Storage::in_memory().unwrap();
        storage.save_insights(&[insight("https://a", 3.0, Urgency::Low)]).unwrap();
        storage.save_insights(&[insight("https://a", 7.0, Urgency::High)]).unwrap();

        let recent = storage.recent_insights(Utc::now() - Duration::hours(1), 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].urgency, Urgency::High);
    }

    #[test]
    fn test_record_digest_replaces_same_day_role() {
        let storage = Storage::in_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        storage.record_digest(day, Role::Sales, 2, Path::new("a.html")).unwrap();
        storage.record_digest(day, Role::Sales, 3, Path::new("b.html")).unwrap();

        let rows: Vec<(String, i64, String)> = storage
            .conn
            .prepare("SELECT role, recipients, path FROM digests")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![("sales".to_string(), 3, "b.html".to_string())]);
    }
}
