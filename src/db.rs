use crate::config::Storage;
use crate::model::{Bookmark, NewBookmark};
use crate::store::{BookmarkStore, demo_bookmarks, new_id};
use anyhow::Result;
use async_trait::async_trait;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_bookmarks.sql", include_str!("migrations/001_bookmarks.sql"))];

/// Bookmarks table in a libsql database, either a plain local file or an
/// embedded replica of a remote Turso database.
pub struct LibsqlStore {
    db: LibsqlDatabase,
    conn: Connection,
    tx_lock: Mutex<()>,
    turso_url: Option<String>,
    turso_auth_token: Option<String>,
}

impl LibsqlStore {
    pub fn is_replica(turso_url: &Option<String>, turso_auth_token: &Option<String>) -> bool {
        turso_url.is_some() && turso_auth_token.is_some()
    }

    pub async fn sync(&self) -> Result<()> {
        if Self::is_replica(&self.turso_url, &self.turso_auth_token) {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    pub async fn new(cfg: &Storage, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(&cfg.database);
        let turso_url = cfg.turso_url.clone();
        let turso_auth_token = cfg.turso_auth_token.clone();

        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => Builder::new_local(&path).build().await?,
        };

        let store = Self::open(db, turso_url, turso_auth_token).await?;
        if cfg.seed {
            store.seed(demo_bookmarks()).await?;
        }
        Ok(store)
    }

    /// Throwaway database, used by tests.
    pub async fn in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::open(db, None, None).await
    }

    async fn open(db: LibsqlDatabase, turso_url: Option<String>, turso_auth_token: Option<String>) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(LibsqlStore {
            db,
            conn,
            tx_lock: Mutex::new(()),
            turso_url,
            turso_auth_token,
        })
    }

    /// Inserts `bookmarks` only when the table is empty.
    pub async fn seed(&self, bookmarks: Vec<NewBookmark>) -> Result<()> {
        let _guard = self.tx_lock.lock().await;

        let mut rows = self.conn.query("SELECT COUNT(*) FROM bookmarks", ()).await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        if count > 0 {
            return Ok(());
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = async {
            for bookmark in bookmarks {
                self.insert_row(bookmark.with_id(new_id())).await?;
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;

        match result {
            Ok(_) => {
                self.conn.execute("COMMIT", ()).await?;
                tracing::info!("seeded bookmarks table");
                Ok(())
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn insert_row(&self, bookmark: Bookmark) -> Result<Bookmark> {
        let query = r#"
            INSERT INTO bookmarks (id, title, url, description, rating)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, title, url, description, rating
        "#;

        let mut rows = self
            .conn
            .query(
                query,
                libsql::params![
                    bookmark.id,
                    bookmark.title,
                    bookmark.url,
                    bookmark.description,
                    bookmark.rating
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_bookmark(&row)?)
        } else {
            anyhow::bail!("failed to insert bookmark")
        }
    }

    fn row_to_bookmark(row: &libsql::Row) -> Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            description: row.get::<Option<String>>(3)?,
            rating: row.get(4)?,
        })
    }
}

#[async_trait]
impl BookmarkStore for LibsqlStore {
    async fn list(&self) -> Result<Vec<Bookmark>> {
        let query = r#"
            SELECT id, title, url, description, rating
            FROM bookmarks
            ORDER BY rowid
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut bookmarks = Vec::new();
        while let Some(row) = rows.next().await? {
            bookmarks.push(Self::row_to_bookmark(&row)?);
        }
        Ok(bookmarks)
    }

    async fn get(&self, id: &str) -> Result<Option<Bookmark>> {
        let query = r#"
            SELECT id, title, url, description, rating
            FROM bookmarks WHERE id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_bookmark(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn insert(&self, bookmark: NewBookmark) -> Result<Bookmark> {
        self.insert_row(bookmark.with_id(new_id())).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.tx_lock.lock().await;
        let affected = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?", libsql::params![id])
            .await?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewBookmark {
        NewBookmark {
            title: "test".to_string(),
            url: "http://www.something.com".to_string(),
            description: None,
            rating: 0,
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = LibsqlStore::in_memory().await.unwrap();
        let created = store.insert(sample()).await.unwrap();

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.description, None);
        assert_eq!(fetched.rating, 0);
    }

    #[tokio::test]
    async fn delete_is_final() {
        let store = LibsqlStore::in_memory().await.unwrap();
        let created = store.insert(sample()).await.unwrap();

        assert!(store.delete(&created.id).await.unwrap());
        assert!(!store.delete(&created.id).await.unwrap());
        assert!(store.get(&created.id).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_only_fills_an_empty_table() {
        let store = LibsqlStore::in_memory().await.unwrap();
        store.seed(demo_bookmarks()).await.unwrap();
        store.seed(demo_bookmarks()).await.unwrap();

        let titles: Vec<_> = store.list().await.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Google", "Thinkful"]);
    }

    #[tokio::test]
    async fn migrations_are_recorded_once() {
        let store = LibsqlStore::in_memory().await.unwrap();
        for (name, sql) in MIGRATIONS {
            LibsqlStore::run_migration(&store.conn, name, sql).await.unwrap();
        }
        let mut rows = store.conn.query("SELECT COUNT(*) FROM _migrations", ()).await.unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn rating_outside_range_is_rejected_by_schema() {
        let store = LibsqlStore::in_memory().await.unwrap();
        let mut bad = sample();
        bad.rating = 9;
        assert!(store.insert(bad).await.is_err());
    }
}
