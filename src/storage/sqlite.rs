//! SQLite storage backend

use super::traits::{OpenStore, Snapshot, SnapshotStore, StorageError, StorageResult};
use crate::model::{Instance, InstanceId, PlanTier};
use crate::quota::QuotaState;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

const KEY_ACTIVE: &str = "active_instance_id";
const KEY_SCANS: &str = "free_tier_scans_count";
const KEY_LAST_RESET: &str = "free_tier_last_reset";
const KEY_PLAN: &str = "selected_plan";

/// SQLite-backed snapshot store
///
/// Instances are stored one row each with an explicit position so insertion
/// order survives a round trip. Scalar session state lives in a key/value
/// table. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS instances (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                product_name TEXT NOT NULL,
                data_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_instances_position
                ON instances(position);

            CREATE TABLE IF NOT EXISTS session_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Corrupt("connection mutex poisoned".to_string()))
    }

    fn read_state(conn: &Connection, key: &str) -> StorageResult<Option<String>> {
        let value = conn
            .query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StorageError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
    }
}

impl SnapshotStore for SqliteStore {
    fn load(&self) -> StorageResult<Option<Snapshot>> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT id, data_json FROM instances ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = Snapshot::default();
        let mut saw_anything = false;
        for row in rows {
            let (id, data_json) = row?;
            let instance: Instance = serde_json::from_str(&data_json)?;
            snapshot.instances.insert(InstanceId::from(id), instance);
            saw_anything = true;
        }

        if let Some(active) = Self::read_state(&conn, KEY_ACTIVE)? {
            snapshot.active_instance_id = Some(InstanceId::from(active));
            saw_anything = true;
        }
        if let Some(scans) = Self::read_state(&conn, KEY_SCANS)? {
            let scans_this_month = scans
                .parse::<u32>()
                .map_err(|e| StorageError::Corrupt(format!("bad scan count '{}': {}", scans, e)))?;
            snapshot.quota = QuotaState {
                scans_this_month,
                ..snapshot.quota
            };
            saw_anything = true;
        }
        if let Some(reset) = Self::read_state(&conn, KEY_LAST_RESET)? {
            snapshot.quota.last_reset = Some(Self::parse_timestamp(&reset)?);
        }
        if let Some(plan) = Self::read_state(&conn, KEY_PLAN)? {
            snapshot.plan = plan
                .parse::<PlanTier>()
                .map_err(|e| StorageError::Corrupt(e.to_string()))?;
            saw_anything = true;
        }

        Ok(saw_anything.then_some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM instances", [])?;
        for (position, (id, instance)) in snapshot.instances.iter().enumerate() {
            let data_json = serde_json::to_string(instance)?;
            tx.execute(
                "INSERT INTO instances (id, position, product_name, data_json) VALUES (?1, ?2, ?3, ?4)",
                params![id.as_str(), position as i64, instance.product_name, data_json],
            )?;
        }

        tx.execute("DELETE FROM session_state", [])?;
        let mut state: Vec<(&str, String)> = vec![
            (KEY_SCANS, snapshot.quota.scans_this_month.to_string()),
            (KEY_PLAN, snapshot.plan.to_string()),
        ];
        if let Some(active) = &snapshot.active_instance_id {
            state.push((KEY_ACTIVE, active.to_string()));
        }
        if let Some(reset) = snapshot.quota.last_reset {
            state.push((KEY_LAST_RESET, reset.to_rfc3339()));
        }
        for (key, value) in state {
            tx.execute(
                "INSERT INTO session_state (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }
}
