//! Full-database snapshot export
//!
//! A snapshot is every row of every table rendered as a JSON object keyed by
//! column name, plus metadata identifying the export. Where it goes is up to
//! a [`SnapshotSink`]: a local JSON file or a remote JSON document store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::config;
use crate::db::DbPool;

/// Every table included in a snapshot, in export order
pub const SNAPSHOT_TABLES: [&str; 9] = [
    "users",
    "posts",
    "follows",
    "likes",
    "replies",
    "direct_messages",
    "conversations",
    "recently_deleted_users",
    "recently_deleted_posts",
];

pub type TableRows = Vec<Map<String, Value>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub export_id: Uuid,
    pub exported_at: DateTime<Utc>,
    pub total_tables: usize,
}

/// The exported document: `_metadata` next to one array per table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "_metadata")]
    pub metadata: SnapshotMetadata,
    #[serde(flatten)]
    pub tables: BTreeMap<String, TableRows>,
}

/// What an export produced, for reporting back to the administrator
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub export_id: Uuid,
    pub exported_at: DateTime<Utc>,
    pub destination: String,
    pub rows_per_table: BTreeMap<String, usize>,
}

impl Snapshot {
    /// Read every table through one pooled connection
    pub fn collect(pool: &DbPool) -> Result<Self> {
        let conn = pool
            .get()
            .context("Failed to get database connection for snapshot")?;

        let mut tables = BTreeMap::new();
        for table in SNAPSHOT_TABLES {
            let rows = dump_table(&conn, table)
                .with_context(|| format!("Failed to read table {}", table))?;
            tables.insert(table.to_string(), rows);
        }

        Ok(Self {
            metadata: SnapshotMetadata {
                export_id: Uuid::new_v4(),
                exported_at: Utc::now(),
                total_tables: tables.len(),
            },
            tables,
        })
    }

    pub fn summary(&self, destination: String) -> SnapshotSummary {
        SnapshotSummary {
            export_id: self.metadata.export_id,
            exported_at: self.metadata.exported_at,
            destination,
            rows_per_table: self
                .tables
                .iter()
                .map(|(table, rows)| (table.clone(), rows.len()))
                .collect(),
        }
    }
}

fn dump_table(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<TableRows> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", table))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let rows = stmt
        .query_map([], |row| {
            let mut record = Map::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                record.insert(name.clone(), json_value(row.get_ref(idx)?));
            }
            Ok(record)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Destination for a snapshot document
pub trait SnapshotSink {
    /// Human-readable destination, used in logs and summaries
    fn describe(&self) -> String;

    fn write(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Writes the snapshot as pretty-printed JSON to a local file
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotSink for JsonFileSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot).context("Failed to encode snapshot")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write snapshot to {}", self.path.display()))?;
        Ok(())
    }
}

/// Replaces a JSON document on a remote store with `PUT <base>/<node>.json`
pub struct HttpDocumentSink {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpDocumentSink {
    pub fn new(base_url: &str, root_node: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: document_url(base_url, root_node),
        })
    }
}

fn document_url(base_url: &str, root_node: &str) -> String {
    format!(
        "{}/{}.json",
        base_url.trim_end_matches('/'),
        root_node.trim_matches('/')
    )
}

impl SnapshotSink for HttpDocumentSink {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn write(&self, snapshot: &Snapshot) -> Result<()> {
        self.client
            .put(&self.url)
            .json(snapshot)
            .send()
            .with_context(|| format!("Failed to send snapshot to {}", self.url))?
            .error_for_status()
            .with_context(|| format!("Snapshot upload to {} was rejected", self.url))?;
        Ok(())
    }
}

/// Build the configured sink. A remote URL takes precedence over a local
/// path; `Ok(None)` means export is not configured.
pub fn sink_from_settings(settings: &config::Snapshot) -> Result<Option<Box<dyn SnapshotSink>>> {
    if let Some(url) = settings.url.as_deref().filter(|u| !u.trim().is_empty()) {
        let sink = HttpDocumentSink::new(url, &settings.root_node)?;
        return Ok(Some(Box::new(sink)));
    }
    if let Some(path) = settings.path.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(Some(Box::new(JsonFileSink::new(path))));
    }
    Ok(None)
}
