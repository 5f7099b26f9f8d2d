//! Long-term memory of agents.
//!
//! Other agents record their reasoning here; the social agent reads it back
//! to explain its bets. Handles are scoped to one agent identifier.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::MemoryError;

/// Agent whose memories explain the bets being posted.
pub const THINK_THOROUGHLY: &str = "think-thoroughly-agent";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS long_term_memories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id TEXT NOT NULL,
    content TEXT NOT NULL,
    datetime_ms INTEGER NOT NULL
)";

/// A single remembered note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    /// Agent that wrote the note.
    pub agent_id: String,
    /// Note text.
    pub content: String,
    /// When the note was written.
    pub datetime: DateTime<Utc>,
}

/// Where memories are kept.
#[derive(Debug, Clone)]
pub enum MemoryBackend {
    /// SQLite database.
    Sqlite(SqlitePool),
    /// Process-local store, lost on exit.
    InMemory(Arc<RwLock<Vec<MemoryEntry>>>),
}

impl MemoryBackend {
    /// Open the SQLite database at `url`, creating the file and table if needed.
    pub async fn connect(url: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // Every connection to `:memory:` is a separate database.
        let max_connections = if url.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        debug!(url = %url, "Long-term memory database ready");

        Ok(Self::Sqlite(pool))
    }

    /// Empty process-local store.
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(RwLock::new(Vec::new())))
    }
}

/// Memory handle scoped to one agent.
#[derive(Debug, Clone)]
pub struct LongTermMemoryHandler {
    backend: MemoryBackend,
    agent_id: String,
}

impl LongTermMemoryHandler {
    /// Open the memories of `agent_id`.
    pub fn from_agent_identifier(backend: &MemoryBackend, agent_id: &str) -> Self {
        Self {
            backend: backend.clone(),
            agent_id: agent_id.to_string(),
        }
    }

    /// Agent this handle is scoped to.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Record a note timestamped now.
    pub async fn save(&self, content: &str) -> Result<(), MemoryError> {
        self.save_at(content, Utc::now()).await
    }

    /// Record a note with an explicit timestamp.
    pub async fn save_at(&self, content: &str, datetime: DateTime<Utc>) -> Result<(), MemoryError> {
        match &self.backend {
            MemoryBackend::Sqlite(pool) => {
                sqlx::query(
                    "INSERT INTO long_term_memories (agent_id, content, datetime_ms) VALUES (?, ?, ?)",
                )
                .bind(&self.agent_id)
                .bind(content)
                .bind(datetime.timestamp_millis())
                .execute(pool)
                .await?;
            }
            MemoryBackend::InMemory(entries) => {
                entries.write().await.push(MemoryEntry {
                    agent_id: self.agent_id.clone(),
                    content: content.to_string(),
                    datetime,
                });
            }
        }
        Ok(())
    }

    /// Notes of this agent written at or after `since`, oldest first.
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn search(&self, since: DateTime<Utc>) -> Result<Vec<MemoryEntry>, MemoryError> {
        let entries = match &self.backend {
            MemoryBackend::Sqlite(pool) => {
                let rows: Vec<(String, String, i64)> = sqlx::query_as(
                    "SELECT agent_id, content, datetime_ms FROM long_term_memories
                     WHERE agent_id = ? AND datetime_ms >= ?
                     ORDER BY datetime_ms ASC, id ASC",
                )
                .bind(&self.agent_id)
                .bind(since.timestamp_millis())
                .fetch_all(pool)
                .await?;

                rows.into_iter()
                    .filter_map(|(agent_id, content, ms)| {
                        Utc.timestamp_millis_opt(ms).single().map(|datetime| MemoryEntry {
                            agent_id,
                            content,
                            datetime,
                        })
                    })
                    .collect()
            }
            MemoryBackend::InMemory(entries) => {
                let mut found: Vec<MemoryEntry> = entries
                    .read()
                    .await
                    .iter()
                    .filter(|e| e.agent_id == self.agent_id && e.datetime >= since)
                    .cloned()
                    .collect();
                found.sort_by_key(|e| e.datetime);
                found
            }
        };

        debug!(count = entries.len(), "Memories loaded");
        Ok(entries)
    }
}
