use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tokio::sync::mpsc;
use tokio::task;

use crate::models::{Conversation, FileRef, Message, Role};

/// Optional on-disk copy of the conversation list.
///
/// Only used when history is enabled in [`crate::config::ClientConfig`];
/// otherwise conversations live and die with the window.
#[derive(Debug, Clone)]
pub struct HistoryDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl HistoryDatabase {
    pub async fn open(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory: {}", parent.display())
                })?;
            }

            let conn = Connection::open(&path)
                .with_context(|| format!("Failed to open history at {}", path.display()))?;
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

            let db = HistoryDatabase {
                conn: Arc::new(Mutex::new(conn)),
            };
            db.run_migrations()?;
            Ok(db)
        })
        .await?
    }

    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = HistoryDatabase {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = lock(&self.conn)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL
            );",
        )?;

        let version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if version < 1 {
            conn.execute_batch(
                "CREATE TABLE conversations (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE messages (
                    id TEXT PRIMARY KEY,
                    conversation_id TEXT NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    files TEXT NOT NULL DEFAULT '[]',
                    folder_url TEXT,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
                );

                CREATE INDEX idx_conversations_created ON conversations(created_at DESC);
                CREATE INDEX idx_messages_conversation ON messages(conversation_id);

                INSERT INTO schema_version (version) VALUES (1);",
            )?;
        }

        Ok(())
    }

    pub async fn insert_conversation(&self, conversation: &Conversation) -> Result<()> {
        let conn = self.conn.clone();
        let id = conversation.id.clone();
        let title = conversation.title.clone();
        let created_at = conversation.created_at.to_rfc3339();
        task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            conn.execute(
                "INSERT INTO conversations (id, title, created_at) VALUES (?1, ?2, ?3)",
                params![id, title, created_at],
            )?;
            Ok(())
        })
        .await?
    }

    pub async fn update_conversation_title(&self, id: &str, title: &str) -> Result<()> {
        let conn = self.conn.clone();
        let id = id.to_string();
        let title = title.to_string();
        task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            conn.execute(
                "UPDATE conversations SET title = ?1 WHERE id = ?2",
                params![title, id],
            )?;
            Ok(())
        })
        .await?
    }

    pub async fn delete_conversation(&self, id: &str) -> Result<()> {
        let conn = self.conn.clone();
        let id = id.to_string();
        task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            conn.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await?
    }

    pub async fn insert_message(&self, conversation_id: &str, message: &Message) -> Result<()> {
        let conn = self.conn.clone();
        let conversation_id = conversation_id.to_string();
        let msg = message.clone();
        let files = serde_json::to_string(&message.files)?;
        task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            conn.execute(
                "INSERT INTO messages (id, conversation_id, role, content, files, folder_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.id,
                    conversation_id,
                    msg.role.as_str(),
                    msg.content,
                    files,
                    msg.folder_url,
                    msg.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await?
    }

    /// Every saved conversation, newest first, each with its full transcript
    /// in the order the messages were appended.
    pub async fn load_conversations(&self) -> Result<Vec<Conversation>> {
        let conn = self.conn.clone();
        task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let mut stmt = conn.prepare(
                "SELECT id, title, created_at FROM conversations
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let mut conversations = stmt
                .query_map([], |row| Ok(Self::row_to_conversation(row)))?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT id, role, content, files, folder_url, created_at FROM messages
                 WHERE conversation_id = ?1 ORDER BY rowid ASC",
            )?;
            for conv in &mut conversations {
                conv.messages = stmt
                    .query_map(params![conv.id], |row| Ok(Self::row_to_message(row)))?
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter()
                    .collect::<Result<Vec<_>, _>>()?;
            }

            Ok(conversations)
        })
        .await?
    }

    pub async fn apply(&self, op: HistoryOp) -> Result<()> {
        match op {
            HistoryOp::InsertConversation(conversation) => {
                self.insert_conversation(&conversation).await
            }
            HistoryOp::UpdateTitle { id, title } => {
                self.update_conversation_title(&id, &title).await
            }
            HistoryOp::InsertMessage {
                conversation_id,
                message,
            } => self.insert_message(&conversation_id, &message).await,
            HistoryOp::DeleteConversation(id) => self.delete_conversation(&id).await,
        }
    }

    // --- Row helpers ---

    fn row_to_conversation(row: &rusqlite::Row) -> Result<Conversation> {
        let created_str: String = row.get(2)?;

        Ok(Conversation {
            id: row.get(0)?,
            title: row.get(1)?,
            messages: Vec::new(),
            created_at: DateTime::parse_from_rfc3339(&created_str)?.with_timezone(&Utc),
        })
    }

    fn row_to_message(row: &rusqlite::Row) -> Result<Message> {
        let role_str: String = row.get(1)?;
        let files_json: String = row.get(3)?;
        let created_str: String = row.get(5)?;

        Ok(Message {
            id: row.get(0)?,
            role: Role::from_str(&role_str).ok_or_else(|| anyhow!("Unknown role: {}", role_str))?,
            content: row.get(2)?,
            files: serde_json::from_str::<Vec<FileRef>>(&files_json)
                .context("Corrupt file list in history")?,
            folder_url: row.get(4)?,
            created_at: DateTime::parse_from_rfc3339(&created_str)?.with_timezone(&Utc),
        })
    }
}

/// A store mutation to mirror on disk.
#[derive(Debug, Clone)]
pub enum HistoryOp {
    InsertConversation(Conversation),
    UpdateTitle { id: String, title: String },
    InsertMessage { conversation_id: String, message: Message },
    DeleteConversation(String),
}

/// Apply queued operations one at a time, in the order they were sent, so a
/// message is never written before its conversation. Runs until every
/// sender is dropped.
pub async fn run_writer(db: HistoryDatabase, mut rx: mpsc::UnboundedReceiver<HistoryOp>) {
    while let Some(op) = rx.recv().await {
        if let Err(e) = db.apply(op).await {
            tracing::error!("Failed to save history: {:#}", e);
        }
    }
    tracing::debug!("History writer stopped");
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("History database lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file() -> FileRef {
        FileRef {
            filename: "UU_11_2020.pdf".to_string(),
            gdrive_url: "https://drive.google.com/file/d/u11/view".to_string(),
            gdrive_id: "u11".to_string(),
            preview: Some("Cipta Kerja".to_string()),
        }
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let db = HistoryDatabase::new_in_memory().unwrap();
        assert!(db.load_conversations().await.unwrap().is_empty());
        // Re-running migrations on an initialized schema is a no-op.
        db.run_migrations().unwrap();
    }

    #[tokio::test]
    async fn test_conversation_and_messages_round_trip() {
        let db = HistoryDatabase::new_in_memory().unwrap();

        let conv = Conversation::new();
        db.insert_conversation(&conv).await.unwrap();

        let question = Message::user("Cari UU Cipta Kerja");
        let answer = Message::assistant(
            "Saya menemukan 1 dokumen yang cocok: UU_11_2020.pdf",
            vec![sample_file()],
            Some("https://drive.google.com/drive/folders/root".to_string()),
        );
        db.insert_message(&conv.id, &question).await.unwrap();
        db.insert_message(&conv.id, &answer).await.unwrap();
        db.update_conversation_title(&conv.id, "Cari UU Cipta Kerja")
            .await
            .unwrap();

        let loaded = db.load_conversations().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, conv.id);
        assert_eq!(loaded[0].title, "Cari UU Cipta Kerja");
        assert_eq!(loaded[0].messages.len(), 2);
        assert_eq!(loaded[0].messages[0].id, question.id);
        assert_eq!(loaded[0].messages[0].role, Role::User);
        assert_eq!(loaded[0].messages[1].files, vec![sample_file()]);
        assert_eq!(
            loaded[0].messages[1].folder_url.as_deref(),
            Some("https://drive.google.com/drive/folders/root")
        );
    }

    #[tokio::test]
    async fn test_newest_conversation_first() {
        let db = HistoryDatabase::new_in_memory().unwrap();

        let mut older = Conversation::new();
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        let newer = Conversation::new();
        db.insert_conversation(&older).await.unwrap();
        db.insert_conversation(&newer).await.unwrap();

        let loaded = db.load_conversations().await.unwrap();
        assert_eq!(loaded[0].id, newer.id);
        assert_eq!(loaded[1].id, older.id);
    }

    #[tokio::test]
    async fn test_writer_applies_ops_in_order() {
        let db = HistoryDatabase::new_in_memory().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(db.clone(), rx));

        let kept = Conversation::new();
        let dropped = Conversation::new();
        let message = Message::user("Peraturan daerah tentang pajak parkir");
        tx.send(HistoryOp::InsertConversation(kept.clone())).unwrap();
        tx.send(HistoryOp::InsertMessage {
            conversation_id: kept.id.clone(),
            message: message.clone(),
        })
        .unwrap();
        tx.send(HistoryOp::UpdateTitle {
            id: kept.id.clone(),
            title: "Peraturan daerah tentang pajak...".to_string(),
        })
        .unwrap();
        tx.send(HistoryOp::InsertConversation(dropped.clone())).unwrap();
        tx.send(HistoryOp::DeleteConversation(dropped.id.clone()))
            .unwrap();
        // A failing op is logged and does not stop the writer.
        tx.send(HistoryOp::InsertMessage {
            conversation_id: "missing".to_string(),
            message: Message::user("yatim"),
        })
        .unwrap();
        drop(tx);
        writer.await.unwrap();

        let loaded = db.load_conversations().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, kept.id);
        assert_eq!(loaded[0].title, "Peraturan daerah tentang pajak...");
        assert_eq!(loaded[0].messages, vec![message]);
    }

    #[tokio::test]
    async fn test_writer_drains_queue_closed_before_start() {
        let db = HistoryDatabase::new_in_memory().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        let conv = Conversation::new();
        let message = Message::user("Undang-undang perlindungan data pribadi");
        tx.send(HistoryOp::InsertConversation(conv.clone())).unwrap();
        tx.send(HistoryOp::InsertMessage {
            conversation_id: conv.id.clone(),
            message: message.clone(),
        })
        .unwrap();
        drop(tx);

        run_writer(db.clone(), rx).await;

        let loaded = db.load_conversations().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].messages, vec![message]);
    }

    #[tokio::test]
    async fn test_delete_cascades_messages() {
        let db = HistoryDatabase::new_in_memory().unwrap();

        let conv = Conversation::new();
        db.insert_conversation(&conv).await.unwrap();
        db.insert_message(&conv.id, &Message::user("halo"))
            .await
            .unwrap();

        db.delete_conversation(&conv.id).await.unwrap();
        assert!(db.load_conversations().await.unwrap().is_empty());

        let orphans: i64 = lock(&db.conn)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
