//! Append-only conversation log for the chat loop.

use chrono::{DateTime, Utc};
use cropwise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Conversation history, kept in memory and mirrored to a JSONL file.
///
/// Entries are only ever appended.
#[derive(Debug)]
pub struct ChatLog {
    path: Option<PathBuf>,
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    /// In-memory log with no file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
        }
    }

    /// Log that appends each entry to `path`.
    pub fn with_file(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries: Vec::new(),
        })
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) -> AppResult<()> {
        let entry = ChatEntry {
            role,
            content: content.into(),
            at: Utc::now(),
        };

        if let Some(path) = &self.path {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::Other(format!("Failed to open chat log {:?}: {}", path, e)))?;
            writeln!(file, "{}", serde_json::to_string(&entry)?)?;
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }
}

/// Read a log file written by [`ChatLog::with_file`].
pub fn read_log(path: &Path) -> AppResult<Vec<ChatEntry>> {
    let contents = std::fs::read_to_string(path)?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(AppError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_keeps_order() {
        let mut log = ChatLog::in_memory();
        log.append(Role::User, "What is sowing?").unwrap();
        log.append(Role::Assistant, "Placing seeds in soil.").unwrap();

        let roles: Vec<Role> = log.entries().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn test_file_is_appended() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs/chat.jsonl");

        let mut first = ChatLog::with_file(&path).unwrap();
        first.append(Role::User, "What is threshing?").unwrap();

        let mut second = ChatLog::with_file(&path).unwrap();
        second.append(Role::User, "What is winnowing?").unwrap();

        let entries = read_log(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "What is threshing?");
        assert_eq!(entries[1].content, "What is winnowing?");
        assert_eq!(second.entries().len(), 1);
    }
}
