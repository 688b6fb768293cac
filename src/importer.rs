use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};
use crate::models::RawMessage;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// One exported SMS. Field aliases cover the common Android backup columns.
#[derive(Debug, Deserialize)]
struct InboxRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(alias = "address")]
    sender: String,
    body: String,
    #[serde(alias = "date")]
    received_at: i64,
}

impl InboxRow {
    fn into_message(self, index: usize) -> RawMessage {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => (index + 1).to_string(),
        };
        RawMessage {
            id,
            sender: self.sender,
            body: self.body,
            received_at: self.received_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    Json,
    Csv,
}

impl MessageFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn detect(file_path: &Path) -> Option<Self> {
        let ext = file_path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn parse(&self, data: &[u8]) -> Result<Vec<RawMessage>> {
        let rows = match self {
            Self::Json => parse_json(data)?,
            Self::Csv => parse_csv(data)?,
        };
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| row.into_message(i))
            .collect())
    }
}

fn parse_json(data: &[u8]) -> Result<Vec<InboxRow>> {
    Ok(serde_json::from_slice(data)?)
}

fn parse_csv(data: &[u8]) -> Result<Vec<InboxRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(data);
    let rows = reader
        .deserialize::<InboxRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// load_messages
// ---------------------------------------------------------------------------

pub struct LoadedMessages {
    pub messages: Vec<RawMessage>,
    pub format: MessageFormat,
    pub checksum: String,
}

pub fn load_messages(file_path: &Path) -> Result<LoadedMessages> {
    let format = MessageFormat::detect(file_path)
        .ok_or_else(|| LedgerError::UnsupportedFormat(file_path.display().to_string()))?;
    let data = std::fs::read(file_path)?;
    let checksum = sha256_hex(&data);
    let messages = format.parse(&data)?;
    tracing::debug!(
        file = %file_path.display(),
        format = format.key(),
        count = messages.len(),
        "loaded messages"
    );
    Ok(LoadedMessages {
        messages,
        format,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(MessageFormat::detect(Path::new("inbox.JSON")), Some(MessageFormat::Json));
        assert_eq!(MessageFormat::detect(Path::new("inbox.csv")), Some(MessageFormat::Csv));
        assert_eq!(MessageFormat::detect(Path::new("inbox.xml")), None);
        assert_eq!(MessageFormat::detect(Path::new("inbox")), None);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "inbox.json",
            r#"[
                {"id": "a1", "sender": "VM-HDFCBK", "body": "Rs 500 debited", "received_at": 1704441600000},
                {"address": "JIO", "body": "Plan will expire", "date": 1704441600001}
            ]"#,
        );
        let loaded = load_messages(&path).unwrap();
        assert_eq!(loaded.format, MessageFormat::Json);
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[0].id, "a1");
        assert_eq!(loaded.messages[1].id, "2");
        assert_eq!(loaded.messages[1].sender, "JIO");
        assert_eq!(loaded.messages[1].received_at, 1_704_441_600_001);
        assert_eq!(loaded.checksum, sha256_hex(&std::fs::read(&path).unwrap()));
    }

    #[test]
    fn test_load_csv_with_android_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "inbox.csv",
            "address, body, date\nAX-SBIINB,\"Rs 1,200 credited, thanks\",1704441600000\n",
        );
        let loaded = load_messages(&path).unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].sender, "AX-SBIINB");
        assert_eq!(loaded.messages[0].body, "Rs 1,200 credited, thanks");
        assert_eq!(loaded.messages[0].id, "1");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "inbox.txt", "hello");
        assert!(matches!(load_messages(&path), Err(LedgerError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "inbox.json", "{not json");
        assert!(matches!(load_messages(&path), Err(LedgerError::Json(_))));
    }

    #[test]
    fn test_checksum_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.json", "[]");
        let b = write(&dir, "b.json", "[ ]");
        assert_ne!(load_messages(&a).unwrap().checksum, load_messages(&b).unwrap().checksum);
    }
}
