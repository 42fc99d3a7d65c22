//! Document key: the storage path scheme for uploaded files.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// A validated storage key for an uploaded document.
///
/// Keys render as `documents/{account_id}/{object_id}.{extension}`. The
/// `object_id` is a UUID v7 generated at upload time, so keys are
/// time-ordered within an account and never collide with job ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    account_id: Uuid,
    object_id: Uuid,
    extension: String,
}

impl DocumentKey {
    /// Generates a new document key with a fresh UUID v7 object ID.
    pub fn generate(account_id: Uuid, extension: impl Into<String>) -> Self {
        Self {
            account_id,
            object_id: Uuid::now_v7(),
            extension: extension.into().to_ascii_lowercase(),
        }
    }

    /// Creates a document key from existing parts (for parsing stored keys).
    pub fn from_parts(account_id: Uuid, object_id: Uuid, extension: impl Into<String>) -> Self {
        Self {
            account_id,
            object_id,
            extension: extension.into(),
        }
    }

    /// Returns the owning account ID.
    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    /// Returns the object ID.
    pub fn object_id(&self) -> Uuid {
        self.object_id
    }

    /// Returns the file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "documents/{}/{}.{}",
            self.account_id, self.object_id, self.extension
        )
    }
}

impl FromStr for DocumentKey {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        let rest = s
            .strip_prefix("documents/")
            .ok_or_else(|| StorageError::invalid_path(format!("missing prefix: {s}")))?;

        let (account, file) = rest
            .split_once('/')
            .ok_or_else(|| StorageError::invalid_path(format!("missing account segment: {s}")))?;

        let (object, extension) = file
            .rsplit_once('.')
            .ok_or_else(|| StorageError::invalid_path(format!("missing extension: {s}")))?;

        let account_id = Uuid::parse_str(account)
            .map_err(|e| StorageError::invalid_path(format!("bad account id: {e}")))?;
        let object_id = Uuid::parse_str(object)
            .map_err(|e| StorageError::invalid_path(format!("bad object id: {e}")))?;

        if extension.is_empty() {
            return Err(StorageError::invalid_path(format!("empty extension: {s}")));
        }

        Ok(Self::from_parts(account_id, object_id, extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = DocumentKey::generate(Uuid::now_v7(), "PDF");
        assert_eq!(key.extension(), "pdf");

        let rendered = key.to_string();
        let parsed: DocumentKey = rendered.parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!("uploads/abc.pdf".parse::<DocumentKey>().is_err());
        assert!("documents/not-a-uuid/also-bad.pdf"
            .parse::<DocumentKey>()
            .is_err());
        assert!(format!("documents/{}/{}", Uuid::now_v7(), Uuid::now_v7())
            .parse::<DocumentKey>()
            .is_err());
    }

    #[test]
    fn keys_are_account_scoped() {
        let account = Uuid::now_v7();
        let key = DocumentKey::generate(account, "png");
        assert!(key.to_string().contains(&account.to_string()));
    }
}
