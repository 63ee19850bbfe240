use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// 将存储错误转换为错误码
    ///
    /// redb errors are classified by message; anything unrecognised is a
    /// plain `StorageUnavailable`. Nothing is retried automatically.
    pub fn code(&self) -> ErrorCode {
        if let StorageError::Serialization(_) = self {
            return ErrorCode::InternalError;
        }

        let err_str = self.to_string().to_lowercase();

        // 磁盘空间不足
        if err_str.contains("no space")
            || err_str.contains("disk full")
            || err_str.contains("enospc")
        {
            return ErrorCode::StorageFull;
        }

        // 数据损坏
        if err_str.contains("corrupt") || err_str.contains("invalid database") {
            return ErrorCode::StorageCorrupted;
        }

        ErrorCode::StorageUnavailable
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let code = err.code();
        tracing::error!(error = %err, error_code = %code, "Storage error occurred");
        AppError::with_message(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorKind;

    #[test]
    fn test_serialization_error_is_internal() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err = StorageError::from(json_err);
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_storage_error_maps_to_storage_kind() {
        let io = std::io::Error::other("disk full");
        let err = StorageError::Storage(redb::StorageError::Io(io));
        assert_eq!(err.code(), ErrorCode::StorageFull);

        let app: AppError = err.into();
        assert_eq!(app.kind(), ErrorKind::StorageUnavailable);
    }
}
