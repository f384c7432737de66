// ==========================================
// 1895 农业普查单位归一化 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 台账错误只记录日志，不中止批处理
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("数据库操作失败: {0}")]
    DatabaseError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("台账目录创建失败: {0}")]
    IoError(String),

    #[error("台账字段序列化失败 (field={field}): {message}")]
    SerializationError { field: String, message: String },
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => RepositoryError::DatabaseError(msg),
            _ => RepositoryError::DatabaseError(err.to_string()),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::IoError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
