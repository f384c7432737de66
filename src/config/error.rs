// ==========================================
// 1895 农业普查单位归一化 - 配置错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 配置错误是唯一会中止整批运行的错误
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    Read { path: String, message: String },

    #[error("配置文件解析失败 ({path}): {message}")]
    Parse { path: String, message: String },

    #[error("未知的流水线版本: {0}（可选: v2, v3）")]
    UnknownRevision(String),

    #[error("配置值非法 (key: {key}): {message}")]
    Invalid { key: String, message: String },

    #[error("配置序列化失败: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
