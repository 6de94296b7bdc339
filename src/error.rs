use thiserror::Error;

/// 数据库统一错误类型
#[derive(Debug, Error)]
pub enum DBError {
    /// SQL 解析或语句分析阶段的错误
    #[error("解析错误: {0}")]
    Parse(String),
    /// 计划构建阶段的校验错误（表/列不存在、类型或数量不匹配）
    #[error("验证错误: {0}")]
    Validation(String),
    /// 执行阶段的运行时错误
    #[error("执行错误: {0}")]
    Execution(String),
    /// 存储层错误
    #[error("存储错误: {0}")]
    Storage(String),
    #[error("IO错误: {0}")]
    Io(String),
}

impl From<sqlparser::parser::ParserError> for DBError {
    fn from(e: sqlparser::parser::ParserError) -> Self {
        DBError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DBError>;
