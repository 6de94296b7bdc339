use std::fs;
use std::path::Path;

use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

pub mod error;
pub mod query;
pub mod relop;
pub mod repl;
pub mod storage;

use error::Result;
use query::result::QueryResult;
use query::QueryProcessor;
use storage::StorageEngine;

/// 数据库启动配置
#[derive(Debug, Default)]
pub struct DBConfig {
    /// 存储基础目录，为None时使用默认目录"data"
    pub data_dir: Option<String>,
    /// 数据库名称，为None时使用"default"
    pub db_name: Option<String>,
}

/// 数据库门面 - 解析SQL、驱动查询处理流程、管理落盘
pub struct MiniDB {
    storage: StorageEngine,
}

impl MiniDB {
    pub fn new() -> Result<Self> {
        Self::with_config(&DBConfig::default())
    }

    pub fn with_config(config: &DBConfig) -> Result<Self> {
        Ok(Self {
            storage: StorageEngine::new(
                config.data_dir.as_deref().map(Path::new),
                config.db_name.as_deref(),
            )?,
        })
    }

    /// 逐条执行一段SQL文本，返回每条语句各自的执行结果
    pub fn execute_sql(&mut self, sql: &str) -> Result<Vec<Result<QueryResult>>> {
        let dialect = MySqlDialect {};
        let statements = Parser::parse_sql(&dialect, sql)?;

        let mut processor = QueryProcessor::new(&mut self.storage);
        let mut results = Vec::new();
        for stmt in &statements {
            results.push(processor.execute(stmt));
        }

        Ok(results)
    }

    /// 执行SQL脚本文件
    pub fn execute_sql_file(&mut self, file_path: &str) -> Result<Vec<Result<QueryResult>>> {
        let sql = fs::read_to_string(file_path)
            .map_err(|e| error::DBError::Io(format!("无法读取SQL文件: {}", e)))?;
        self.execute_sql(&sql)
    }

    pub fn save(&mut self) -> Result<()> {
        self.storage.save()
    }

    pub fn storage(&self) -> &StorageEngine {
        &self.storage
    }
}

// 离开作用域时自动落盘
impl Drop for MiniDB {
    fn drop(&mut self) {
        if let Err(e) = self.save() {
            eprintln!("数据库保存失败: {}", e);
        }
    }
}
