use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DBError, Result};
use crate::storage::table::Schema;

/// 单张表的元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMeta {
    pub schema: Schema,
    pub row_count: u64,
}

/// 目录 - 表名到模式与行数统计的注册表
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    tables: HashMap<String, TableMeta>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一张新表
    pub fn add_table(&mut self, name: String, schema: Schema) -> Result<()> {
        if self.tables.contains_key(&name) {
            return Err(DBError::Validation(format!("表 '{}' 已存在", name)));
        }
        self.tables.insert(
            name,
            TableMeta {
                schema,
                row_count: 0,
            },
        );
        Ok(())
    }

    /// 注销一张表
    pub fn remove_table(&mut self, name: &str) -> Result<()> {
        if self.tables.remove(name).is_none() {
            return Err(DBError::Validation(format!("表 '{}' 不存在", name)));
        }
        Ok(())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// 获取表的模式
    pub fn schema_of(&self, name: &str) -> Result<&Schema> {
        self.tables
            .get(name)
            .map(|meta| &meta.schema)
            .ok_or_else(|| DBError::Validation(format!("表 '{}' 不存在", name)))
    }

    /// 获取表的行数统计
    pub fn row_count(&self, name: &str) -> Result<u64> {
        self.tables
            .get(name)
            .map(|meta| meta.row_count)
            .ok_or_else(|| DBError::Validation(format!("表 '{}' 不存在", name)))
    }

    /// 按增量调整表的行数统计
    pub fn adjust_row_count(&mut self, name: &str, delta: i64) -> Result<()> {
        let meta = self
            .tables
            .get_mut(name)
            .ok_or_else(|| DBError::Validation(format!("表 '{}' 不存在", name)))?;
        meta.row_count = (meta.row_count as i64 + delta).max(0) as u64;
        Ok(())
    }

    /// 所有表名（排序后返回，保证输出稳定）
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::table::{ColumnDef, DataType};

    fn test_schema() -> Schema {
        Schema::new(vec![ColumnDef {
            name: "id".to_string(),
            data_type: DataType::Int(32),
            not_null: true,
            unique: true,
            is_primary: true,
        }])
    }

    #[test]
    fn test_add_and_remove_table() {
        let mut catalog = Catalog::new();
        catalog.add_table("users".to_string(), test_schema()).unwrap();

        assert!(catalog.has_table("users"));
        assert_eq!(catalog.schema_of("users").unwrap().len(), 1);

        // 重复创建应该失败
        assert!(catalog.add_table("users".to_string(), test_schema()).is_err());

        catalog.remove_table("users").unwrap();
        assert!(!catalog.has_table("users"));
        assert!(catalog.remove_table("users").is_err());
    }

    #[test]
    fn test_row_count_bookkeeping() {
        let mut catalog = Catalog::new();
        catalog.add_table("t".to_string(), test_schema()).unwrap();

        assert_eq!(catalog.row_count("t").unwrap(), 0);
        catalog.adjust_row_count("t", 3).unwrap();
        assert_eq!(catalog.row_count("t").unwrap(), 3);
        catalog.adjust_row_count("t", -2).unwrap();
        assert_eq!(catalog.row_count("t").unwrap(), 1);
        // 不会降到负数
        catalog.adjust_row_count("t", -10).unwrap();
        assert_eq!(catalog.row_count("t").unwrap(), 0);

        assert!(catalog.adjust_row_count("missing", 1).is_err());
    }

    #[test]
    fn test_table_names_sorted() {
        let mut catalog = Catalog::new();
        catalog.add_table("b".to_string(), test_schema()).unwrap();
        catalog.add_table("a".to_string(), test_schema()).unwrap();
        assert_eq!(catalog.table_names(), vec!["a", "b"]);
    }
}
