use std::fmt;

use crate::relop::Row;
use crate::storage::table::Schema;

/// 查询结果数据
#[derive(Debug)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // 表头
        write!(f, "| ")?;
        for (i, col) in self.columns.iter().enumerate() {
            write!(f, "{}", col)?;
            if i < self.columns.len() - 1 {
                write!(f, " | ")?;
            }
        }
        writeln!(f, " |")?;

        // 分隔线
        write!(f, "| ")?;
        for (i, col) in self.columns.iter().enumerate() {
            write!(f, "{}", "-".repeat(col.len()))?;
            if i < self.columns.len() - 1 {
                write!(f, " | ")?;
            }
        }
        writeln!(f, " |")?;

        // 数据行
        for row in &self.rows {
            write!(f, "| ")?;
            for (i, cell) in row.iter().enumerate() {
                write!(f, "{}", cell)?;
                if i < row.len() - 1 {
                    write!(f, " | ")?;
                }
            }
            writeln!(f, " |")?;
        }

        Ok(())
    }
}

/// 渲染统一的行数报告行
pub fn affected_line(count: usize) -> String {
    format!(
        "{} row{} affected.",
        count,
        if count == 1 { "" } else { "s" }
    )
}

/// 语句执行结果
#[derive(Debug)]
pub enum QueryResult {
    /// SELECT 的结果集，显示时附带行数报告
    Select(ResultSet),
    /// INSERT/DELETE/UPDATE 的影响行数
    RowsAffected(usize),
    /// EXPLAIN 输出的算子树
    Explain(String),
    /// DESCRIBE 输出的表模式
    Schema(Schema),
    /// 无输出的成功（DDL）
    Success,
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryResult::Select(rs) => {
                write!(f, "{}", rs)?;
                write!(f, "{}", affected_line(rs.rows.len()))
            }
            QueryResult::RowsAffected(count) => write!(f, "{}", affected_line(*count)),
            QueryResult::Explain(tree) => write!(f, "{}", tree.trim_end()),
            QueryResult::Schema(schema) => write!(f, "{}", schema.to_string().trim_end()),
            QueryResult::Success => Ok(()),
        }
    }
}
