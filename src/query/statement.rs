use crate::query::predicate::PredicateGroups;
use crate::storage::table::{ColumnDef, Value};

/// 分析后的语句树 - 语句种类是封闭集合，每个变体携带计划构建所需的全部字段
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
    },
    DropTable {
        name: String,
    },
    Insert {
        table: String,
        values: Vec<Value>,
    },
    Delete {
        table: String,
        predicates: PredicateGroups,
    },
    Update {
        table: String,
        /// (目标列名, 新值) 对，按SET子句顺序
        assignments: Vec<(String, Value)>,
        predicates: PredicateGroups,
    },
    Select(SelectStatement),
    Describe {
        table: String,
    },
}

/// SELECT 语句树
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// 来源表，按声明顺序
    pub tables: Vec<String>,
    /// 显式投影列；空列表表示 '*'（按模式自然顺序输出全部列）
    pub columns: Vec<String>,
    pub predicates: PredicateGroups,
    /// EXPLAIN 模式：只打印算子树，不拉取任何行
    pub is_explain: bool,
}
