pub mod analyzer;
pub mod check;
pub mod plan;
pub mod predicate;
pub mod result;
pub mod select;
pub mod statement;

use sqlparser::ast;

use crate::error::Result;
use crate::storage::StorageEngine;
use plan::Plan;
use result::QueryResult;

/// 查询处理器 - 负责整个查询处理流程：分析、构建计划、执行
pub struct QueryProcessor<'a> {
    storage: &'a mut StorageEngine,
}

impl<'a> QueryProcessor<'a> {
    pub fn new(storage: &'a mut StorageEngine) -> Self {
        Self { storage }
    }

    /// 执行一条SQL语句，返回执行结果
    pub fn execute(&mut self, stmt: &ast::Statement) -> Result<QueryResult> {
        let statement = analyzer::analyze(stmt)?;
        let plan = Plan::build(statement, self.storage)?;
        plan.run(self.storage)
    }
}
