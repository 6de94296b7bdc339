//! 语句计划 - 两阶段执行对象
//!
//! build 阶段对照目录完成全部校验（可能失败，可能占用算子资源），
//! run 阶段消费计划本身执行恰好一次。校验失败一律发生在任何数据
//! 被改动之前；执行期的存储错误按原样向上传播，已写入的行不回滚。

use crate::error::{DBError, Result};
use crate::query::check;
use crate::query::predicate::{evaluate_groups, PredicateGroups};
use crate::query::result::QueryResult;
use crate::query::select::SelectPlan;
use crate::query::statement::Statement;
use crate::relop::{FileScan, Operator};
use crate::storage::table::{ColumnDef, Schema, Tuple, Value};
use crate::storage::StorageEngine;

/// 语句计划，语句种类与 [`Statement`] 一一对应
pub enum Plan {
    CreateTable(CreateTablePlan),
    DropTable(DropTablePlan),
    Insert(InsertPlan),
    Delete(DeletePlan),
    Update(UpdatePlan),
    Select(SelectPlan),
    Describe(DescribePlan),
}

impl Plan {
    /// 校验语句并构建计划
    pub fn build(stmt: Statement, storage: &StorageEngine) -> Result<Plan> {
        match stmt {
            Statement::CreateTable { name, columns } => {
                Ok(Plan::CreateTable(CreateTablePlan::build(name, columns, storage)?))
            }
            Statement::DropTable { name } => {
                Ok(Plan::DropTable(DropTablePlan::build(name, storage)?))
            }
            Statement::Insert { table, values } => {
                Ok(Plan::Insert(InsertPlan::build(table, values, storage)?))
            }
            Statement::Delete { table, predicates } => {
                Ok(Plan::Delete(DeletePlan::build(table, predicates, storage)?))
            }
            Statement::Update {
                table,
                assignments,
                predicates,
            } => Ok(Plan::Update(UpdatePlan::build(
                table,
                assignments,
                predicates,
                storage,
            )?)),
            Statement::Select(select) => Ok(Plan::Select(SelectPlan::build(select, storage)?)),
            Statement::Describe { table } => {
                Ok(Plan::Describe(DescribePlan::build(table, storage)?))
            }
        }
    }

    /// 执行计划；计划被消费，不可重入
    pub fn run(self, storage: &mut StorageEngine) -> Result<QueryResult> {
        match self {
            Plan::CreateTable(plan) => plan.run(storage),
            Plan::DropTable(plan) => plan.run(storage),
            Plan::Insert(plan) => plan.run(storage),
            Plan::Delete(plan) => plan.run(storage),
            Plan::Update(plan) => plan.run(storage),
            Plan::Select(plan) => plan.run(),
            Plan::Describe(plan) => plan.run(),
        }
    }
}

/// CREATE TABLE 计划
pub struct CreateTablePlan {
    name: String,
    columns: Vec<ColumnDef>,
}

impl CreateTablePlan {
    fn build(name: String, columns: Vec<ColumnDef>, storage: &StorageEngine) -> Result<Self> {
        if storage.catalog().has_table(&name) {
            return Err(DBError::Validation(format!("表 '{}' 已存在", name)));
        }
        if columns.is_empty() {
            return Err(DBError::Validation("表至少需要一列".to_string()));
        }
        // 列名在同一张表里必须唯一
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(DBError::Validation(format!("列名 '{}' 重复", column.name)));
            }
        }
        Ok(Self { name, columns })
    }

    fn run(self, storage: &mut StorageEngine) -> Result<QueryResult> {
        storage.create_table(self.name, self.columns)?;
        Ok(QueryResult::Success)
    }
}

/// DROP TABLE 计划
pub struct DropTablePlan {
    name: String,
}

impl DropTablePlan {
    fn build(name: String, storage: &StorageEngine) -> Result<Self> {
        if !storage.catalog().has_table(&name) {
            return Err(DBError::Validation(format!("表 '{}' 不存在", name)));
        }
        Ok(Self { name })
    }

    fn run(self, storage: &mut StorageEngine) -> Result<QueryResult> {
        storage.drop_table(&self.name)?;
        Ok(QueryResult::Success)
    }
}

/// INSERT 计划
pub struct InsertPlan {
    table: String,
    schema: Schema,
    values: Vec<Value>,
}

impl InsertPlan {
    fn build(table: String, values: Vec<Value>, storage: &StorageEngine) -> Result<Self> {
        let schema = check::table_exists(storage.catalog(), &table)?;
        check::insert_values(&schema, &values)?;
        Ok(Self {
            table,
            schema,
            values,
        })
    }

    fn run(self, storage: &mut StorageEngine) -> Result<QueryResult> {
        let InsertPlan {
            table,
            schema,
            values,
        } = self;
        let tuple = Tuple::new(&schema, values);
        storage.insert_record(&table, tuple.into_values())?;
        storage.adjust_row_count(&table, 1)?;
        Ok(QueryResult::RowsAffected(1))
    }
}

/// DELETE 计划
pub struct DeletePlan {
    table: String,
    schema: Schema,
    predicates: PredicateGroups,
}

impl DeletePlan {
    fn build(table: String, predicates: PredicateGroups, storage: &StorageEngine) -> Result<Self> {
        let schema = check::table_exists(storage.catalog(), &table)?;
        check::predicates(&schema, &predicates)?;
        Ok(Self {
            table,
            schema,
            predicates,
        })
    }

    fn run(self, storage: &mut StorageEngine) -> Result<QueryResult> {
        let DeletePlan {
            table,
            schema,
            predicates,
        } = self;

        let mut scan = FileScan::open(storage, &table)?;
        let mut count = 0usize;
        while let Some(row) = scan.next()? {
            let tuple = Tuple::new(&schema, row);
            // 无谓词即全表删除
            if evaluate_groups(&predicates, &tuple)? {
                if let Some(rid) = scan.last_rid() {
                    storage.delete_record(&table, rid)?;
                    count += 1;
                }
            }
        }
        scan.close();

        storage.adjust_row_count(&table, -(count as i64))?;
        Ok(QueryResult::RowsAffected(count))
    }
}

/// UPDATE 计划
pub struct UpdatePlan {
    table: String,
    schema: Schema,
    columns: Vec<String>,
    values: Vec<Value>,
    predicates: PredicateGroups,
}

impl UpdatePlan {
    fn build(
        table: String,
        assignments: Vec<(String, Value)>,
        predicates: PredicateGroups,
        storage: &StorageEngine,
    ) -> Result<Self> {
        let schema = check::table_exists(storage.catalog(), &table)?;

        let (columns, values): (Vec<String>, Vec<Value>) = assignments.into_iter().unzip();
        let indices = check::update_fields(&schema, &columns)?;
        check::update_values(&schema, &indices, &values)?;
        check::predicates(&schema, &predicates)?;

        Ok(Self {
            table,
            schema,
            columns,
            values,
            predicates,
        })
    }

    fn run(self, storage: &mut StorageEngine) -> Result<QueryResult> {
        let UpdatePlan {
            table,
            schema,
            columns,
            values,
            predicates,
        } = self;

        let mut scan = FileScan::open(storage, &table)?;
        let mut count = 0usize;
        while let Some(row) = scan.next()? {
            let mut tuple = Tuple::new(&schema, row);
            if !predicates.is_empty() {
                if evaluate_groups(&predicates, &tuple)? {
                    for (column, value) in columns.iter().zip(values.iter()) {
                        tuple.set(column, value.clone())?;
                    }
                    if let Some(rid) = scan.last_rid() {
                        storage.update_record(&table, rid, tuple.into_values())?;
                        count += 1;
                    }
                }
            } else {
                // 无谓词时更新每一行；报告的计数保持为0
                for (column, value) in columns.iter().zip(values.iter()) {
                    tuple.set(column, value.clone())?;
                }
                if let Some(rid) = scan.last_rid() {
                    storage.update_record(&table, rid, tuple.into_values())?;
                }
            }
        }
        scan.close();

        Ok(QueryResult::RowsAffected(count))
    }
}

/// DESCRIBE 计划
pub struct DescribePlan {
    schema: Schema,
}

impl DescribePlan {
    fn build(table: String, storage: &StorageEngine) -> Result<Self> {
        let schema = check::table_exists(storage.catalog(), &table)?;
        Ok(Self { schema })
    }

    fn run(self) -> Result<QueryResult> {
        Ok(QueryResult::Schema(self.schema))
    }
}
