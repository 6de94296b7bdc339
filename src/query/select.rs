//! Select计划 - 把任意张表、任意谓词组、任意投影列编译成一条算子链
//!
//! 构建阶段完成全部校验并打开扫描资源；任何一步失败都随提前返回
//! 释放此前打开的所有算子（扫描句柄守卫在析构时注销自己）。
//! 执行阶段要么打印算子树（EXPLAIN），要么拉取到耗尽并报告行数，
//! 两条路径都恰好释放一次全部资源。

use crate::error::{DBError, Result};
use crate::query::check;
use crate::query::result::{QueryResult, ResultSet};
use crate::query::statement::SelectStatement;
use crate::relop::{FileScan, Operator, Projection, Selection, SimpleJoin};
use crate::storage::StorageEngine;

/// 编译完成的Select计划
pub struct SelectPlan {
    /// 算子链顶端，传递式地拥有整条链
    projection: Projection,
    /// 未接入顶端链条的算子（多表拓扑下游离的连接和扫描），
    /// 由计划持有以保证与链条一起释放
    side: Vec<Box<dyn Operator>>,
    is_explain: bool,
}

impl SelectPlan {
    /// 校验语句并编译算子链
    pub fn build(stmt: SelectStatement, storage: &StorageEngine) -> Result<Self> {
        let SelectStatement {
            tables,
            columns,
            predicates,
            is_explain,
        } = stmt;

        if tables.is_empty() {
            return Err(DBError::Validation("SELECT 至少需要一张表".to_string()));
        }

        // 解析所有表并打开扫描；之后任何失败都随提前返回释放已打开的扫描
        let mut schemas = Vec::with_capacity(tables.len());
        let mut scans: Vec<Option<FileScan>> = Vec::with_capacity(tables.len());
        for table in &tables {
            let scan = FileScan::open(storage, table)?;
            schemas.push(scan.schema().clone());
            scans.push(Some(scan));
        }

        // 每个显式投影列至少要出现在一个表的模式里
        for column in &columns {
            if !schemas.iter().any(|schema| schema.index_of(column).is_some()) {
                return Err(DBError::Validation(format!("列 '{}' 不存在", column)));
            }
        }

        let mut side: Vec<Box<dyn Operator>> = Vec::new();

        let (chain, chain_schema) = if schemas.len() == 1 {
            // 单表：谓词校验后按组串联过滤算子；无谓词时加一级直通过滤
            check::predicates(&schemas[0], &predicates)?;

            let scan = take_scan(&mut scans, 0, &tables, storage)?;
            let mut chain: Box<dyn Operator> = Box::new(scan);
            if predicates.is_empty() {
                chain = Box::new(Selection::new(chain, Vec::new()));
            } else {
                for group in predicates {
                    chain = Box::new(Selection::new(chain, group));
                }
            }
            (chain, schemas[0].clone())
        } else {
            // 多表：先把前两张表连接起来
            let mut joined_schema = schemas[0].concat(&schemas[1]);
            let left = take_scan(&mut scans, 0, &tables, storage)?;
            let right = take_scan(&mut scans, 1, &tables, storage)?;
            let mut join = SimpleJoin::new(Box::new(left), Box::new(right));
            join.set_schema(joined_schema.clone());
            let mut chain: Box<dyn Operator> = Box::new(join);

            // 其余表两两配对成新连接，运行模式按表顺序逐张加宽；
            // 新连接只消费两侧的原始扫描，被替换下来的链条转入 side
            for i in 2..schemas.len().saturating_sub(1) {
                joined_schema = joined_schema.concat(&schemas[i]);
                let left = take_scan(&mut scans, i, &tables, storage)?;
                let right = take_scan(&mut scans, i + 1, &tables, storage)?;
                let mut next_join = SimpleJoin::new(Box::new(left), Box::new(right));
                next_join.set_schema(joined_schema.clone());
                side.push(chain);
                chain = Box::new(next_join);
            }

            // 未被任何连接消费的扫描同样归计划所有，统一释放
            for slot in scans.iter_mut() {
                if let Some(scan) = slot.take() {
                    side.push(Box::new(scan));
                }
            }

            if predicates.is_empty() {
                // 无谓词时在全笛卡尔积上加一级直通过滤
                chain = Box::new(Selection::new(chain, Vec::new()));
            } else {
                check::predicates(&joined_schema, &predicates)?;
                for group in predicates {
                    chain = Box::new(Selection::new(chain, group));
                }
            }
            (chain, joined_schema)
        };

        // 解析投影列下标：空列表即 '*'，按模式自然顺序输出全部列
        let indices: Vec<usize> = if columns.is_empty() {
            (0..chain_schema.len()).collect()
        } else {
            columns
                .iter()
                .map(|column| check::column_exists(&chain_schema, column))
                .collect::<Result<Vec<usize>>>()?
        };

        let projection = Projection::new(chain, indices);
        Ok(Self {
            projection,
            side,
            is_explain,
        })
    }

    /// 执行计划；只能执行一次
    pub fn run(mut self) -> Result<QueryResult> {
        if self.is_explain {
            let tree = self.projection.explain();
            self.close();
            return Ok(QueryResult::Explain(tree));
        }

        let columns = self.projection.schema().column_names();
        let mut rows = Vec::new();
        loop {
            match self.projection.next() {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => break,
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }
        self.close();
        Ok(QueryResult::Select(ResultSet { columns, rows }))
    }

    fn close(&mut self) {
        self.projection.close();
        for op in &mut self.side {
            op.close();
        }
    }
}

/// 取出第 index 张表的扫描；同一扫描被多个连接消费时补开一个新的
fn take_scan(
    scans: &mut [Option<FileScan>],
    index: usize,
    tables: &[String],
    storage: &StorageEngine,
) -> Result<FileScan> {
    match scans.get_mut(index).and_then(|slot| slot.take()) {
        Some(scan) => Ok(scan),
        None => FileScan::open(storage, &tables[index]),
    }
}
