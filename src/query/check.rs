//! 校验器 - 在任何数据被改动之前完成表/列存在性与类型检查
//!
//! 所有函数只在计划构建阶段调用，失败一律返回 [`DBError::Validation`]。

use crate::error::{DBError, Result};
use crate::query::predicate::{Operand, Predicate};
use crate::storage::catalog::Catalog;
use crate::storage::table::{ColumnDef, DataType, Schema, Value};

/// 操作数的类型归类，用于谓词两侧的相容性判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeClass {
    Number,
    Text,
    Bool,
}

fn class_of_type(data_type: &DataType) -> TypeClass {
    match data_type {
        DataType::Int(_) | DataType::Float => TypeClass::Number,
        DataType::Varchar(_) => TypeClass::Text,
    }
}

fn class_of_value(value: &Value) -> Option<TypeClass> {
    match value {
        Value::Int(_) | Value::Float(_) => Some(TypeClass::Number),
        Value::String(_) => Some(TypeClass::Text),
        Value::Boolean(_) => Some(TypeClass::Bool),
        Value::Null => None,
    }
}

/// 校验表存在，返回其模式的副本
pub fn table_exists(catalog: &Catalog, name: &str) -> Result<Schema> {
    catalog.schema_of(name).cloned()
}

/// 校验列在模式中存在，返回列下标
pub fn column_exists(schema: &Schema, name: &str) -> Result<usize> {
    schema
        .index_of(name)
        .ok_or_else(|| DBError::Validation(format!("列 '{}' 不存在", name)))
}

/// 校验谓词组表达式对模式类型正确
pub fn predicates(schema: &Schema, groups: &[Vec<Predicate>]) -> Result<()> {
    for group in groups {
        for predicate in group {
            let left = operand_class(schema, &predicate.left)?;
            let right = operand_class(schema, &predicate.right)?;
            if let (Some(l), Some(r)) = (left, right) {
                if l != r {
                    return Err(DBError::Validation(format!(
                        "谓词 '{}' 两侧类型不匹配",
                        predicate
                    )));
                }
            }
        }
    }
    Ok(())
}

fn operand_class(schema: &Schema, operand: &Operand) -> Result<Option<TypeClass>> {
    match operand {
        Operand::Column(name) => {
            let idx = column_exists(schema, name)?;
            // 下标来自 index_of，必然有效
            Ok(schema
                .columns()
                .get(idx)
                .map(|col| class_of_type(&col.data_type)))
        }
        Operand::Literal(value) => Ok(class_of_value(value)),
    }
}

/// 校验插入值列表与模式的数量和类型匹配
pub fn insert_values(schema: &Schema, values: &[Value]) -> Result<()> {
    if values.len() != schema.len() {
        return Err(DBError::Validation(format!(
            "值的数量({})与列数({})不匹配",
            values.len(),
            schema.len()
        )));
    }

    for (column, value) in schema.columns().iter().zip(values) {
        value_matches_column(column, value)?;
    }
    Ok(())
}

/// 校验更新的目标列都存在，返回各列下标
pub fn update_fields(schema: &Schema, columns: &[String]) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|name| column_exists(schema, name))
        .collect()
}

/// 校验更新值与各目标列的类型匹配
pub fn update_values(schema: &Schema, indices: &[usize], values: &[Value]) -> Result<()> {
    if indices.len() != values.len() {
        return Err(DBError::Validation(format!(
            "更新值的数量({})与目标列数({})不匹配",
            values.len(),
            indices.len()
        )));
    }

    for (&idx, value) in indices.iter().zip(values) {
        if let Some(column) = schema.columns().get(idx) {
            value_matches_column(column, value)?;
        }
    }
    Ok(())
}

fn value_matches_column(column: &ColumnDef, value: &Value) -> Result<()> {
    match (value, &column.data_type) {
        (Value::Null, _) => {
            if column.not_null {
                return Err(DBError::Validation(format!(
                    "列 '{}' 不允许为空",
                    column.name
                )));
            }
            Ok(())
        }
        (Value::Int(_), DataType::Int(_)) => Ok(()),
        // 整数字面量可以落入浮点列
        (Value::Int(_), DataType::Float) | (Value::Float(_), DataType::Float) => Ok(()),
        (Value::String(s), DataType::Varchar(max_len)) => {
            if s.len() as u64 > *max_len {
                return Err(DBError::Validation(format!(
                    "字符串长度({})超过了VARCHAR({})的限制",
                    s.len(),
                    max_len
                )));
            }
            Ok(())
        }
        _ => Err(DBError::Validation(format!(
            "值 {:?} 与列 '{}' 的类型 {} 不匹配",
            value, column.name, column.data_type
        ))),
    }
}
