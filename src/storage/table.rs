use std::fmt;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::{DBError, Result};

/// 表示数据类型的枚举
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int(u64),
    Float,
    Varchar(u64),
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int(size) => write!(f, "INT({})", size),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Varchar(len) => write!(f, "VARCHAR({})", len),
        }
    }
}

/// 表示列定义的结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,

    // 约束
    pub not_null: bool,
    pub unique: bool,
    pub is_primary: bool, // is_primary => not_null && unique
}

/// 模式 - 一张表（或一条连接结果）的有序列定义集合
///
/// 模式一经构建便不再修改；计划和算子按需从目录克隆出自己的副本。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// 获取列定义
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// 列数
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// 按列名查找列下标
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// 拼接两个模式，产生左列在前、右列在后的新模式（用于连接）
    pub fn concat(&self, other: &Schema) -> Schema {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        Schema { columns }
    }

    /// 按下标列表抽取列，产生投影后的新模式
    pub fn project(&self, indices: &[usize]) -> Schema {
        let columns = indices
            .iter()
            .filter_map(|&i| self.columns.get(i).cloned())
            .collect();
        Schema { columns }
    }

    /// 所有列名
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| Field | Type | Null | Key |")?;
        writeln!(f, "| ----- | ---- | ---- | --- |")?;
        for col in &self.columns {
            let null = if col.not_null { "NO" } else { "YES" };
            let key = if col.is_primary {
                "PRI"
            } else if col.unique {
                "UNI"
            } else {
                ""
            };
            writeln!(f, "| {} | {} | {} | {} |", col.name, col.data_type, null, key)?;
        }
        Ok(())
    }
}

/// 表示值的枚举
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum Value {
    Int(i32),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl Value {
    pub fn eq(&self, other: &Self) -> Result<bool> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Float(a), Value::Float(b)) => Ok(a == b),
            (Value::Int(a), Value::Float(b)) => Ok(*a as f64 == *b),
            (Value::Float(a), Value::Int(b)) => Ok(*a == *b as f64),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
            _ => Err(DBError::Execution("类型不匹配，无法比较".to_string())),
        }
    }

    pub fn ne(&self, other: &Self) -> Result<bool> {
        match (self, other) {
            // NULL 与任何值比较都不成立
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            _ => self.eq(other).map(|result| !result),
        }
    }

    pub fn lt(&self, other: &Self) -> Result<bool> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            (Value::Int(a), Value::Int(b)) => Ok(a < b),
            (Value::Float(a), Value::Float(b)) => Ok(a < b),
            (Value::Int(a), Value::Float(b)) => Ok((*a as f64) < *b),
            (Value::Float(a), Value::Int(b)) => Ok(*a < *b as f64),
            (Value::String(a), Value::String(b)) => Ok(a < b),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(!*a && *b),
            _ => Err(DBError::Execution("类型不匹配，无法比较".to_string())),
        }
    }

    pub fn le(&self, other: &Self) -> Result<bool> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            (Value::Int(a), Value::Int(b)) => Ok(a <= b),
            (Value::Float(a), Value::Float(b)) => Ok(a <= b),
            (Value::Int(a), Value::Float(b)) => Ok(*a as f64 <= *b),
            (Value::Float(a), Value::Int(b)) => Ok(*a <= *b as f64),
            (Value::String(a), Value::String(b)) => Ok(a <= b),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(!*a || *b),
            _ => Err(DBError::Execution("类型不匹配，无法比较".to_string())),
        }
    }

    pub fn gt(&self, other: &Self) -> Result<bool> {
        other.lt(self)
    }

    pub fn ge(&self, other: &Self) -> Result<bool> {
        other.le(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// 元组 - 绑定到模式上的一行物化数据
///
/// 元组是瞬态的：逐行产生、逐行消费，从不直接持久化。
#[derive(Debug)]
pub struct Tuple<'a> {
    schema: &'a Schema,
    values: Vec<Value>,
}

impl<'a> Tuple<'a> {
    pub fn new(schema: &'a Schema, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 按列名取字段值
    pub fn get(&self, name: &str) -> Result<&Value> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| DBError::Execution(format!("列 '{}' 不存在", name)))?;
        self.values
            .get(idx)
            .ok_or_else(|| DBError::Execution(format!("列 '{}' 超出行宽", name)))
    }

    /// 按列名写字段值
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| DBError::Execution(format!("列 '{}' 不存在", name)))?;
        if idx >= self.values.len() {
            return Err(DBError::Execution(format!("列 '{}' 超出行宽", name)));
        }
        self.values[idx] = value;
        Ok(())
    }

    /// 转回存储层的原始行表示
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_col(name: &str) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            data_type: DataType::Int(32),
            not_null: false,
            unique: false,
            is_primary: false,
        }
    }

    fn test_schema() -> Schema {
        Schema::new(vec![int_col("a"), int_col("b"), int_col("c")])
    }

    #[test]
    fn test_schema_index_of() {
        let schema = test_schema();
        assert_eq!(schema.index_of("a"), Some(0));
        assert_eq!(schema.index_of("c"), Some(2));
        assert_eq!(schema.index_of("x"), None);
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_schema_concat() {
        let left = Schema::new(vec![int_col("a"), int_col("b")]);
        let right = Schema::new(vec![int_col("x")]);
        let joined = left.concat(&right);

        assert_eq!(joined.len(), 3);
        assert_eq!(joined.column_names(), vec!["a", "b", "x"]);
        // 拼接不改变原模式
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 1);
    }

    #[test]
    fn test_schema_project() {
        let schema = test_schema();
        let projected = schema.project(&[2, 0]);
        assert_eq!(projected.column_names(), vec!["c", "a"]);
    }

    #[test]
    fn test_value_compare_numeric() {
        assert!(Value::Int(1).eq(&Value::Int(1)).unwrap());
        assert!(Value::Int(1).lt(&Value::Int(2)).unwrap());
        assert!(Value::Int(1).le(&Value::Float(1.0)).unwrap());
        assert!(Value::Float(2.5).gt(&Value::Int(2)).unwrap());
        assert!(Value::Int(3).ne(&Value::Int(4)).unwrap());
    }

    #[test]
    fn test_value_compare_null() {
        // NULL 与任何值比较都不成立
        assert!(!Value::Null.eq(&Value::Int(1)).unwrap());
        assert!(!Value::Null.eq(&Value::Null).unwrap());
        assert!(!Value::Int(1).lt(&Value::Null).unwrap());
        assert!(!Value::Null.ne(&Value::Int(1)).unwrap());
    }

    #[test]
    fn test_value_compare_mismatch() {
        assert!(Value::Int(1).eq(&Value::String("1".to_string())).is_err());
        assert!(Value::Boolean(true).lt(&Value::Int(0)).is_err());
    }

    #[test]
    fn test_tuple_get_set() {
        let schema = test_schema();
        let mut tuple = Tuple::new(
            &schema,
            vec![Value::Int(1), Value::Int(10), Value::Int(100)],
        );

        assert_eq!(tuple.get("b").unwrap(), &Value::Int(10));
        tuple.set("b", Value::Int(42)).unwrap();
        assert_eq!(tuple.get("b").unwrap(), &Value::Int(42));

        assert!(tuple.get("missing").is_err());
        assert!(tuple.set("missing", Value::Null).is_err());

        assert_eq!(
            tuple.into_values(),
            vec![Value::Int(1), Value::Int(42), Value::Int(100)]
        );
    }
}
