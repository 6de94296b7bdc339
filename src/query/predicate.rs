use std::fmt;

use crate::error::Result;
use crate::storage::table::{Tuple, Value};

/// 谓词操作数 - 列引用或字面量
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(Value),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(name) => write!(f, "{}", name),
            Operand::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Operand::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,    // =
    NotEq, // <>
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// 原子谓词 - 两个操作数在一个比较操作符下的比较
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
}

impl Predicate {
    pub fn new(left: Operand, op: CompareOp, right: Operand) -> Self {
        Self { left, op, right }
    }

    /// 对一行元组求值
    pub fn evaluate(&self, tuple: &Tuple) -> Result<bool> {
        let left = resolve_operand(&self.left, tuple)?;
        let right = resolve_operand(&self.right, tuple)?;
        match self.op {
            CompareOp::Eq => left.eq(right),
            CompareOp::NotEq => left.ne(right),
            CompareOp::Lt => left.lt(right),
            CompareOp::LtEq => left.le(right),
            CompareOp::Gt => left.gt(right),
            CompareOp::GtEq => left.ge(right),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

fn resolve_operand<'a>(operand: &'a Operand, tuple: &'a Tuple) -> Result<&'a Value> {
    match operand {
        Operand::Column(name) => tuple.get(name),
        Operand::Literal(value) => Ok(value),
    }
}

/// 谓词组表达式 - 外层为AND连接的组，组内为OR连接的谓词
pub type PredicateGroups = Vec<Vec<Predicate>>;

/// 对单个谓词组求值：组内任意谓词成立即成立（短路OR）
pub fn evaluate_group(group: &[Predicate], tuple: &Tuple) -> Result<bool> {
    for predicate in group {
        if predicate.evaluate(tuple)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// 对谓词组表达式求值：每个组都至少有一个谓词成立才成立（短路AND）
///
/// 空的组序列表示"无过滤"，恒为真。Delete 和 Update 直接调用本函数逐行
/// 判定；Select 以每组一级过滤算子的串联实现同一语义。
pub fn evaluate_groups(groups: &[Vec<Predicate>], tuple: &Tuple) -> Result<bool> {
    for group in groups {
        if !evaluate_group(group, tuple)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// 以"(p1 OR p2)"的形式渲染一个谓词组，用于EXPLAIN输出
pub fn format_group(group: &[Predicate]) -> String {
    let parts: Vec<String> = group.iter().map(|p| p.to_string()).collect();
    format!("({})", parts.join(" OR "))
}
