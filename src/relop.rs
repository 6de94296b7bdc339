//! 物理关系算子 - 统一的拉取式行协议
//!
//! 每个算子从下游算子逐行拉取数据；链条顶端的算子拥有整条链，
//! 释放顶端即传递式地释放全部下游算子。

pub mod filter;
pub mod join;
pub mod projection;
pub mod scan;

pub use filter::Selection;
pub use join::SimpleJoin;
pub use projection::Projection;
pub use scan::FileScan;

use crate::error::Result;
use crate::storage::table::{Schema, Value};

/// 一行数据
pub type Row = Vec<Value>;

/// 拉取式行算子
pub trait Operator {
    /// 本算子输出行的模式
    fn schema(&self) -> &Schema;

    /// 拉取下一行；耗尽后返回None
    fn next(&mut self) -> Result<Option<Row>>;

    /// 释放本算子及其全部下游算子持有的资源；幂等
    fn close(&mut self);

    /// 以缩进形式把以本算子为根的子树写入输出缓冲
    fn format_explain(&self, out: &mut String, indent: usize);

    /// 渲染以本算子为根的算子树
    fn explain(&self) -> String {
        let mut out = String::new();
        self.format_explain(&mut out, 0);
        out
    }
}

pub(crate) fn push_explain_line(out: &mut String, indent: usize, line: &str) {
    out.push_str(&"  ".repeat(indent));
    out.push_str(line);
    out.push('\n');
}
