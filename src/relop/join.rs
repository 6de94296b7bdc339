use crate::error::Result;
use crate::relop::{push_explain_line, Operator, Row};
use crate::storage::table::Schema;

/// 嵌套循环连接 - 产出左右两侧行的全笛卡尔积
///
/// 右侧在第一次拉取时整体物化，之后对每个左行重放一遍。
/// 输出模式默认是左右模式的拼接，也可由计划层通过 [`set_schema`]
/// 覆盖为更宽的运行模式。
///
/// [`set_schema`]: SimpleJoin::set_schema
pub struct SimpleJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    schema: Schema,
    right_rows: Vec<Row>,
    right_loaded: bool,
    current_left: Option<Row>,
    right_pos: usize,
}

impl SimpleJoin {
    pub fn new(left: Box<dyn Operator>, right: Box<dyn Operator>) -> Self {
        let schema = left.schema().concat(right.schema());
        Self {
            left,
            right,
            schema,
            right_rows: Vec::new(),
            right_loaded: false,
            current_left: None,
            right_pos: 0,
        }
    }

    /// 覆盖输出模式
    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
    }
}

impl Operator for SimpleJoin {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.right_loaded {
            while let Some(row) = self.right.next()? {
                self.right_rows.push(row);
            }
            self.right_loaded = true;
        }

        loop {
            if self.current_left.is_none() {
                self.current_left = self.left.next()?;
                self.right_pos = 0;
                if self.current_left.is_none() {
                    return Ok(None);
                }
            }

            if self.right_pos >= self.right_rows.len() {
                self.current_left = None;
                continue;
            }

            if let Some(left_row) = &self.current_left {
                let right_row = &self.right_rows[self.right_pos];
                let mut combined = Vec::with_capacity(left_row.len() + right_row.len());
                combined.extend_from_slice(left_row);
                combined.extend_from_slice(right_row);
                self.right_pos += 1;
                return Ok(Some(combined));
            }
        }
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
    }

    fn format_explain(&self, out: &mut String, indent: usize) {
        push_explain_line(out, indent, "SimpleJoin");
        self.left.format_explain(out, indent + 1);
        self.right.format_explain(out, indent + 1);
    }
}
