use crate::error::Result;
use crate::query::predicate::{evaluate_group, format_group, Predicate};
use crate::relop::{push_explain_line, Operator, Row};
use crate::storage::table::{Schema, Tuple};

/// 过滤算子 - 携带一个谓词组，只放行组内至少一个谓词成立的行
///
/// 空谓词组表示直通。多个组串联成链即得到组间AND的整体语义：
/// 每一级都完全决定哪些行能到达下一级。
pub struct Selection {
    child: Box<dyn Operator>,
    schema: Schema,
    group: Vec<Predicate>,
}

impl Selection {
    pub fn new(child: Box<dyn Operator>, group: Vec<Predicate>) -> Self {
        let schema = child.schema().clone();
        Self {
            child,
            schema,
            group,
        }
    }
}

impl Operator for Selection {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> Result<Option<Row>> {
        loop {
            let row = match self.child.next()? {
                Some(row) => row,
                None => return Ok(None),
            };
            if self.group.is_empty() {
                return Ok(Some(row));
            }
            let tuple = Tuple::new(&self.schema, row);
            if evaluate_group(&self.group, &tuple)? {
                return Ok(Some(tuple.into_values()));
            }
        }
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn format_explain(&self, out: &mut String, indent: usize) {
        if self.group.is_empty() {
            push_explain_line(out, indent, "Selection");
        } else {
            push_explain_line(
                out,
                indent,
                &format!("Selection : {}", format_group(&self.group)),
            );
        }
        self.child.format_explain(out, indent + 1);
    }
}
