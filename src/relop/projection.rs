use crate::error::{DBError, Result};
use crate::relop::{push_explain_line, Operator, Row};
use crate::storage::table::Schema;

/// 投影算子 - 把每行限制到给定的列下标序列
///
/// 投影总是位于Select算子链的顶端，是对外可见的结果集，
/// 也是整条下游链的唯一所有者。
pub struct Projection {
    child: Box<dyn Operator>,
    schema: Schema,
    indices: Vec<usize>,
}

impl Projection {
    pub fn new(child: Box<dyn Operator>, indices: Vec<usize>) -> Self {
        let schema = child.schema().project(&indices);
        Self {
            child,
            schema,
            indices,
        }
    }
}

impl Operator for Projection {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> Result<Option<Row>> {
        let row = match self.child.next()? {
            Some(row) => row,
            None => return Ok(None),
        };
        let projected = self
            .indices
            .iter()
            .map(|&i| {
                row.get(i)
                    .cloned()
                    .ok_or_else(|| DBError::Execution(format!("投影下标 {} 超出行宽", i)))
            })
            .collect::<Result<Row>>()?;
        Ok(Some(projected))
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn format_explain(&self, out: &mut String, indent: usize) {
        let names = self.schema.column_names().join(", ");
        push_explain_line(out, indent, &format!("Projection : {}", names));
        self.child.format_explain(out, indent + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::table::{ColumnDef, DataType, Value};

    struct RowSource {
        schema: Schema,
        rows: Vec<Row>,
        cursor: usize,
    }

    impl Operator for RowSource {
        fn schema(&self) -> &Schema {
            &self.schema
        }

        fn next(&mut self) -> Result<Option<Row>> {
            let row = self.rows.get(self.cursor).cloned();
            self.cursor += 1;
            Ok(row)
        }

        fn close(&mut self) {}

        fn format_explain(&self, out: &mut String, indent: usize) {
            push_explain_line(out, indent, "RowSource");
        }
    }

    fn source() -> RowSource {
        let schema = Schema::new(
            ["a", "b", "c"]
                .iter()
                .map(|name| ColumnDef {
                    name: name.to_string(),
                    data_type: DataType::Int(32),
                    not_null: false,
                    unique: false,
                    is_primary: false,
                })
                .collect(),
        );
        RowSource {
            schema,
            rows: vec![vec![Value::Int(1), Value::Int(2), Value::Int(3)]],
            cursor: 0,
        }
    }

    #[test]
    fn test_projection_restricts_and_reorders() {
        let mut projection = Projection::new(Box::new(source()), vec![2, 0]);

        assert_eq!(projection.schema().column_names(), vec!["c", "a"]);
        assert_eq!(
            projection.next().unwrap(),
            Some(vec![Value::Int(3), Value::Int(1)])
        );
        assert_eq!(projection.next().unwrap(), None);
    }

    #[test]
    fn test_projection_out_of_range_index() {
        let mut projection = Projection::new(Box::new(source()), vec![9]);
        assert!(projection.next().is_err());
    }

    #[test]
    fn test_projection_explain() {
        let projection = Projection::new(Box::new(source()), vec![0, 1]);
        assert_eq!(projection.explain(), "Projection : a, b\n  RowSource\n");
    }
}
