//! 语句分析器 - 把 sqlparser 的 AST 转换为内部语句树
//!
//! WHERE 子句要求合取范式：顶层 AND 连接若干组，组内 OR 连接原子比较，
//! 每个原子比较的两侧是列引用或字面量。不满足该形状的表达式在这里报错。

use sqlparser::ast;

use crate::error::{DBError, Result};
use crate::query::predicate::{CompareOp, Operand, Predicate, PredicateGroups};
use crate::query::statement::{SelectStatement, Statement};
use crate::storage::table::{ColumnDef, DataType, Value};

/// 把一条 AST 语句分析为内部语句树
pub fn analyze(stmt: &ast::Statement) -> Result<Statement> {
    match stmt {
        ast::Statement::CreateTable(create_table) => analyze_create_table(create_table),
        ast::Statement::Drop {
            object_type, names, ..
        } => analyze_drop(object_type, names),
        ast::Statement::Query(query) => Ok(Statement::Select(analyze_query(query, false)?)),
        ast::Statement::Insert(insert) => analyze_insert(insert),
        ast::Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => analyze_update(table, assignments, selection),
        ast::Statement::Delete(delete) => analyze_delete(delete),
        ast::Statement::ExplainTable { table_name, .. } => Ok(Statement::Describe {
            table: table_name.to_string(),
        }),
        ast::Statement::Explain { statement, .. } => match statement.as_ref() {
            ast::Statement::Query(query) => Ok(Statement::Select(analyze_query(query, true)?)),
            _ => Err(DBError::Parse("仅支持 EXPLAIN SELECT".to_string())),
        },
        _ => Err(DBError::Parse(format!("不支持的SQL语句类型: {:?}", stmt))),
    }
}

fn analyze_create_table(create_table: &ast::CreateTable) -> Result<Statement> {
    Ok(Statement::CreateTable {
        name: create_table.name.to_string(),
        columns: analyze_column_definitions(&create_table.columns)?,
    })
}

/// 解析列定义
fn analyze_column_definitions(cols: &[ast::ColumnDef]) -> Result<Vec<ColumnDef>> {
    let mut columns = Vec::with_capacity(cols.len());

    for col in cols {
        let name = col.name.to_string();

        let data_type = match &col.data_type {
            ast::DataType::Int(size) | ast::DataType::Integer(size) => {
                DataType::Int(size.unwrap_or(32))
            }
            ast::DataType::Float(_) | ast::DataType::Double(_) => DataType::Float,
            ast::DataType::Varchar(length) => match length {
                Some(ast::CharacterLength::IntegerLength { length, .. }) => {
                    DataType::Varchar(*length)
                }
                None | Some(ast::CharacterLength::Max) => DataType::Varchar(u64::MAX),
            },
            _ => return Err(DBError::Parse(format!("不支持的列类型: {:?}", col))),
        };

        let mut not_null = false;
        let mut unique = false;
        let mut is_primary = false;

        for constraint in &col.options {
            match constraint.option {
                ast::ColumnOption::NotNull => {
                    not_null = true;
                }
                ast::ColumnOption::Unique {
                    is_primary: primary,
                    ..
                } => {
                    unique = true;
                    is_primary = primary;
                    not_null = not_null || primary;
                }
                _ => {
                    return Err(DBError::Parse(format!("不支持的列选项: {:?}", constraint)));
                }
            }
        }

        columns.push(ColumnDef {
            name,
            data_type,
            not_null,
            unique,
            is_primary,
        });
    }

    Ok(columns)
}

fn analyze_drop(object_type: &ast::ObjectType, names: &[ast::ObjectName]) -> Result<Statement> {
    match object_type {
        ast::ObjectType::Table => {
            if let Some(name) = names.first() {
                Ok(Statement::DropTable {
                    name: name.to_string(),
                })
            } else {
                Err(DBError::Parse("DROP TABLE缺少表名".to_string()))
            }
        }
        _ => Err(DBError::Parse(format!(
            "不支持的DROP操作: {:?}",
            object_type
        ))),
    }
}

fn analyze_query(query: &ast::Query, is_explain: bool) -> Result<SelectStatement> {
    if query.order_by.is_some() {
        return Err(DBError::Parse("不支持 ORDER BY".to_string()));
    }

    let body = match &*query.body {
        ast::SetExpr::Select(select) => &**select,
        _ => return Err(DBError::Parse("仅支持SELECT查询".to_string())),
    };
    if body.from.is_empty() {
        return Err(DBError::Parse("SELECT 需要 FROM 子句".to_string()));
    }

    let mut tables = Vec::with_capacity(body.from.len());
    for item in &body.from {
        if !item.joins.is_empty() {
            return Err(DBError::Parse(
                "不支持 JOIN 语法，请使用逗号分隔的表列表".to_string(),
            ));
        }
        tables.push(table_factor_name(&item.relation)?);
    }

    let columns = analyze_select_columns(&body.projection)?;

    let predicates = match &body.selection {
        Some(expr) => analyze_where(expr)?,
        None => Vec::new(),
    };

    Ok(SelectStatement {
        tables,
        columns,
        predicates,
        is_explain,
    })
}

/// 解析选择列；单独的 '*' 产出空列表
fn analyze_select_columns(projection: &[ast::SelectItem]) -> Result<Vec<String>> {
    let mut columns = Vec::new();
    let mut has_wildcard = false;

    for item in projection {
        match item {
            ast::SelectItem::UnnamedExpr(ast::Expr::Identifier(ident)) => {
                columns.push(ident.value.clone());
            }
            ast::SelectItem::UnnamedExpr(_) | ast::SelectItem::ExprWithAlias { .. } => {
                return Err(DBError::Parse(
                    "选择列仅支持列名或单独的 '*'".to_string(),
                ));
            }
            ast::SelectItem::Wildcard(_) | ast::SelectItem::QualifiedWildcard(_, _) => {
                has_wildcard = true;
            }
        }
    }

    if has_wildcard {
        if !columns.is_empty() {
            return Err(DBError::Parse("通配符不能与列名混用".to_string()));
        }
        return Ok(Vec::new());
    }
    Ok(columns)
}

fn analyze_insert(insert: &ast::Insert) -> Result<Statement> {
    let table = match &insert.table {
        ast::TableObject::TableName(name) => name.to_string(),
        _ => return Err(DBError::Parse("仅支持简单表引用".to_string())),
    };

    if !insert.columns.is_empty() {
        return Err(DBError::Parse(
            "INSERT 不支持显式列名，值需按表定义顺序给出".to_string(),
        ));
    }

    let source = insert
        .source
        .as_ref()
        .ok_or_else(|| DBError::Parse("INSERT 缺少 VALUES 子句".to_string()))?;
    let rows = match &*source.body {
        ast::SetExpr::Values(values) => &values.rows,
        _ => return Err(DBError::Parse("INSERT 仅支持 VALUES 形式".to_string())),
    };
    if rows.len() != 1 {
        return Err(DBError::Parse("仅支持单行插入".to_string()));
    }

    let values = rows[0]
        .iter()
        .map(analyze_literal)
        .collect::<Result<Vec<Value>>>()?;

    Ok(Statement::Insert { table, values })
}

fn analyze_update(
    table: &ast::TableWithJoins,
    assignments: &[ast::Assignment],
    selection: &Option<ast::Expr>,
) -> Result<Statement> {
    if !table.joins.is_empty() {
        return Err(DBError::Parse("仅支持单表更新".to_string()));
    }
    let table = table_factor_name(&table.relation)?;

    // 解析SET子句
    let mut pairs = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let column = assignment.target.to_string();
        let value = analyze_literal(&assignment.value)?;
        pairs.push((column, value));
    }

    // 解析WHERE子句
    let predicates = match selection {
        Some(expr) => analyze_where(expr)?,
        None => Vec::new(),
    };

    Ok(Statement::Update {
        table,
        assignments: pairs,
        predicates,
    })
}

fn analyze_delete(delete: &ast::Delete) -> Result<Statement> {
    let from = match &delete.from {
        ast::FromTable::WithFromKeyword(from) | ast::FromTable::WithoutKeyword(from) => from,
    };
    if from.len() != 1 || !from[0].joins.is_empty() {
        return Err(DBError::Parse("仅支持单表删除".to_string()));
    }
    let table = table_factor_name(&from[0].relation)?;

    let predicates = match &delete.selection {
        Some(expr) => analyze_where(expr)?,
        None => Vec::new(),
    };

    Ok(Statement::Delete { table, predicates })
}

fn table_factor_name(relation: &ast::TableFactor) -> Result<String> {
    match relation {
        ast::TableFactor::Table { name, .. } => Ok(name.to_string()),
        _ => Err(DBError::Parse("仅支持简单表引用".to_string())),
    }
}

/// 把WHERE表达式按顶层AND拆成谓词组
fn analyze_where(expr: &ast::Expr) -> Result<PredicateGroups> {
    let mut groups = Vec::new();
    collect_and(expr, &mut groups)?;
    Ok(groups)
}

fn collect_and(expr: &ast::Expr, groups: &mut PredicateGroups) -> Result<()> {
    match expr {
        ast::Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::And,
            right,
        } => {
            collect_and(left, groups)?;
            collect_and(right, groups)?;
            Ok(())
        }
        ast::Expr::Nested(inner) => collect_and(inner, groups),
        _ => {
            groups.push(collect_or(expr)?);
            Ok(())
        }
    }
}

fn collect_or(expr: &ast::Expr) -> Result<Vec<Predicate>> {
    match expr {
        ast::Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Or,
            right,
        } => {
            let mut predicates = collect_or(left)?;
            predicates.extend(collect_or(right)?);
            Ok(predicates)
        }
        ast::Expr::Nested(inner) => collect_or(inner),
        _ => Ok(vec![analyze_comparison(expr)?]),
    }
}

fn analyze_comparison(expr: &ast::Expr) -> Result<Predicate> {
    match expr {
        ast::Expr::BinaryOp { left, op, right } => {
            let op = match op {
                ast::BinaryOperator::Eq => CompareOp::Eq,
                ast::BinaryOperator::NotEq => CompareOp::NotEq,
                ast::BinaryOperator::Lt => CompareOp::Lt,
                ast::BinaryOperator::LtEq => CompareOp::LtEq,
                ast::BinaryOperator::Gt => CompareOp::Gt,
                ast::BinaryOperator::GtEq => CompareOp::GtEq,
                _ => {
                    return Err(DBError::Parse(format!(
                        "WHERE 子句必须是 AND 连接的 OR 组，不支持操作符: {}",
                        op
                    )));
                }
            };
            Ok(Predicate::new(
                analyze_operand(left)?,
                op,
                analyze_operand(right)?,
            ))
        }
        _ => Err(DBError::Parse(format!(
            "不支持的WHERE表达式: {:?}",
            expr
        ))),
    }
}

fn analyze_operand(expr: &ast::Expr) -> Result<Operand> {
    match expr {
        ast::Expr::Identifier(ident) => Ok(Operand::Column(ident.value.clone())),
        ast::Expr::Nested(inner) => analyze_operand(inner),
        _ => Ok(Operand::Literal(analyze_literal(expr)?)),
    }
}

/// 把字面量表达式转换为内部值，支持负号前缀
fn analyze_literal(expr: &ast::Expr) -> Result<Value> {
    match expr {
        ast::Expr::Value(value_with_span) => analyze_value(&value_with_span.value),
        ast::Expr::UnaryOp {
            op: ast::UnaryOperator::Minus,
            expr,
        } => match analyze_literal(expr)? {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(f) => Ok(Value::Float(-f)),
            _ => Err(DBError::Parse("只能对数值取负".to_string())),
        },
        ast::Expr::Nested(inner) => analyze_literal(inner),
        _ => Err(DBError::Parse(format!("不支持的表达式: {:?}", expr))),
    }
}

fn analyze_value(value: &ast::Value) -> Result<Value> {
    match value {
        ast::Value::Number(n, _) => {
            if n.contains('.') {
                Ok(Value::Float(n.parse().map_err(|e| {
                    DBError::Parse(format!("无法解析浮点数: {}", e))
                })?))
            } else {
                let parsed: i64 = n
                    .parse()
                    .map_err(|e| DBError::Parse(format!("无法解析整数: {}", e)))?;
                if parsed > i32::MAX as i64 || parsed < i32::MIN as i64 {
                    return Err(DBError::Parse("整数超出i32范围".to_string()));
                }
                Ok(Value::Int(parsed as i32))
            }
        }
        ast::Value::SingleQuotedString(s) | ast::Value::DoubleQuotedString(s) => {
            Ok(Value::String(s.clone()))
        }
        ast::Value::Boolean(b) => Ok(Value::Boolean(*b)),
        ast::Value::Null => Ok(Value::Null),
        _ => Err(DBError::Parse(format!("不支持的值类型: {:?}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(sql: &str) -> ast::Statement {
        let dialect = sqlparser::dialect::MySqlDialect {};
        let mut statements = sqlparser::parser::Parser::parse_sql(&dialect, sql).unwrap();
        statements.remove(0)
    }

    fn analyze_one(sql: &str) -> Result<Statement> {
        analyze(&parse_one(sql))
    }

    #[test]
    fn test_analyze_create_table() {
        let stmt = analyze_one(
            "CREATE TABLE users (id INT(32) PRIMARY KEY, name VARCHAR(100), score FLOAT);",
        )
        .unwrap();

        if let Statement::CreateTable { name, columns } = stmt {
            assert_eq!(name, "users");
            assert_eq!(columns.len(), 3);
            assert_eq!(columns[0].name, "id");
            assert_eq!(columns[0].data_type, DataType::Int(32));
            assert!(columns[0].is_primary);
            assert!(columns[0].not_null);
            assert_eq!(columns[1].data_type, DataType::Varchar(100));
            assert_eq!(columns[2].data_type, DataType::Float);
        } else {
            panic!("预期生成CreateTable语句");
        }
    }

    #[test]
    fn test_analyze_drop_table() {
        let stmt = analyze_one("DROP TABLE users;").unwrap();
        assert_eq!(
            stmt,
            Statement::DropTable {
                name: "users".to_string()
            }
        );
    }

    #[test]
    fn test_analyze_select_single_table() {
        let stmt = analyze_one("SELECT id, name FROM users WHERE id > 10;").unwrap();

        if let Statement::Select(select) = stmt {
            assert_eq!(select.tables, vec!["users"]);
            assert_eq!(select.columns, vec!["id", "name"]);
            assert_eq!(select.predicates.len(), 1);
            assert!(!select.is_explain);
        } else {
            panic!("预期生成Select语句");
        }
    }

    #[test]
    fn test_analyze_select_wildcard() {
        let stmt = analyze_one("SELECT * FROM users;").unwrap();
        if let Statement::Select(select) = stmt {
            assert!(select.columns.is_empty());
            assert!(select.predicates.is_empty());
        } else {
            panic!("预期生成Select语句");
        }
    }

    #[test]
    fn test_analyze_select_multi_table() {
        let stmt = analyze_one("SELECT a FROM t1, t2, t3;").unwrap();
        if let Statement::Select(select) = stmt {
            assert_eq!(select.tables, vec!["t1", "t2", "t3"]);
        } else {
            panic!("预期生成Select语句");
        }
    }

    #[test]
    fn test_analyze_where_cnf_groups() {
        let stmt =
            analyze_one("SELECT * FROM t WHERE a = 1 AND (b = 2 OR c = 3) AND d < -4;").unwrap();

        if let Statement::Select(select) = stmt {
            let groups = &select.predicates;
            assert_eq!(groups.len(), 3);
            assert_eq!(groups[0].len(), 1);
            assert_eq!(groups[1].len(), 2);
            assert_eq!(groups[2].len(), 1);

            assert_eq!(
                groups[0][0],
                Predicate::new(
                    Operand::Column("a".to_string()),
                    CompareOp::Eq,
                    Operand::Literal(Value::Int(1)),
                )
            );
            assert_eq!(
                groups[1][1],
                Predicate::new(
                    Operand::Column("c".to_string()),
                    CompareOp::Eq,
                    Operand::Literal(Value::Int(3)),
                )
            );
            // 负号字面量
            assert_eq!(
                groups[2][0].right,
                Operand::Literal(Value::Int(-4))
            );
        } else {
            panic!("预期生成Select语句");
        }
    }

    #[test]
    fn test_analyze_where_rejects_non_cnf() {
        // OR 组内嵌套 AND 不是合取范式
        assert!(analyze_one("SELECT * FROM t WHERE a = 1 OR (b = 2 AND c = 3);").is_err());
    }

    #[test]
    fn test_analyze_insert() {
        let stmt = analyze_one("INSERT INTO users VALUES (1, 'Alice', 9.5);").unwrap();
        assert_eq!(
            stmt,
            Statement::Insert {
                table: "users".to_string(),
                values: vec![
                    Value::Int(1),
                    Value::String("Alice".to_string()),
                    Value::Float(9.5),
                ],
            }
        );
    }

    #[test]
    fn test_analyze_insert_rejects_multi_row() {
        assert!(analyze_one("INSERT INTO users VALUES (1), (2);").is_err());
        assert!(analyze_one("INSERT INTO users (id) VALUES (1);").is_err());
    }

    #[test]
    fn test_analyze_update() {
        let stmt = analyze_one("UPDATE users SET name = 'Bob', score = 1.5 WHERE id = 1;").unwrap();

        if let Statement::Update {
            table,
            assignments,
            predicates,
        } = stmt
        {
            assert_eq!(table, "users");
            assert_eq!(assignments.len(), 2);
            assert_eq!(
                assignments[0],
                ("name".to_string(), Value::String("Bob".to_string()))
            );
            assert_eq!(predicates.len(), 1);
        } else {
            panic!("预期生成Update语句");
        }
    }

    #[test]
    fn test_analyze_delete() {
        let stmt = analyze_one("DELETE FROM users WHERE id = 1 OR id = 2;").unwrap();

        if let Statement::Delete { table, predicates } = stmt {
            assert_eq!(table, "users");
            assert_eq!(predicates.len(), 1);
            assert_eq!(predicates[0].len(), 2);
        } else {
            panic!("预期生成Delete语句");
        }
    }

    #[test]
    fn test_analyze_delete_without_predicates() {
        let stmt = analyze_one("DELETE FROM users;").unwrap();
        assert_eq!(
            stmt,
            Statement::Delete {
                table: "users".to_string(),
                predicates: Vec::new(),
            }
        );
    }

    #[test]
    fn test_analyze_describe() {
        let stmt = analyze_one("DESCRIBE users;").unwrap();
        assert_eq!(
            stmt,
            Statement::Describe {
                table: "users".to_string()
            }
        );
    }

    #[test]
    fn test_analyze_explain_select() {
        let stmt = analyze_one("EXPLAIN SELECT * FROM users;").unwrap();
        if let Statement::Select(select) = stmt {
            assert!(select.is_explain);
        } else {
            panic!("预期生成Select语句");
        }
    }

    #[test]
    fn test_analyze_unsupported() {
        assert!(analyze_one("SELECT * FROM t ORDER BY a;").is_err());
        assert!(analyze_one("SELECT a + 1 FROM t;").is_err());
        assert!(analyze_one("SELECT * FROM t1 JOIN t2 ON t1.a = t2.a;").is_err());
    }
}
