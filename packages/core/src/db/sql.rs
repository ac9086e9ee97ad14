//! SQL Rendering for the libsql Store
//!
//! Turns [`Predicate`] and [`BulkUpdate`] values into SQLite statements.
//! Identifiers come from a validated [`TreeConfig`] and are always quoted;
//! every integer computed by the core is passed as a bound parameter, so
//! statement text depends only on the shape of the request.

use crate::config::TreeConfig;
use crate::db::StoreError;
use crate::models::{Bounds, Node};
use crate::tree::{BulkUpdate, Column, Predicate, ShiftExpr, ValueRange};
use libsql::{Row, Value};

/// A statement together with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Quoted identifiers of one nested-set table
#[derive(Debug, Clone)]
pub struct TableSql {
    table_name: String,
    table: String,
    id: String,
    parent_id: String,
    left: String,
    right: String,
    type_column: Option<String>,
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

fn nullable(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

impl TableSql {
    /// Build from a configuration that has already passed `validate()`
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            table_name: config.table.clone(),
            table: quote(&config.table),
            id: quote(&config.id_column),
            parent_id: quote(&config.parent_id_column),
            left: quote(&config.left_column),
            right: quote(&config.right_column),
            type_column: config.type_column.as_deref().map(quote),
        }
    }

    pub fn column(&self, column: Column) -> &str {
        match column {
            Column::Id => &self.id,
            Column::ParentId => &self.parent_id,
            Column::Left => &self.left,
            Column::Right => &self.right,
        }
    }

    fn select_list(&self) -> String {
        let mut columns = vec![
            self.id.as_str(),
            self.parent_id.as_str(),
            self.left.as_str(),
            self.right.as_str(),
        ];
        if let Some(type_column) = &self.type_column {
            columns.push(type_column);
        }
        columns.join(", ")
    }

    pub fn create_table(&self) -> String {
        let type_column = self
            .type_column
            .as_ref()
            .map(|c| format!(",\n    {} TEXT", c))
            .unwrap_or_default();
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    {id} INTEGER PRIMARY KEY AUTOINCREMENT,\n    {parent} INTEGER,\n    {left} INTEGER NOT NULL,\n    {right} INTEGER NOT NULL{type_column}\n)",
            table = self.table,
            id = self.id,
            parent = self.parent_id,
            left = self.left,
            right = self.right,
        )
    }

    pub fn create_indexes(&self) -> Vec<String> {
        [
            ("left", &self.left),
            ("right", &self.right),
            ("parent", &self.parent_id),
        ]
        .iter()
        .map(|(suffix, column)| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                quote(&format!("idx_{}_{}", self.table_name, suffix)),
                self.table,
                column
            )
        })
        .collect()
    }

    /// Render a WHERE condition, appending its parameters
    pub fn render_predicate(&self, predicate: &Predicate, params: &mut Vec<Value>) -> String {
        match predicate {
            Predicate::All => "1 = 1".to_string(),
            Predicate::Compare { column, op, value } => {
                params.push(Value::Integer(*value));
                format!("{} {} ?", self.column(*column), op.as_sql())
            }
            Predicate::IsNull(column) => format!("{} IS NULL", self.column(*column)),
            Predicate::And(parts) => self.render_group(parts, " AND ", "1 = 1", params),
            Predicate::Or(parts) => self.render_group(parts, " OR ", "1 = 0", params),
        }
    }

    fn render_group(
        &self,
        parts: &[Predicate],
        separator: &str,
        empty: &str,
        params: &mut Vec<Value>,
    ) -> String {
        if parts.is_empty() {
            return empty.to_string();
        }
        let rendered: Vec<String> = parts
            .iter()
            .map(|p| self.render_predicate(p, params))
            .collect();
        format!("({})", rendered.join(separator))
    }

    fn render_range(&self, column: &str, range: ValueRange, params: &mut Vec<Value>) -> String {
        match range {
            ValueRange::Between(start, end) => {
                params.push(Value::Integer(start));
                params.push(Value::Integer(end));
                format!("{} BETWEEN ? AND ?", column)
            }
            ValueRange::Above(floor) => {
                params.push(Value::Integer(floor));
                format!("{} > ?", column)
            }
        }
    }

    fn render_outside(&self, column: &str, range: ValueRange, params: &mut Vec<Value>) -> String {
        match range {
            ValueRange::Between(start, end) => {
                params.push(Value::Integer(start));
                params.push(Value::Integer(end));
                format!("{} NOT BETWEEN ? AND ?", column)
            }
            ValueRange::Above(floor) => {
                params.push(Value::Integer(floor));
                format!("{} <= ?", column)
            }
        }
    }

    fn render_shift(&self, column: &str, expr: &ShiftExpr, params: &mut Vec<Value>) -> String {
        if expr.arms.is_empty() {
            return column.to_string();
        }

        let mut sql = String::from("CASE");
        for arm in &expr.arms {
            let mut condition = self.render_range(column, arm.range, params);
            if let Some(exclude) = arm.exclude {
                condition.push_str(" AND ");
                condition.push_str(&self.render_outside(column, exclude, params));
            }
            params.push(Value::Integer(arm.delta));
            sql.push_str(&format!(" WHEN {} THEN {} + ?", condition, column));
        }
        sql.push_str(&format!(" ELSE {} END", column));
        sql
    }

    /// Rows an update can change: any arm matches either bound, or the row
    /// receives a new parent
    fn render_touched(&self, update: &BulkUpdate, params: &mut Vec<Value>) -> String {
        let mut conditions = Vec::new();
        for (column, expr) in [(&self.left, &update.left), (&self.right, &update.right)] {
            for arm in &expr.arms {
                conditions.push(self.render_range(column, arm.range, params));
            }
        }
        if let Some(assignment) = update.parent {
            params.push(Value::Integer(assignment.node_id));
            conditions.push(format!("{} = ?", self.id));
        }
        if conditions.is_empty() {
            return "1 = 0".to_string();
        }
        conditions.join(" OR ")
    }

    pub fn select(&self, predicate: &Predicate) -> Statement {
        let mut params = Vec::new();
        let condition = self.render_predicate(predicate, &mut params);
        Statement {
            sql: format!(
                "SELECT {} FROM {} WHERE {} ORDER BY {} ASC",
                self.select_list(),
                self.table,
                condition,
                self.left
            ),
            params,
        }
    }

    pub fn select_first(&self, predicate: &Predicate) -> Statement {
        let mut statement = self.select(predicate);
        statement.sql.push_str(" LIMIT 1");
        statement
    }

    pub fn count(&self, predicate: &Predicate) -> Statement {
        let mut params = Vec::new();
        let condition = self.render_predicate(predicate, &mut params);
        Statement {
            sql: format!("SELECT COUNT(*) FROM {} WHERE {}", self.table, condition),
            params,
        }
    }

    pub fn max(&self, column: Column) -> Statement {
        Statement {
            sql: format!("SELECT MAX({}) FROM {}", self.column(column), self.table),
            params: Vec::new(),
        }
    }

    pub fn insert(&self, node: &Node, bounds: Bounds) -> Statement {
        let mut columns = vec![
            self.parent_id.as_str(),
            self.left.as_str(),
            self.right.as_str(),
        ];
        let mut params = vec![
            nullable(node.parent_id),
            Value::Integer(bounds.left),
            Value::Integer(bounds.right),
        ];
        if let Some(type_column) = &self.type_column {
            columns.push(type_column);
            params.push(node.type_tag.clone().map_or(Value::Null, Value::Text));
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        Statement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                columns.join(", "),
                placeholders
            ),
            params,
        }
    }

    pub fn bulk_update(&self, update: &BulkUpdate) -> Statement {
        let mut params = Vec::new();
        let mut assignments = vec![
            format!(
                "{} = {}",
                self.left,
                self.render_shift(&self.left, &update.left, &mut params)
            ),
            format!(
                "{} = {}",
                self.right,
                self.render_shift(&self.right, &update.right, &mut params)
            ),
        ];
        if let Some(assignment) = update.parent {
            params.push(Value::Integer(assignment.node_id));
            params.push(nullable(assignment.parent_id));
            assignments.push(format!(
                "{parent} = CASE WHEN {id} = ? THEN ? ELSE {parent} END",
                parent = self.parent_id,
                id = self.id
            ));
        }

        let touched = self.render_touched(update, &mut params);
        Statement {
            sql: format!(
                "UPDATE {} SET {} WHERE {}",
                self.table,
                assignments.join(", "),
                touched
            ),
            params,
        }
    }

    pub fn delete(&self, predicate: &Predicate) -> Statement {
        let mut params = Vec::new();
        let condition = self.render_predicate(predicate, &mut params);
        Statement {
            sql: format!("DELETE FROM {} WHERE {}", self.table, condition),
            params,
        }
    }

    /// Convert a row produced by `select` into a node
    pub fn row_to_node(&self, row: &Row) -> Result<Node, StoreError> {
        let decode =
            |name: &str, e: libsql::Error| StoreError::row_decode(format!("{}: {}", name, e));

        let id: i64 = row.get(0).map_err(|e| decode("id", e))?;
        let parent_id: Option<i64> = row.get(1).map_err(|e| decode("parent_id", e))?;
        let left: i64 = row.get(2).map_err(|e| decode("left", e))?;
        let right: i64 = row.get(3).map_err(|e| decode("right", e))?;
        let type_tag: Option<String> = if self.type_column.is_some() {
            row.get(4).map_err(|e| decode("type", e))?
        } else {
            None
        };

        Ok(Node::from_row(
            id,
            parent_id,
            Bounds::new(left, right),
            type_tag,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeScope;
    use crate::tree::{plan_move, MovePosition};

    fn sql() -> TableSql {
        TableSql::new(&TreeConfig::default())
    }

    fn scope(id: i64, parent_id: Option<i64>, left: i64, right: i64) -> NodeScope {
        NodeScope {
            id,
            parent_id,
            bounds: Bounds::new(left, right),
        }
    }

    #[test]
    fn test_select_ancestors() {
        let statement = sql().select(&scope(4, Some(3), 5, 6).ancestors());
        assert_eq!(
            statement.sql,
            "SELECT \"id\", \"parent_id\", \"left\", \"right\" FROM \"nodes\" \
             WHERE (\"left\" < ? AND \"right\" > ?) ORDER BY \"left\" ASC"
        );
        assert_eq!(statement.params, vec![Value::Integer(5), Value::Integer(6)]);
    }

    #[test]
    fn test_root_siblings_render_is_null() {
        let statement = sql().select(&scope(1, None, 1, 2).siblings());
        assert!(statement
            .sql
            .contains("WHERE (\"parent_id\" IS NULL AND \"id\" <> ?)"));
        assert_eq!(statement.params, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_self_and_siblings_renders_or() {
        let statement = sql().count(&scope(2, Some(1), 2, 3).self_and_siblings());
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) FROM \"nodes\" WHERE (\"id\" = ? OR \"parent_id\" = ?)"
        );
    }

    #[test]
    fn test_bulk_update_is_parameterized() {
        let plan = plan_move(
            &scope(1, None, 1, 2),
            &scope(2, None, 3, 4),
            MovePosition::Child,
        )
        .unwrap();
        let statement = sql().bulk_update(&plan.bulk_update());

        assert_eq!(
            statement.sql,
            "UPDATE \"nodes\" SET \
             \"left\" = CASE WHEN \"left\" BETWEEN ? AND ? THEN \"left\" + ? \
             WHEN \"left\" BETWEEN ? AND ? AND \"left\" NOT BETWEEN ? AND ? THEN \"left\" + ? \
             ELSE \"left\" END, \
             \"right\" = CASE WHEN \"right\" BETWEEN ? AND ? THEN \"right\" + ? \
             WHEN \"right\" BETWEEN ? AND ? AND \"right\" NOT BETWEEN ? AND ? THEN \"right\" + ? \
             ELSE \"right\" END, \
             \"parent_id\" = CASE WHEN \"id\" = ? THEN ? ELSE \"parent_id\" END \
             WHERE \"left\" BETWEEN ? AND ? OR \"left\" BETWEEN ? AND ? \
             OR \"right\" BETWEEN ? AND ? OR \"right\" BETWEEN ? AND ? OR \"id\" = ?"
        );
        assert!(!statement.sql.chars().any(|c| c.is_ascii_digit()));

        let head: Vec<Value> = statement.params[..7].to_vec();
        assert_eq!(
            head,
            vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(1),
                Value::Integer(1),
                Value::Integer(3),
                Value::Integer(1),
                Value::Integer(2),
            ]
        );
        assert_eq!(statement.params[7], Value::Integer(-2));
        // parent assignment: moved node id, then its new parent
        assert_eq!(statement.params[16], Value::Integer(1));
        assert_eq!(statement.params[17], Value::Integer(2));
        assert_eq!(statement.params.len(), 27);
    }

    #[test]
    fn test_close_gap_update_has_no_parent_clause() {
        let statement = sql().bulk_update(&BulkUpdate::close_gap(Bounds::new(1, 6)));
        assert_eq!(
            statement.sql,
            "UPDATE \"nodes\" SET \
             \"left\" = CASE WHEN \"left\" > ? THEN \"left\" + ? ELSE \"left\" END, \
             \"right\" = CASE WHEN \"right\" > ? THEN \"right\" + ? ELSE \"right\" END \
             WHERE \"left\" > ? OR \"right\" > ?"
        );
        assert_eq!(
            statement.params,
            vec![
                Value::Integer(6),
                Value::Integer(-6),
                Value::Integer(6),
                Value::Integer(-6),
                Value::Integer(6),
                Value::Integer(6),
            ]
        );
    }

    #[test]
    fn test_custom_columns_and_type_column() {
        let config = TreeConfig {
            table: "menu".to_string(),
            left_column: "lft".to_string(),
            right_column: "rgt".to_string(),
            ..TreeConfig::default()
        }
        .with_type_column("kind");
        let sql = TableSql::new(&config);

        let node = Node::with_type("Section");
        let statement = sql.insert(&node, Bounds::new(1, 2));
        assert_eq!(
            statement.sql,
            "INSERT INTO \"menu\" (\"parent_id\", \"lft\", \"rgt\", \"kind\") VALUES (?, ?, ?, ?)"
        );
        assert_eq!(
            statement.params,
            vec![
                Value::Null,
                Value::Integer(1),
                Value::Integer(2),
                Value::Text("Section".to_string()),
            ]
        );

        assert!(sql.create_table().contains("\"kind\" TEXT"));
        assert_eq!(
            sql.create_indexes()[0],
            "CREATE INDEX IF NOT EXISTS \"idx_menu_left\" ON \"menu\"(\"lft\")"
        );
        assert_eq!(sql.max(Column::Right).sql, "SELECT MAX(\"rgt\") FROM \"menu\"");
    }

    #[test]
    fn test_select_first_and_delete() {
        let sql = sql();
        assert!(sql
            .select_first(&Predicate::roots())
            .sql
            .ends_with("WHERE \"parent_id\" IS NULL ORDER BY \"left\" ASC LIMIT 1"));
        let statement = sql.delete(&scope(1, None, 1, 6).self_and_descendants());
        assert_eq!(
            statement.sql,
            "DELETE FROM \"nodes\" WHERE (\"left\" >= ? AND \"right\" <= ?)"
        );
    }
}
