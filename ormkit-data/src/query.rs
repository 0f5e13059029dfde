use crate::descriptor::BackendKind;
use crate::error::DataError;
use crate::value::Value;

/// A fluent builder for the statements issued by the generic repository.
///
/// Every identifier is validated and quoted in the dialect's style; values
/// are always bound as parameters.
///
/// # Example
///
/// ```ignore
/// let (sql, params) = QueryBuilder::new("users", Dialect::Postgres)
///     .where_eq("email", "a@b.com")
///     .order_by("id", true)
///     .limit(10)
///     .build_select(&["*"])?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `?` placeholders, double-quoted identifiers.
    Sqlite,
    /// `?` placeholders, backtick-quoted identifiers.
    MySql,
    /// `$1, $2, ...` placeholders, double-quoted identifiers.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }

    /// Wrap an integer aggregate or column so it decodes as a 64-bit integer.
    fn bigint(self, expr: &str) -> String {
        match self {
            Dialect::Postgres => format!("CAST({expr} AS BIGINT)"),
            Dialect::Sqlite | Dialect::MySql => expr.to_string(),
        }
    }
}

impl From<BackendKind> for Dialect {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Sqlite => Dialect::Sqlite,
            BackendKind::MySql => Dialect::MySql,
            BackendKind::Postgres => Dialect::Postgres,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    dialect: Dialect,
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(String, Value),
    Lt(String, Value),
    LtEq(String, Value),
    Gt(String, Value),
    GtEq(String, Value),
}

impl QueryBuilder {
    pub fn new(table: &str, dialect: Dialect) -> Self {
        Self {
            table: table.to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            dialect,
        }
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn where_lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Lt(column.to_string(), value.into()));
        self
    }

    pub fn where_lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::LtEq(column.to_string(), value.into()));
        self
    }

    pub fn where_gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Gt(column.to_string(), value.into()));
        self
    }

    pub fn where_gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::GtEq(column.to_string(), value.into()));
        self
    }

    /// Add one equality condition per `(column, value)` pair.
    pub fn filter<I>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        pairs
            .into_iter()
            .fold(self, |query, (column, value)| query.where_eq(column, value))
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    /// Add ordering from an expression such as `"created_at desc, id"`.
    pub fn order_expr(mut self, expr: &str) -> Result<Self, QueryError> {
        for clause in expr.split(',') {
            let mut parts = clause.split_whitespace();
            let Some(column) = parts.next() else {
                return Err(QueryError::InvalidOrder(expr.to_string()));
            };
            let ascending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => true,
                Some("desc") => false,
                Some(_) => return Err(QueryError::InvalidOrder(expr.to_string())),
            };
            if parts.next().is_some() {
                return Err(QueryError::InvalidOrder(expr.to_string()));
            }
            self.order.push((column.to_string(), ascending));
        }
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Build a SELECT query returning `(sql, bind_values)`.
    pub fn build_select(&self, columns: &[&str]) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.identifier(&self.table, false, "table")?;
        let columns = self.column_list(columns, true)?;

        let mut sql = format!("SELECT {columns} FROM {table}");
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        self.append_order(&mut sql)?;
        self.append_limit_offset(&mut sql);
        Ok((sql, params))
    }

    /// Build a COUNT query returning `(sql, bind_values)`.
    pub fn build_count(&self) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.identifier(&self.table, false, "table")?;
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Build a `SELECT MAX(column)` query, the column decoded as a 64-bit integer.
    pub fn build_max(&self, column: &str) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.identifier(&self.table, false, "table")?;
        let column = self.identifier(column, false, "column")?;
        let max = self.dialect.bigint(&format!("MAX({column})"));
        let mut sql = format!("SELECT {max} FROM {table}");
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    pub fn build_delete(&self) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.identifier(&self.table, false, "table")?;
        let mut sql = format!("DELETE FROM {table}");
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Build a multi-row INSERT. With `returning`, the statement ends in a
    /// `RETURNING` clause yielding that column as a 64-bit integer.
    pub fn build_insert(
        &self,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
        returning: Option<&str>,
    ) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.identifier(&self.table, false, "table")?;
        let column_list = self.column_list(columns, false)?;
        if rows.is_empty() {
            return Err(QueryError::EmptyInsert);
        }

        let mut params = Vec::with_capacity(rows.len() * columns.len());
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != columns.len() {
                return Err(QueryError::ColumnCount {
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            let placeholders: Vec<_> = row
                .into_iter()
                .map(|value| {
                    params.push(value);
                    self.dialect.placeholder(params.len())
                })
                .collect();
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let mut sql = format!(
            "INSERT INTO {table} ({column_list}) VALUES {}",
            tuples.join(", ")
        );
        if let Some(column) = returning {
            let column = self.identifier(column, false, "column")?;
            sql.push_str(&format!(" RETURNING {}", self.dialect.bigint(&column)));
        }
        Ok((sql, params))
    }

    /// Build an UPDATE setting `columns` to `values`, filtered by the conditions.
    pub fn build_update(
        &self,
        columns: &[&str],
        values: Vec<Value>,
    ) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.identifier(&self.table, false, "table")?;
        if columns.len() != values.len() {
            return Err(QueryError::ColumnCount {
                expected: columns.len(),
                found: values.len(),
            });
        }

        let mut params = Vec::with_capacity(values.len() + self.conditions.len());
        let mut assignments = Vec::with_capacity(columns.len());
        for (column, value) in columns.iter().zip(values) {
            let column = self.identifier(column, false, "column")?;
            params.push(value);
            assignments.push(format!("{column} = {}", self.dialect.placeholder(params.len())));
        }

        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    fn append_where(&self, sql: &mut String, params: &mut Vec<Value>) -> Result<(), QueryError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        sql.push_str(" WHERE ");
        let mut first = true;
        for cond in &self.conditions {
            if !first {
                sql.push_str(" AND ");
            }
            first = false;
            let (col, op, val) = match cond {
                Condition::Eq(col, val) => (col, "=", val),
                Condition::Lt(col, val) => (col, "<", val),
                Condition::LtEq(col, val) => (col, "<=", val),
                Condition::Gt(col, val) => (col, ">", val),
                Condition::GtEq(col, val) => (col, ">=", val),
            };
            let col = self.identifier(col, false, "column")?;
            // `= NULL` never matches.
            if op == "=" && val.is_null() {
                sql.push_str(&format!("{col} IS NULL"));
                continue;
            }
            params.push(val.clone());
            let placeholder = self.dialect.placeholder(params.len());
            sql.push_str(&format!("{col} {op} {placeholder}"));
        }
        Ok(())
    }

    fn append_order(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        sql.push_str(" ORDER BY ");
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, asc) in &self.order {
            let col = self.identifier(col, false, "column")?;
            if *asc {
                clauses.push(format!("{col} ASC"));
            } else {
                clauses.push(format!("{col} DESC"));
            }
        }
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, sql: &mut String) {
        match (self.limit_val, self.offset_val) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // MySQL has no OFFSET without LIMIT; the largest BIGINT stands in for "all".
            (None, Some(offset)) if offset > 0 => {
                sql.push_str(&format!(" LIMIT {} OFFSET {offset}", i64::MAX))
            }
            (None, _) => {}
        }
    }

    fn column_list(&self, columns: &[&str], allow_star: bool) -> Result<String, QueryError> {
        let mut out = Vec::with_capacity(columns.len());
        for col in columns {
            out.push(self.identifier(col, allow_star, "column")?);
        }
        Ok(out.join(", "))
    }

    fn identifier(
        &self,
        ident: &str,
        allow_star: bool,
        kind: &'static str,
    ) -> Result<String, QueryError> {
        if !is_valid_identifier(ident, allow_star) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        Ok(quote_identifier(ident, self.dialect, allow_star))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
    InvalidOrder(String),
    ColumnCount { expected: usize, found: usize },
    EmptyInsert,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            QueryError::InvalidOrder(expr) => write!(f, "Invalid order expression: {expr}"),
            QueryError::ColumnCount { expected, found } => {
                write!(f, "Expected {expected} values, found {found}")
            }
            QueryError::EmptyInsert => write!(f, "INSERT without rows"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        DataError::unclassified(err)
    }
}

fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
    }
    true
}

fn quote_identifier(ident: &str, dialect: Dialect, allow_star: bool) -> String {
    let quote = dialect.quote_char();
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
