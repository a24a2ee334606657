//! SQLite strategy: `sqlite_master` and the pragma table-valued functions,
//! `EXPLAIN QUERY PLAN` detail lines.

use super::Dialect;
use crate::db::pool::Session;
use crate::db::row;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnInfo, DatabaseType, ExplainResult, ForeignKey, IndexInfo, JsonRow, QueryParam,
    TableDescription, TableSummary,
};
use regex::Regex;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Word};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
        ORDER BY name
    "#;

    pub const COLUMNS: &str = r#"
        SELECT name, type, "notnull", dflt_value, pk
        FROM pragma_table_info(?)
        ORDER BY cid
    "#;

    pub const FOREIGN_KEYS: &str = r#"
        SELECT seq, "from", "table", "to"
        FROM pragma_foreign_key_list(?)
        ORDER BY id, seq
    "#;

    pub const INDEXES: &str = r#"
        SELECT name, "unique", origin, partial
        FROM pragma_index_list(?)
        ORDER BY name
    "#;

    pub const INDEX_COLUMNS: &str = r#"
        SELECT name FROM pragma_index_info(?) ORDER BY seqno
    "#;

    pub const INDEX_SQL: &str = r#"
        SELECT sql FROM sqlite_master WHERE type = 'index' AND name = ?
    "#;
}

static SCAN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SCAN (?:TABLE )?(\S+)(?:.*?\bUSING (?:COVERING )?INDEX (\S+))?")
        .expect("SCAN pattern is valid")
});

static SEARCH_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SEARCH (?:TABLE )?(\S+) USING (?:COVERING )?INDEX (\S+)")
        .expect("SEARCH pattern is valid")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn read_only_statement(&self) -> &'static str {
        "PRAGMA query_only = ON"
    }

    fn read_only_probe(&self) -> &'static str {
        "PRAGMA query_only"
    }

    fn version_query(&self) -> &'static str {
        "SELECT sqlite_version() AS version"
    }

    /// SQLite keeps no row statistics, so every count is an exact `COUNT(*)`.
    async fn list_tables(&self, session: &Session) -> DbResult<Vec<TableSummary>> {
        let rows = session.execute(queries::LIST_TABLES, &[]).await?;

        let mut tables = Vec::with_capacity(rows.len());
        for name in rows.iter().filter_map(|r| row::text(r, "name")) {
            let count_sql = format!("SELECT COUNT(*) AS row_count FROM {}", quote_identifier(&name));
            let counted = session.execute(&count_sql, &[]).await?;
            let count = counted
                .first()
                .map(|r| row::row_estimate(r, "row_count"))
                .unwrap_or(0);
            tables.push(TableSummary::new(name, count));
        }

        debug!(count = tables.len(), "Listed SQLite tables");
        Ok(tables)
    }

    async fn describe_table(&self, session: &Session, table: &str) -> DbResult<TableDescription> {
        let params = [QueryParam::from(table)];

        let columns = map_columns(&session.execute(queries::COLUMNS, &params).await?);
        if columns.is_empty() {
            return Err(DbError::table_not_found(table));
        }

        let mut description = TableDescription::new(table);
        description.columns = columns;
        description.foreign_keys = self.foreign_keys(session, table).await?;

        for index_row in session.execute(queries::INDEXES, &params).await? {
            let Some(name) = row::text(&index_row, "name") else {
                continue;
            };
            let index_param = [QueryParam::from(name.as_str())];

            let columns = session
                .execute(queries::INDEX_COLUMNS, &index_param)
                .await?
                .iter()
                .filter_map(|r| row::text(r, "name"))
                .collect();

            let predicate = if row::flag(&index_row, "partial") {
                let sql_rows = session.execute(queries::INDEX_SQL, &index_param).await?;
                sql_rows
                    .first()
                    .and_then(|r| row::text(r, "sql"))
                    .and_then(|sql| partial_predicate(&sql))
            } else {
                None
            };

            let is_primary = row::text(&index_row, "origin").is_some_and(|o| o == "pk");
            description.indexes.push(
                IndexInfo::new(name, columns)
                    .with_unique(row::flag(&index_row, "unique"))
                    .with_primary(is_primary)
                    .with_partial_predicate(predicate),
            );
        }

        debug!(
            table,
            columns = description.columns.len(),
            indexes = description.indexes.len(),
            "Described SQLite table"
        );
        Ok(description)
    }

    fn explain_statement(&self, sql: &str) -> String {
        format!("EXPLAIN QUERY PLAN {}", sql)
    }

    /// SCAN lines name a relation by its alias when it has one, so aliases
    /// are mapped back to tables from the statement's own text.
    fn normalize_plan(
        &self,
        sql: &str,
        rows: &[JsonRow],
        result: &mut ExplainResult,
    ) -> DbResult<()> {
        let relations = StatementRelations::from_sql(sql);
        for (line_no, r) in rows.iter().enumerate() {
            let detail = row::text(r, "detail").ok_or_else(|| {
                DbError::plan_parse(format!("plan line {} has no detail column", line_no + 1))
            })?;
            apply_detail_line(detail.trim(), &relations, result);
        }
        Ok(())
    }
}

impl Sqlite {
    /// A NULL `to` column references the parent's primary key.
    async fn foreign_keys(&self, session: &Session, table: &str) -> DbResult<Vec<ForeignKey>> {
        let rows = session
            .execute(queries::FOREIGN_KEYS, &[QueryParam::from(table)])
            .await?;

        let mut foreign_keys = Vec::with_capacity(rows.len());
        for r in &rows {
            let (Some(column), Some(parent)) = (row::text(r, "from"), row::text(r, "table"))
            else {
                continue;
            };

            let referenced_column = match row::text(r, "to") {
                Some(to) => to,
                None => {
                    let position = row::int(r, "seq").unwrap_or(0).max(0) as usize;
                    let parent_columns = map_columns(
                        &session
                            .execute(queries::COLUMNS, &[QueryParam::from(parent.as_str())])
                            .await?,
                    );
                    parent_columns
                        .into_iter()
                        .filter(|c| c.is_primary_key)
                        .nth(position)
                        .map(|c| c.name)
                        .unwrap_or_else(|| "rowid".to_string())
                }
            };
            foreign_keys.push(ForeignKey::new(column, parent, referenced_column));
        }
        Ok(foreign_keys)
    }
}

/// Relation names a statement introduces on top of its base tables.
#[derive(Debug, Default)]
struct StatementRelations {
    /// Lowercased alias to the table it stands for.
    aliases: HashMap<String, String>,
    /// Lowercased CTE and derived-table names.
    derived: HashSet<String>,
}

impl StatementRelations {
    /// Collect `FROM`/`JOIN` aliases, CTE names and aliased subqueries.
    ///
    /// Text the tokenizer rejects yields no names; plan lines are then taken
    /// at face value.
    fn from_sql(sql: &str) -> Self {
        let mut relations = Self::default();
        let Ok(tokens) = Tokenizer::new(&SQLiteDialect {}, sql).tokenize() else {
            return relations;
        };
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
            .collect();

        // Per nesting level: inside a FROM list. Per open paren: opened where
        // a relation is expected.
        let mut in_from = vec![false];
        let mut relation_parens = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let in_from_list = in_from.last() == Some(&true);
            let at_relation = i
                .checked_sub(1)
                .is_some_and(|prev| expects_relation(&tokens[prev], in_from_list));

            match token {
                Token::LParen => {
                    relation_parens.push(at_relation);
                    in_from.push(false);
                }
                Token::RParen => {
                    if in_from.len() > 1 {
                        in_from.pop();
                    }
                    if relation_parens.pop() == Some(true) {
                        if let Some(alias) = alias_at(&tokens, i + 1) {
                            relations.derived.insert(alias);
                        }
                    }
                }
                Token::Word(_) if at_relation => {
                    let (table, next) = qualified_name(&tokens, i);
                    if let Some(alias) = alias_at(&tokens, next) {
                        relations.aliases.insert(alias, table);
                    }
                }
                Token::Word(w) if w.keyword == Keyword::AS && opens_cte_body(&tokens, i + 1) => {
                    if let Some(name) = cte_name(&tokens, i) {
                        relations.derived.insert(name);
                    }
                }
                Token::Word(w) => {
                    if let Some(level) = in_from.last_mut() {
                        match w.keyword {
                            Keyword::FROM => *level = true,
                            Keyword::SELECT
                            | Keyword::WHERE
                            | Keyword::GROUP
                            | Keyword::HAVING
                            | Keyword::WINDOW
                            | Keyword::ORDER
                            | Keyword::LIMIT
                            | Keyword::UNION
                            | Keyword::EXCEPT
                            | Keyword::INTERSECT
                            | Keyword::VALUES => *level = false,
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        relations
    }

    fn is_derived(&self, name: &str) -> bool {
        self.derived.contains(&name.to_lowercase())
    }

    /// The table behind `name`, or `name` itself when it is not an alias.
    fn table_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases
            .get(&name.to_lowercase())
            .map(String::as_str)
            .unwrap_or(name)
    }
}

/// Whether a relation reference follows `prev`.
fn expects_relation(prev: &Token, in_from: bool) -> bool {
    match prev {
        Token::Word(w) if w.quote_style.is_none() => {
            matches!(w.keyword, Keyword::FROM | Keyword::JOIN)
        }
        Token::Comma => in_from,
        _ => false,
    }
}

/// `schema.table` or `table` starting at `start`; returns the table name and
/// the index after it.
fn qualified_name(tokens: &[Token], start: usize) -> (String, usize) {
    let mut name = word_value(&tokens[start]).unwrap_or_default();
    let mut next = start + 1;
    while let (Some(Token::Period), Some(Token::Word(part))) =
        (tokens.get(next), tokens.get(next + 1))
    {
        name = part.value.clone();
        next += 2;
    }
    (name, next)
}

/// Alias at `idx`: `AS name`, or a bare name that is not a keyword.
fn alias_at(tokens: &[Token], idx: usize) -> Option<String> {
    match tokens.get(idx)? {
        Token::Word(w) if w.keyword == Keyword::AS && w.quote_style.is_none() => {
            tokens.get(idx + 1).and_then(word_value).map(|v| v.to_lowercase())
        }
        Token::Word(w) if w.keyword == Keyword::NoKeyword || w.quote_style.is_some() => {
            Some(w.value.to_lowercase())
        }
        _ => None,
    }
}

/// `AS (`, `AS MATERIALIZED (` or `AS NOT MATERIALIZED (`.
fn opens_cte_body(tokens: &[Token], idx: usize) -> bool {
    let mut idx = idx;
    for keyword in [Keyword::NOT, Keyword::MATERIALIZED] {
        if matches!(tokens.get(idx), Some(Token::Word(w)) if w.keyword == keyword) {
            idx += 1;
        }
    }
    matches!(tokens.get(idx), Some(Token::LParen))
}

/// Name before the `AS` at `as_idx`, skipping a column list.
fn cte_name(tokens: &[Token], as_idx: usize) -> Option<String> {
    let mut idx = as_idx.checked_sub(1)?;
    if matches!(tokens[idx], Token::RParen) {
        let mut depth = 0usize;
        loop {
            match tokens[idx] {
                Token::RParen => depth += 1,
                Token::LParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            idx = idx.checked_sub(1)?;
        }
        idx = idx.checked_sub(1)?;
    }
    word_value(&tokens[idx]).map(|v| v.to_lowercase())
}

fn word_value(token: &Token) -> Option<String> {
    match token {
        Token::Word(Word { value, .. }) => Some(value.clone()),
        _ => None,
    }
}

/// Apply one `EXPLAIN QUERY PLAN` detail line.
fn apply_detail_line(detail: &str, relations: &StatementRelations, result: &mut ExplainResult) {
    if let Some(caps) = SEARCH_LINE.captures(detail) {
        result.record_index(&caps[2]);
        return;
    }

    if detail.starts_with("SCAN CONSTANT ROW") {
        return;
    }

    if let Some(caps) = SCAN_LINE.captures(detail) {
        let name = &caps[1];
        // Subquery and co-routine scans are not table scans
        if name.starts_with('(') || name.eq_ignore_ascii_case("SUBQUERY") {
            return;
        }
        let table = relations.table_for(name);
        if relations.is_derived(table) {
            return;
        }
        match caps.get(2) {
            Some(index) => result.record_index(index.as_str()),
            None => result.record_sequential_scan(table, None),
        }
    }
}

/// `WHERE` clause of a partial index's `CREATE INDEX` statement.
///
/// The clause starts at the first unquoted `WHERE` outside parentheses after
/// the column list; quoted names and string literals never match.
fn partial_predicate(create_sql: &str) -> Option<String> {
    let tokens = Tokenizer::new(&SQLiteDialect {}, create_sql)
        .tokenize()
        .ok()?;

    let mut depth = 0usize;
    let mut seen_columns = false;
    let mut start = None;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth.saturating_sub(1);
                seen_columns |= depth == 0;
            }
            Token::Word(w)
                if seen_columns
                    && depth == 0
                    && w.keyword == Keyword::WHERE
                    && w.quote_style.is_none() =>
            {
                start = Some(i + 1);
                break;
            }
            _ => {}
        }
    }

    let predicate: String = tokens[start?..]
        .iter()
        .filter(|t| !matches!(t, Token::EOF))
        .map(Token::to_string)
        .collect();
    Some(
        predicate
            .trim()
            .trim_end_matches(';')
            .trim_end()
            .to_string(),
    )
}

/// Double-quote an identifier, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn map_columns(rows: &[JsonRow]) -> Vec<ColumnInfo> {
    rows.iter()
        .filter_map(|r| {
            let name = row::text(r, "name")?;
            let is_primary_key = row::int(r, "pk").unwrap_or(0) > 0;
            // INTEGER PRIMARY KEY reports notnull = 0 but can never hold NULL
            let nullable = !row::flag(r, "notnull") && !is_primary_key;
            Some(
                ColumnInfo::new(name, row::text(r, "type").unwrap_or_default(), nullable)
                    .with_default(row::text(r, "dflt_value"))
                    .with_primary_key(is_primary_key),
            )
        })
        .collect()
}
