//! Read-only statement validation.
//!
//! Every statement handed to the query gateway or the plan normalizer must be
//! a single `SELECT` or `WITH` statement. Tokenizing with
//! [sqlparser](https://docs.rs/sqlparser/) lets leading comments and odd
//! whitespace through without letting a second statement ride along after a
//! semicolon. The read-only session setting stays in force underneath, so a
//! data-modifying CTE that slips past here still fails at the backend.

use crate::error::{DbError, DbResult};
use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Keywords a read-only statement may start with.
const READ_KEYWORDS: [&str; 2] = ["SELECT", "WITH"];

mod error_messages {
    pub const EMPTY: &str = "Empty statement. Provide a SELECT or WITH query.";
    pub const MULTIPLE: &str =
        "Multiple statements are not allowed. Submit one SELECT or WITH query at a time.";
}

fn not_read_only(keyword: &str) -> DbError {
    DbError::validation(format!(
        "Only SELECT or WITH queries are allowed, got '{}'",
        keyword
    ))
}

/// Reject anything but a single `SELECT`/`WITH` statement.
///
/// Returns the statement unchanged so callers can chain it.
///
/// ```
/// use db_lens::tools::sql_validator::validate_read_only;
///
/// assert!(validate_read_only("  select * from users").is_ok());
/// assert!(validate_read_only("DELETE FROM users").is_err());
/// ```
pub fn validate_read_only(sql: &str) -> DbResult<&str> {
    let dialect = GenericDialect {};
    let tokens = match Tokenizer::new(&dialect, sql).tokenize() {
        Ok(tokens) => tokens,
        // The backend reports the syntax error; only the leading keyword matters here.
        Err(_) => return validate_prefix(sql).map(|_| sql),
    };

    let mut significant = tokens
        .iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF));

    // `(SELECT 1)` is a parenthesized query; look through the parens.
    let first = significant
        .find(|t| !matches!(t, Token::LParen))
        .ok_or_else(|| DbError::validation(error_messages::EMPTY))?;

    match first {
        Token::Word(word) if matches!(word.keyword, Keyword::SELECT | Keyword::WITH) => {}
        Token::Word(word) => return Err(not_read_only(&word.value.to_uppercase())),
        Token::SemiColon => return Err(DbError::validation(error_messages::EMPTY)),
        other => return Err(not_read_only(&other.to_string())),
    }

    // A semicolon may end the statement but nothing may follow it.
    let mut after_semicolon = significant.skip_while(|t| !matches!(t, Token::SemiColon));
    if after_semicolon.any(|t| !matches!(t, Token::SemiColon)) {
        return Err(DbError::validation(error_messages::MULTIPLE));
    }

    Ok(sql)
}

/// Keyword check for text the tokenizer rejects (e.g. an unterminated string).
fn validate_prefix(sql: &str) -> DbResult<()> {
    let first = sql
        .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .find(|word| !word.is_empty())
        .ok_or_else(|| DbError::validation(error_messages::EMPTY))?
        .to_uppercase();

    if READ_KEYWORDS.contains(&first.as_str()) {
        Ok(())
    } else {
        Err(not_read_only(&first))
    }
}
