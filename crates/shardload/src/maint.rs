//! Maintenance utilities (§7 of the design notes): minimal, non-executing
//! helpers that build the SQL text for the two out-of-scope companion
//! tools — a bulk DELETE/VACUUM runner and a query fan-out rewriter.
//! Neither function talks to a database; both only produce strings for a
//! caller to hand to its own sink.

use crate::err::ShardLoadError;

/// Builds the `DELETE FROM <schema>_<slice>.<table>` statement for each
/// slice schema `0..slices`, one per shard-local copy of `table`.
pub fn delete_plan(schema: &str, table: &str, slices: usize) -> Vec<String> {
    (0..slices)
        .map(|i| format!("delete from {schema}_{i}.{table}"))
        .collect()
}

/// The `VACUUM FULL` statement issued against every database in the
/// topology after a [`delete_plan`] run.
pub fn vacuum_statement() -> &'static str {
    "vacuum full"
}

/// Rewrites a single `... FROM <table> ...` query to target
/// `<schema>.<table>` instead, by locating the (case-insensitive) `from`
/// token and splicing the schema-qualified name in its place. This is a
/// token substitution, not a SQL parser: it does not validate or
/// interpret the rest of the statement.
pub fn fanout_query(query: &str, schema: &str) -> Result<String, ShardLoadError> {
    let trimmed = query.trim_end();
    let (body, trailing_semicolon) = match trimmed.strip_suffix(';') {
        Some(b) => (b, true),
        None => (trimmed, false),
    };

    let tokens: Vec<&str> = body.split_whitespace().collect();
    let from_pos = tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case("from"))
        .ok_or_else(|| ShardLoadError::Other("query has no FROM clause to rewrite".to_string()))?;

    let table = tokens
        .get(from_pos + 1)
        .ok_or_else(|| ShardLoadError::Other("FROM clause has no table name".to_string()))?;

    let mut rewritten: Vec<String> = tokens[..=from_pos].iter().map(|s| s.to_string()).collect();
    rewritten.push(format!("{schema}.{table}"));
    rewritten.extend(tokens[from_pos + 2..].iter().map(|s| s.to_string()));

    let mut out = rewritten.join(" ");
    if trailing_semicolon {
        out.push(';');
    }
    Ok(out)
}

/// Fans `query` out across slice schemas `0..slices`, producing one
/// rewritten statement per slice.
pub fn fanout_plan(query: &str, schema: &str, slices: usize) -> Result<Vec<String>, ShardLoadError> {
    (0..slices)
        .map(|i| fanout_query(query, &format!("{schema}_{i}")))
        .collect()
}
