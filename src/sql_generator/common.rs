//! Common utilities for PostgreSQL SQL generation

/// Quote a PostgreSQL identifier.
///
/// Identifiers are always double-quoted so that mixed-case names such as
/// `SomeArray` keep their case; embedded quotes are doubled.
///
/// # Examples
/// ```
/// use pgarray::sql_generator::common::quote_identifier;
/// assert_eq!(quote_identifier("SomeArray"), "\"SomeArray\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Format a qualified column reference: `"alias"."column"`
///
/// # Examples
/// ```
/// use pgarray::sql_generator::common::qualified_column;
/// assert_eq!(qualified_column("e", "SomeArray"), "\"e\".\"SomeArray\"");
/// ```
pub fn qualified_column(table_alias: &str, column_name: &str) -> String {
    format!(
        "{}.{}",
        quote_identifier(table_alias),
        quote_identifier(column_name)
    )
}

/// Render a text literal with standard-conforming escaping.
pub fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render a `bytea` literal in hex format, e.g. `'\x0304'::bytea`.
pub fn bytea_literal(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("'\\x{}'::bytea", hex)
}

/// Identifiers may not contain NUL; PostgreSQL rejects them.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && !name.contains('\0')
}
