//! Identifier helpers shared by the AST and the model registry.

use crate::{DataBridgeError, Result};
use unicode_normalization::UnicodeNormalization;

/// Quotes a SQL identifier.
///
/// Handles qualified names by quoting each part separately.
pub fn quote_identifier(name: &str) -> String {
    if name.contains('.') {
        name.split('.')
            .map(|part| format!("\"{}\"", part))
            .collect::<Vec<_>>()
            .join(".")
    } else {
        format!("\"{}\"", name)
    }
}

/// Validates a table, alias or column identifier (no dots allowed).
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DataBridgeError::Validation("Identifier cannot be empty".to_string()));
    }

    // Normalize to NFKC to prevent Unicode confusables
    let name = name.nfkc().collect::<String>();

    if name.len() > 63 {
        return Err(DataBridgeError::Validation(
            format!("Identifier '{}' exceeds maximum length of 63", name)
        ));
    }

    let first_char = name.chars().next()
        .ok_or_else(|| DataBridgeError::Validation(
            format!("Identifier '{}' is empty or invalid", name)
        ))?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(DataBridgeError::Validation(
            format!("Identifier '{}' must start with a letter or underscore", name)
        ));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(DataBridgeError::Validation(
                format!("Identifier '{}' contains invalid character '{}'", name, ch)
            ));
        }
    }

    const SQL_KEYWORDS: &[&str] = &[
        "select", "insert", "update", "delete", "drop", "create", "alter",
        "table", "from", "where", "join", "inner", "outer", "left", "right",
        "on", "using", "and", "or", "not", "in", "is", "null", "true", "false",
        "as", "order", "by", "group", "having", "limit", "offset", "distinct",
    ];

    if SQL_KEYWORDS.contains(&name.to_lowercase().as_str()) {
        return Err(DataBridgeError::Validation(
            format!("Identifier '{}' is a reserved SQL keyword", name)
        ));
    }

    Ok(())
}
