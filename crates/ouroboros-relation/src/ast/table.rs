//! Table aliases.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::helpers::quote_identifier;
use super::node::Node;

/// A source of rows within one query: a table, addressed by an alias.
///
/// Identity is the alias name. Two aliases with the same name refer to the
/// same source even when they were produced by different associations, which
/// is what join deduplication relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableAlias {
    name: String,
    table: String,
}

impl TableAlias {
    /// Create an alias `name` for `table`.
    pub fn new(table: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
        }
    }

    /// Alias a table under its own name.
    pub fn table(table: &str) -> Self {
        Self::new(table, table)
    }

    /// Alias name used to refer to this source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Re-alias the same table under a different name.
    pub fn alias(&self, name: &str) -> Self {
        Self::new(&self.table, name)
    }

    /// True when the alias name differs from the table name.
    pub fn is_aliased(&self) -> bool {
        self.name != self.table
    }

    /// Column `column` of this source.
    pub fn attribute(&self, column: &str) -> Node {
        Node::attribute(&self.name, column)
    }
}

impl PartialEq for TableAlias {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TableAlias {}

impl Hash for TableAlias {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for TableAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_aliased() {
            write!(f, "{} {}", quote_identifier(&self.table), quote_identifier(&self.name))
        } else {
            write!(f, "{}", quote_identifier(&self.table))
        }
    }
}
