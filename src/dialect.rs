//! Placeholder conventions of the supported SQL engines.

use serde::{Deserialize, Serialize};

/// Supported placeholder families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `?` for every parameter (MySQL, MariaDB, SQLite).
    #[default]
    Positional,
    /// `$1`, `$2`, ... (PostgreSQL).
    Numbered,
}

impl Dialect {
    /// Render the placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Positional => "?".to_string(),
            Dialect::Numbered => format!("${}", index),
        }
    }

    /// Pick the placeholder family from a connection URL scheme.
    ///
    /// Returns `None` for schemes the mapper does not know about.
    pub fn for_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(Dialect::Numbered),
            "mysql" | "mariadb" | "sqlite" => Some(Dialect::Positional),
            _ => None,
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positional" | "mysql" | "sqlite" => Ok(Dialect::Positional),
            "numbered" | "postgres" | "postgresql" => Ok(Dialect::Numbered),
            other => Err(format!("unknown dialect '{}'", other)),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Positional => write!(f, "positional (?)"),
            Dialect::Numbered => write!(f, "numbered ($n)"),
        }
    }
}

/// Placeholder counter for one statement.
///
/// Numbering starts at 1 for every statement and runs on across its clauses.
#[derive(Debug)]
pub struct Placeholders {
    dialect: Dialect,
    index: usize,
}

impl Placeholders {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect, index: 0 }
    }

    /// Return the placeholder for the next parameter.
    pub fn next(&mut self) -> String {
        self.index += 1;
        self.dialect.placeholder(self.index)
    }

    /// Return `n` comma separated placeholders.
    pub fn list(&mut self, n: usize) -> String {
        (0..n).map(|_| self.next()).collect::<Vec<_>>().join(", ")
    }

    /// Number of placeholders handed out so far.
    pub fn count(&self) -> usize {
        self.index
    }
}
