//! SQL dialect boundary
//!
//! Templates are written once with backtick identifiers and `?` placeholders.
//! MySQL and SQLite accept that verbatim; PostgreSQL needs `"ident"` quoting,
//! numbered `$n` parameters and `LIMIT count OFFSET offset`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

static LIMIT_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bLIMIT\s+\$(\d+)\s*,\s*\$(\d+)\s*$").unwrap());

/// Target database driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Mysql,
    Postgres,
    Sqlite,
}

impl Driver {
    pub fn scheme(self) -> &'static str {
        match self {
            Driver::Mysql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }

    pub fn default_port(self) -> Option<u16> {
        match self {
            Driver::Mysql => Some(3306),
            Driver::Postgres => Some(5432),
            Driver::Sqlite => None,
        }
    }

    /// Rewrite a template for this driver.
    ///
    /// Placeholders are numbered in occurrence order, so the argument list must
    /// follow the same order. Text inside single-quoted literals is left alone.
    pub fn translate(self, sql: &str) -> Cow<'_, str> {
        match self {
            Driver::Mysql | Driver::Sqlite => Cow::Borrowed(sql),
            Driver::Postgres => Cow::Owned(to_postgres(sql)),
        }
    }
}

fn to_postgres(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 16);
    let mut in_literal = false;
    let mut index = 0usize;

    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            '`' if !in_literal => out.push('"'),
            _ => out.push(c),
        }
    }

    // `LIMIT ?, ?` binds (offset, count); keep the binding order, swap the syntax
    LIMIT_PAIR_RE
        .replace(&out, "LIMIT $$${2} OFFSET $$${1}")
        .into_owned()
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Driver::Mysql),
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "sqlite" => Ok(Driver::Sqlite),
            other => Err(ConfigError::invalid(format!("unknown database driver '{other}'"))),
        }
    }
}
