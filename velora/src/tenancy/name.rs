//! Validated tenant database identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::TenantError;

/// PostgreSQL truncates identifiers beyond this length.
pub const MAX_DB_NAME_LEN: usize = 63;

/// Databases that exist on every server and must never be treated as a tenant.
const RESERVED: &[&str] = &["postgres", "template0", "template1"];

/// Name of a tenant database.
///
/// Only values matching `^[a-z][a-z0-9_]{0,62}$` can be constructed, so a `TenantDbName` can be
/// spliced into DDL as a quoted identifier and into a connection URL path without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantDbName(String);

impl TenantDbName {
    /// Validate a candidate name.
    pub fn parse(candidate: impl Into<String>) -> Result<Self, TenantError> {
        let name = candidate.into();
        let invalid = |reason: &'static str| TenantError::InvalidName {
            name: name.clone(),
            reason,
        };

        let mut chars = name.chars();
        match chars.next() {
            None => return Err(invalid("must not be empty")),
            Some(c) if !c.is_ascii_lowercase() => return Err(invalid("must start with a lowercase letter")),
            Some(_) => {}
        }
        if name.len() > MAX_DB_NAME_LEN {
            return Err(invalid("must be at most 63 characters"));
        }
        if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
            return Err(invalid("may only contain lowercase letters, digits and underscores"));
        }
        if RESERVED.contains(&name.as_str()) {
            return Err(invalid("is a reserved database name"));
        }

        Ok(Self(name))
    }

    /// A fresh, collision-resistant name: `tenant_` followed by a v4 UUID in simple hex form.
    pub fn generate() -> Self {
        Self(format!("tenant_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a double-quoted SQL identifier, for DDL that cannot take bind parameters.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for TenantDbName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantDbName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TenantDbName {
    type Err = TenantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantDbName {
    type Error = TenantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TenantDbName> for String {
    fn from(name: TenantDbName) -> Self {
        name.0
    }
}
