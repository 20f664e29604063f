use std::fmt;

use serde::{Deserialize, Serialize};

/// Collision-free name a generated client is exported under.
///
/// Formed by concatenating a fixed prefix with the schema name whose first
/// character is upper-cased, so `users` with the prefix `PrismaClient` becomes
/// `PrismaClientUsers`. Distinct schema names give distinct symbols unless they
/// differ only in the case of their first character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSymbol(String);

impl ClientSymbol {
    /// Build the symbol for `schema_name`.
    ///
    /// ```
    /// use types::ClientSymbol;
    /// assert_eq!(ClientSymbol::for_schema("PrismaClient", "users").as_str(), "PrismaClientUsers");
    /// assert_eq!(ClientSymbol::for_schema("Client", "orderItems").as_str(), "ClientOrderItems");
    /// ```
    pub fn for_schema(prefix: &str, schema_name: &str) -> Self {
        Self(format!("{}{}", prefix, capitalize(schema_name)))
    }

    /// The symbol as a string slice.
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ClientSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for ClientSymbol {
    fn as_ref(&self) -> &str { &self.0 }
}

/// Upper-case the first character, leave the rest untouched.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
