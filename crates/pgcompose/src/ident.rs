//! Safe SQL identifier handling.
//!
//! [`Ident`] represents a table, column or alias name. It is always rendered
//! double-quoted, with embedded `"` doubled, so user text never reaches the SQL
//! unescaped.
//!
//! - Unquoted input parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted input parts allow any characters except NUL and escape `"` as `""`
//!
//! # Example
//! ```ignore
//! use pgcompose::Ident;
//!
//! let t = Ident::parse("public.users")?;
//! assert_eq!(t.to_sql(), r#""public"."users""#);
//! # Ok::<(), pgcompose::ComposeError>(())
//! ```

use crate::error::{ComposeError, ComposeResult};

/// A SQL identifier (column, table, alias or schema-qualified table).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// Create a single-part identifier from a raw name.
    ///
    /// Any character except NUL is accepted; the name is quoted on output.
    pub fn quoted(name: &str) -> ComposeResult<Self> {
        if name.is_empty() {
            return Err(ComposeError::validation("Empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(ComposeError::validation(
                "Identifier cannot contain NUL character",
            ));
        }
        Ok(Self {
            parts: vec![name.to_string()],
        })
    }

    /// A single-part column identifier.
    ///
    /// Record and option keys are used verbatim; quoting on output keeps them inert.
    pub(crate) fn column(name: &str) -> Self {
        Self {
            parts: vec![name.to_string()],
        }
    }

    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Mixed: `public."UserTable"`
    pub fn parse(s: &str) -> ComposeResult<Self> {
        if s.is_empty() {
            return Err(ComposeError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(ComposeError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(ComposeError::validation("Trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(ComposeError::validation(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            // "" is an escaped quote
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => return Err(ComposeError::validation("Unclosed quoted identifier")),
                    }
                }
                if name.is_empty() {
                    return Err(ComposeError::validation("Empty quoted identifier"));
                }
                parts.push(name);
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(ComposeError::validation(format!(
                        "Invalid character in identifier '{s}': '{c}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(ComposeError::validation("Empty identifier segment"));
            }
            parts.push(name);
        }

        if parts.is_empty() {
            return Err(ComposeError::validation("Empty identifier"));
        }

        Ok(Self { parts })
    }

    /// The unquoted name, parts joined with `.`.
    pub fn name(&self) -> String {
        self.parts.join(".")
    }

    /// A single-part identifier named `{prefix}{name}`, e.g. `sq_users`.
    pub(crate) fn prefixed(&self, prefix: &str) -> Self {
        Self {
            parts: vec![format!("{prefix}{}", self.name())],
        }
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('"');
            for ch in part.chars() {
                if ch == '"' {
                    out.push('"');
                }
                out.push(ch);
            }
            out.push('"');
        }
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> ComposeResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> ComposeResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> ComposeResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> ComposeResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> ComposeResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> ComposeResult<Ident> {
        Ident::parse(self)
    }
}

/// Parse a table or column identifier.
pub fn ident(name: impl IntoIdent) -> ComposeResult<Ident> {
    name.into_ident()
}
