//! Fragment compilation.
//!
//! Compiling walks a [`Fragment`] depth-first and renders `$1, $2, ...`
//! placeholders in first-occurrence order, collecting the bound values in the
//! same order. Compilation is pure: the same fragment always yields the same
//! text and values.

use crate::config::Config;
use crate::error::{ComposeError, ComposeResult};
use crate::fragment::{Fragment, Node};
use crate::ident::Ident;
use crate::value::SqlParam;
use std::fmt::Write;
use tokio_postgres::types::ToSql;

/// A compiled statement: SQL text plus its positional parameters.
///
/// `$k` in `text` refers to `values[k - 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub text: String,
    pub values: Vec<SqlParam>,
}

impl Compiled {
    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }
}

struct Compiler<'a> {
    config: &'a Config,
    text: String,
    values: Vec<SqlParam>,
}

impl Compiler<'_> {
    fn walk(
        &mut self,
        fragment: &Fragment,
        column: Option<&Ident>,
        parent: Option<&Ident>,
    ) -> ComposeResult<()> {
        for node in fragment.nodes() {
            match node {
                Node::Literal(s) | Node::Raw(s) => self.text.push_str(s),
                Node::Identifier(ident) => ident.write_sql(&mut self.text),
                Node::Parameter { value, cast } => {
                    self.values.push(value.clone());
                    let _ = write!(&mut self.text, "${}", self.values.len());
                    if let Some(cast) = cast {
                        self.text.push_str("::");
                        self.text.push_str(cast);
                    } else if (self.config.cast_array_params_to_json && value.is_json_array())
                        || (self.config.cast_object_params_to_json && value.is_json_object())
                    {
                        self.text.push_str("::json");
                    }
                }
                Node::SelfColumn => {
                    let column = column.ok_or_else(|| {
                        ComposeError::validation(
                            "self column reference used outside a column context",
                        )
                    })?;
                    column.write_sql(&mut self.text);
                }
                Node::ParentColumn(name) => {
                    let parent = parent.ok_or_else(|| {
                        ComposeError::validation(format!(
                            "parent column reference {} used outside a lateral subquery",
                            name.to_sql()
                        ))
                    })?;
                    parent.write_sql(&mut self.text);
                    self.text.push('.');
                    name.write_sql(&mut self.text);
                }
                Node::Nested { scope, body } => {
                    // a new parent table starts a fresh column context
                    let (column, parent) = match &scope.parent {
                        Some(p) => (scope.column.as_ref(), Some(p)),
                        None => (scope.column.as_ref().or(column), parent),
                    };
                    self.walk(body, column, parent)?;
                }
            }
        }
        Ok(())
    }
}

impl Fragment {
    /// Render SQL with `$1, $2, ...` placeholders using the default [`Config`].
    pub fn compile(&self) -> ComposeResult<Compiled> {
        self.compile_with(&Config::default())
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn compile_with(&self, config: &Config) -> ComposeResult<Compiled> {
        let mut compiler = Compiler {
            config,
            text: String::new(),
            values: Vec::new(),
        };
        compiler.walk(self, None, None)?;
        Ok(Compiled {
            text: compiler.text,
            values: compiler.values,
        })
    }
}
