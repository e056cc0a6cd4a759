//! TRUNCATE builder.

use crate::error::ComposeResult;
use crate::fragment::Fragment;
use crate::ident::IntoIdent;
use crate::qb::{ident_list, invalid};
use crate::query::Query;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Restart,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Cascade,
    Restrict,
}

/// Options for [`truncate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TruncateOptions {
    pub identity: Option<Identity>,
    pub behavior: Option<Behavior>,
}

impl TruncateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restart_identity(mut self) -> Self {
        self.identity = Some(Identity::Restart);
        self
    }

    pub fn continue_identity(mut self) -> Self {
        self.identity = Some(Identity::Continue);
        self
    }

    pub fn cascade(mut self) -> Self {
        self.behavior = Some(Behavior::Cascade);
        self
    }

    pub fn restrict(mut self) -> Self {
        self.behavior = Some(Behavior::Restrict);
        self
    }
}

/// Empty one or more tables. The query's result is always null.
///
/// ```ignore
/// let q = truncate(["T", "orders"], TruncateOptions::new().restart_identity().cascade())?;
/// // TRUNCATE "T", "orders" RESTART IDENTITY CASCADE
/// ```
pub fn truncate<I: IntoIdent>(
    tables: impl IntoIterator<Item = I>,
    options: TruncateOptions,
) -> ComposeResult<Query> {
    let tables = tables
        .into_iter()
        .map(IntoIdent::into_ident)
        .collect::<ComposeResult<Vec<_>>>()?;
    if tables.is_empty() {
        return Err(invalid("truncate", "at least one table is required"));
    }

    let mut sql = Fragment::new("TRUNCATE ");
    sql.push_fragment(ident_list(&tables, ", "));
    if let Some(identity) = options.identity {
        sql.push(match identity {
            Identity::Restart => " RESTART IDENTITY",
            Identity::Continue => " CONTINUE IDENTITY",
        });
    }
    if let Some(behavior) = options.behavior {
        sql.push(match behavior {
            Behavior::Cascade => " CASCADE",
            Behavior::Restrict => " RESTRICT",
        });
    }

    Ok(Query::new(sql, Transform::Nothing))
}
