//! Batches and unions of statements.
//!
//! A composite renders each member in turn and joins the texts with its
//! separator. Members built through [`SqlCollection::add`] or
//! [`SqlUnion::add`] are seeded with the parameter index of the previous
//! member, so parameter names never collide:
//!
//! ```rust,ignore
//! let batch = SqlCollection::new(context)
//!     .add(|ctx| SqlBuilder::<User>::select(ctx)?.where_clause(User::id().eq(1)))?
//!     .add(|ctx| SqlBuilder::<User>::select(ctx)?.where_clause(User::id().eq(2)))?;
//! // SELECT u.* FROM Users u WHERE u.[Id] = @Param1
//! // SELECT u.* FROM Users u WHERE u.[Id] = @Param2
//! ```

use std::fmt;

use tracing::debug;

use crate::builder::Command;
use crate::context::SqlContext;
use crate::error::{Result, SqlError};
use crate::params::Parameters;
use crate::statement::SqlCommand;

/// Ordered members plus the context new members are built from.
struct Members {
    context: SqlContext,
    items: Vec<Box<dyn SqlCommand>>,
}

impl Members {
    fn new(context: SqlContext) -> Self {
        Self {
            context,
            items: Vec::new(),
        }
    }

    fn current_param_index(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.current_param_index())
            .fold(self.context.seed(), usize::max)
    }

    fn add<C, F>(&mut self, build: F) -> Result<()>
    where
        C: SqlCommand + 'static,
        F: FnOnce(&SqlContext) -> Result<C>,
    {
        let seeded = self.context.with_seed(self.current_param_index());
        let member = build(&seeded)?;
        self.items.push(Box::new(member));
        Ok(())
    }

    fn render(&self, separator: &str, kind: &'static str) -> Result<Command> {
        if self.items.is_empty() {
            return Err(SqlError::InvalidArgument(format!("{kind} has no statements")));
        }
        let mut texts = Vec::with_capacity(self.items.len());
        let mut parameters = Parameters::new();
        for item in &self.items {
            let command = item.command()?;
            parameters.try_extend(&command.parameters)?;
            texts.push(command.text);
        }
        debug!(kind, members = texts.len(), params = parameters.len(), "rendered composite");
        Ok(Command {
            text: texts.join(separator),
            parameters,
        })
    }
}

impl fmt::Debug for Members {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Members")
            .field("context", &self.context)
            .field("items", &self.items.len())
            .finish()
    }
}

/// Statements executed one after another, joined by newlines.
#[derive(Debug)]
pub struct SqlCollection {
    members: Members,
}

impl SqlCollection {
    /// Creates an empty batch whose first member is built from `context`.
    #[must_use]
    pub fn new(context: SqlContext) -> Self {
        Self {
            members: Members::new(context),
        }
    }

    /// Builds the next member with a context seeded after the parameters
    /// already used.
    ///
    /// # Errors
    ///
    /// Propagates the error of `build`.
    pub fn add<C, F>(mut self, build: F) -> Result<Self>
    where
        C: SqlCommand + 'static,
        F: FnOnce(&SqlContext) -> Result<C>,
    {
        self.members.add(build)?;
        Ok(self)
    }

    /// Appends a member built elsewhere. Its parameter names must not
    /// collide with those of the other members.
    #[must_use]
    pub fn push(mut self, member: impl SqlCommand + 'static) -> Self {
        self.members.items.push(Box::new(member));
        self
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.items.len()
    }

    /// Returns true when the batch has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.items.is_empty()
    }
}

impl SqlCommand for SqlCollection {
    fn command(&self) -> Result<Command> {
        self.members.render("\n", "collection")
    }

    fn current_param_index(&self) -> usize {
        self.members.current_param_index()
    }
}

/// SELECT statements combined with `UNION` or `UNION ALL`.
///
/// Members must project the same number of columns; this is not checked.
#[derive(Debug)]
pub struct SqlUnion {
    members: Members,
    all: bool,
}

impl SqlUnion {
    /// Creates a `UNION`, which removes duplicate rows.
    #[must_use]
    pub fn new(context: SqlContext) -> Self {
        Self {
            members: Members::new(context),
            all: false,
        }
    }

    /// Creates a `UNION ALL`, which keeps duplicate rows.
    #[must_use]
    pub fn all(context: SqlContext) -> Self {
        Self {
            members: Members::new(context),
            all: true,
        }
    }

    /// Builds the next member with a context seeded after the parameters
    /// already used.
    ///
    /// # Errors
    ///
    /// Propagates the error of `build`.
    pub fn add<C, F>(mut self, build: F) -> Result<Self>
    where
        C: SqlCommand + 'static,
        F: FnOnce(&SqlContext) -> Result<C>,
    {
        self.members.add(build)?;
        Ok(self)
    }

    /// Appends a member built elsewhere.
    #[must_use]
    pub fn push(mut self, member: impl SqlCommand + 'static) -> Self {
        self.members.items.push(Box::new(member));
        self
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.items.len()
    }

    /// Returns true when the union has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.items.is_empty()
    }
}

impl SqlCommand for SqlUnion {
    fn command(&self) -> Result<Command> {
        let separator = if self.all {
            "\nUNION ALL\n"
        } else {
            "\nUNION\n"
        };
        self.members.render(separator, "union")
    }

    fn current_param_index(&self) -> usize {
        self.members.current_param_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    /// A pre-rendered member.
    struct Fixed {
        text: &'static str,
        parameters: Vec<(&'static str, i64)>,
        index: usize,
    }

    impl SqlCommand for Fixed {
        fn command(&self) -> Result<Command> {
            Ok(Command {
                text: self.text.to_string(),
                parameters: self
                    .parameters
                    .iter()
                    .map(|(name, value)| ((*name).to_string(), SqlValue::Int(*value)))
                    .collect(),
            })
        }

        fn current_param_index(&self) -> usize {
            self.index
        }
    }

    fn context() -> SqlContext {
        SqlContext::sql_server(crate::schema::SchemaRegistry::new())
    }

    #[test]
    fn test_add_seeds_from_previous_member() {
        let mut seeds = Vec::new();
        let collection = SqlCollection::new(context())
            .push(Fixed {
                text: "A",
                parameters: vec![("Param1", 1), ("Param2", 2)],
                index: 2,
            })
            .add(|ctx| {
                seeds.push(ctx.seed());
                Ok(Fixed {
                    text: "B",
                    parameters: vec![("Param3", 3)],
                    index: 3,
                })
            })
            .unwrap();
        assert_eq!(seeds, vec![2]);
        assert_eq!(collection.current_param_index(), 3);
        let command = collection.command().unwrap();
        assert_eq!(command.text, "A\nB");
        assert_eq!(command.parameters.len(), 3);
    }

    #[test]
    fn test_union_separators() {
        let member = |text| Fixed {
            text,
            parameters: Vec::new(),
            index: 0,
        };
        let union = SqlUnion::new(context()).push(member("A")).push(member("B"));
        assert_eq!(union.command_text().unwrap(), "A\nUNION\nB");
        let union = SqlUnion::all(context()).push(member("A")).push(member("B"));
        assert_eq!(union.command_text().unwrap(), "A\nUNION ALL\nB");
    }

    #[test]
    fn test_collision_is_an_error() {
        let collection = SqlCollection::new(context())
            .push(Fixed {
                text: "A",
                parameters: vec![("Param1", 1)],
                index: 1,
            })
            .push(Fixed {
                text: "B",
                parameters: vec![("Param1", 2)],
                index: 1,
            });
        assert!(matches!(
            collection.command(),
            Err(SqlError::ParameterCollision(name)) if name == "Param1"
        ));
    }

    #[test]
    fn test_empty_composite_is_an_error() {
        assert!(SqlCollection::new(context()).is_empty());
        assert!(matches!(
            SqlUnion::new(context()).command(),
            Err(SqlError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_composites_nest() {
        let inner = SqlUnion::all(context()).push(Fixed {
            text: "A",
            parameters: vec![("Param1", 1)],
            index: 1,
        });
        let outer = SqlCollection::new(context()).push(inner).push(Fixed {
            text: "B",
            parameters: vec![("Param2", 2)],
            index: 2,
        });
        assert_eq!(outer.command_text().unwrap(), "A\nB");
        assert_eq!(outer.current_param_index(), 2);
    }
}
