//! Typed statement facade.
//!
//! [`SqlBuilder<T>`] is the public entry point: it is created for a record
//! type `T`, accepts expressions through chainable methods, and renders to a
//! [`Command`]. Joins return a builder typed by the joined record that
//! shares the same underlying statement, so later calls on either view
//! extend one query.
//!
//! ```rust,ignore
//! let command = SqlBuilder::<User>::select(&context)?
//!     .where_clause(User::email().eq("a@b.com"))?
//!     .command()?;
//! assert_eq!(command.text, "SELECT u.* FROM Users u WHERE u.[Email] = @Param1");
//! ```

mod filter;
mod join;
mod select;
mod write;

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::adapter::Operation;
use crate::builder::{Command, QueryBuilder, SplitColumn, TableSource};
use crate::context::SqlContext;
use crate::error::Result;
use crate::params::Parameters;
use crate::resolver::Resolver;
use crate::schema::Record;

/// Anything that renders to an executable command.
///
/// Implemented by single statements and by the composites in
/// [`composite`](crate::composite).
pub trait SqlCommand {
    /// Renders the command.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while rendering.
    fn command(&self) -> Result<Command>;

    /// Returns the highest parameter number issued so far, used to seed the
    /// next statement of a batch.
    fn current_param_index(&self) -> usize;

    /// Renders the SQL text.
    ///
    /// # Errors
    ///
    /// See [`SqlCommand::command`].
    fn command_text(&self) -> Result<String> {
        Ok(self.command()?.text)
    }

    /// Renders the parameter table.
    ///
    /// # Errors
    ///
    /// See [`SqlCommand::command`].
    fn command_parameters(&self) -> Result<Parameters> {
        Ok(self.command()?.parameters)
    }
}

/// A statement over record `T`.
pub struct SqlBuilder<T> {
    state: Rc<RefCell<QueryBuilder>>,
    context: SqlContext,
    record: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for SqlBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBuilder")
            .field("state", &self.state)
            .field("context", &self.context)
            .finish()
    }
}

impl<T: Record> SqlBuilder<T> {
    /// Starts a statement whose primary table is `T`.
    fn start(context: &SqlContext, operation: Operation) -> Result<Self> {
        let schema = context.schemas().get(T::NAME)?;
        let mut builder = context.query_builder();
        builder.set_operation(operation);
        builder.add_table(T::NAME, &schema.qualified_table(), TableSource::Table);
        Ok(Self::wrap(builder, context))
    }

    fn wrap(builder: QueryBuilder, context: &SqlContext) -> Self {
        Self {
            state: Rc::new(RefCell::new(builder)),
            context: context.clone(),
            record: PhantomData,
        }
    }

    /// Returns a view of the same statement typed by `U`.
    #[must_use]
    pub fn view<U: Record>(&self) -> SqlBuilder<U> {
        SqlBuilder {
            state: Rc::clone(&self.state),
            context: self.context.clone(),
            record: PhantomData,
        }
    }

    // Borrows of the shared statement end before the facade call returns,
    // and no caller code runs while one is held.
    fn state(&self) -> RefMut<'_, QueryBuilder> {
        self.state.borrow_mut()
    }

    /// Runs `f` against the statement. A failing `f` leaves the statement
    /// as it was, for every view that shares it.
    fn with_resolver<R>(&self, f: impl FnOnce(&mut Resolver<'_>) -> Result<R>) -> Result<R> {
        let mut state = self.state();
        let mut resolver = Resolver::new(&mut state, self.context.schemas());
        resolver.atomic(f)
    }

    /// Returns the context the statement was created with.
    #[must_use]
    pub const fn context(&self) -> &SqlContext {
        &self.context
    }

    /// Returns the statement kind.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.state.borrow().operation()
    }

    /// Renders the statement.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::render`].
    pub fn render(&self) -> Result<Command> {
        self.state.borrow().render()
    }

    /// Returns the names of every table in the statement, in order.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.state.borrow().table_names()
    }

    /// Returns where the projection switches tables.
    #[must_use]
    pub fn split_columns(&self) -> Vec<SplitColumn> {
        self.state.borrow().split_columns().to_vec()
    }

    /// Returns the WHERE conditions alone, without the keyword.
    #[must_use]
    pub fn where_command_text(&self) -> String {
        self.state.borrow().where_text()
    }
}

impl<T: Record> SqlCommand for SqlBuilder<T> {
    fn command(&self) -> Result<Command> {
        self.render()
    }

    fn current_param_index(&self) -> usize {
        self.state.borrow().current_param_index()
    }
}
