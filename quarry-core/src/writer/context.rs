use crate::ArgumentExpression;
use std::ops::{Deref, DerefMut};

/// Clause being rendered, lets nodes adapt to where they appear.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlSelect,
    SqlSelectFrom,
    SqlSelectWhere,
    SqlSelectOrderBy,
    SqlJoin,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlUpdateSet,
    SqlDeleteFrom,
}

/// Mutable state of one formatting run.
#[derive(Debug, Default)]
pub struct Context {
    pub fragment: Fragment,
    /// Nesting level of sub-queries, drives the indentation when beautifying.
    pub depth: usize,
    /// Bound arguments in emission order, the Nth `?` is the Nth parameter.
    pub parameters: Vec<ArgumentExpression>,
}

impl Context {
    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        let previous = self.fragment;
        self.fragment = fragment;
        ContextUpdater {
            previous,
            context: self,
        }
    }
}

/// Restores the previous fragment when dropped.
pub struct ContextUpdater<'a> {
    previous: Fragment,
    context: &'a mut Context,
}

impl Deref for ContextUpdater<'_> {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ContextUpdater<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ContextUpdater<'_> {
    fn drop(&mut self) {
        self.context.fragment = self.previous;
    }
}
