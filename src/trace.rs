//! Record of name bindings made during analysis.

use std::fmt;

use crate::value::Value;

/// One binding: `name` was bound to `value`, or to an unresolved value
/// when `value` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingEvent {
    pub name: String,
    pub value: Option<Value>,
}

impl BindingEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for BindingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} = {value}", self.name),
            None => write!(f, "{} = <unresolved>", self.name),
        }
    }
}

/// Popping a trace that holds no events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pop from an empty binding trace")]
pub struct EmptyStackError;

/// Last-in first-out stack of binding events.
///
/// Events are pushed in traversal order, so iteration yields them oldest
/// first and [`BindingTrace::pop`] returns the newest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTrace {
    events: Vec<BindingEvent>,
}

impl BindingTrace {
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BindingEvent) {
        self.events.push(event);
    }

    /// Remove and return the most recent event.
    ///
    /// # Errors
    ///
    /// Returns `EmptyStackError` when no events remain.
    pub fn pop(&mut self) -> Result<BindingEvent, EmptyStackError> {
        self.events.pop().ok_or(EmptyStackError)
    }

    /// Most recent event, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&BindingEvent> {
        self.events.last()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, BindingEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a BindingTrace {
    type Item = &'a BindingEvent;
    type IntoIter = std::slice::Iter<'a, BindingEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
