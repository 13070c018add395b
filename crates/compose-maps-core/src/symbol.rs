//! Single-assignment ownership cells for resources that arrive late.

use std::fmt;

use crate::error::SymbolError;

/// Holds a native resource handle that becomes available asynchronously.
///
/// A symbol starts empty, is bound exactly once, and may be unbound when the
/// owner tears down. Reading an empty symbol or binding an occupied one is an
/// error rather than a silent `None`.
pub struct Symbol<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T> Symbol<T> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, value: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }

    /// Binds `value`, failing if the symbol already holds one.
    pub fn bind(&mut self, value: T) -> Result<(), SymbolError> {
        if self.value.is_some() {
            return Err(SymbolError::AlreadyBound { name: self.name });
        }
        self.value = Some(value);
        Ok(())
    }

    /// Binds `value` unconditionally and returns the value it displaced.
    pub fn rebind(&mut self, value: T) -> Option<T> {
        self.value.replace(value)
    }

    pub fn get(&self) -> Result<&T, SymbolError> {
        self.value
            .as_ref()
            .ok_or(SymbolError::Unbound { name: self.name })
    }

    pub fn get_mut(&mut self) -> Result<&mut T, SymbolError> {
        self.value
            .as_mut()
            .ok_or(SymbolError::Unbound { name: self.name })
    }

    /// Clears the symbol. Safe to call on an empty symbol.
    pub fn unbind(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T> fmt::Debug for Symbol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}
