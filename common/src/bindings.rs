//! Binding context
//!
//! An immutable, chainable mapping from name to value. Registering a binding
//! never touches the receiver: it returns a child scope that shadows the
//! parent. Clones share the parent chain, so handing a copy to a parallel
//! branch is cheap and that branch can extend it without anyone else seeing.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when registering bindings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("invalid binding name '{0}'")]
    InvalidName(String),
}

struct Node {
    name: String,
    value: Value,
    parent: Option<Arc<Node>>,
}

/// Scoped binding context
#[derive(Clone, Default)]
pub struct Bindings {
    head: Option<Arc<Node>>,
}

impl Bindings {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a child scope with `name` bound to `value`
    pub fn register(&self, name: impl Into<String>, value: Value) -> Self {
        Self {
            head: Some(Arc::new(Node {
                name: name.into(),
                value,
                parent: self.head.clone(),
            })),
        }
    }

    /// Same as [`Bindings::register`] but rejects names that expressions cannot reference
    pub fn try_register(&self, name: &str, value: Value) -> Result<Self, BindingError> {
        check_name(name)?;
        Ok(self.register(name, value))
    }

    /// Look up the innermost binding for `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.nodes().find(|n| n.name == name).map(|n| &n.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Visible binding names, innermost first, without shadowed duplicates
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for node in self.nodes() {
            if !names.contains(&node.name.as_str()) {
                names.push(node.name.as_str());
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.head.as_deref(), |n| n.parent.as_deref())
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.names() {
            map.entry(&name, &self.get(name));
        }
        map.finish()
    }
}

/// Validate a binding name: `[A-Za-z_][A-Za-z0-9_]*`
pub fn check_name(name: &str) -> Result<(), BindingError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(BindingError::InvalidName(name.to_string()))
    }
}
