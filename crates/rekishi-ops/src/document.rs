//! JSON document that reference ops replay against.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use crate::ops::{Action, Component, JsonOp, PathSegment, display_path};
use crate::{Apply, OpError, Result};

/// A materialized JSON document.
///
/// Ops are applied all-or-nothing: if any component of a [`JsonOp`] fails,
/// the document is left exactly as it was before the op.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonDocument {
    root: Value,
}

impl JsonDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// The document as a JSON value.
    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_inner(self) -> Value {
        self.root
    }

    /// Apply an op, reporting why it does not fit the document.
    pub fn try_apply(&mut self, op: &JsonOp) -> Result<()> {
        match op.components.as_slice() {
            [] => Ok(()),
            // Single components validate before they mutate.
            [component] => apply_component(&mut self.root, component),
            components => {
                let mut scratch = self.root.clone();
                for component in components {
                    apply_component(&mut scratch, component)?;
                }
                self.root = scratch;
                Ok(())
            }
        }
    }
}

impl From<Value> for JsonDocument {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

impl Apply<JsonOp> for JsonDocument {
    fn apply(&mut self, op: &JsonOp) {
        match self.try_apply(op) {
            Ok(()) => trace!(components = op.len(), "applied op"),
            Err(e) => warn!("JsonDocument: skipping op that does not apply: {e}"),
        }
    }
}

// ============================================================================
// Component application
// ============================================================================

fn apply_component(root: &mut Value, component: &Component) -> Result<()> {
    let path = component.path.as_slice();
    match &component.action {
        Action::NumberAdd(i64::MIN) => Err(OpError::UninvertibleDelta { path: display_path(path) }),

        Action::NumberAdd(delta) => {
            let target = resolve_mut(root, path)?;
            let current = target.as_i64().ok_or_else(|| OpError::TypeMismatch {
                path: display_path(path),
                expected: "integer",
            })?;
            let next = current
                .checked_add(*delta)
                .ok_or_else(|| OpError::Overflow { path: display_path(path) })?;
            *target = Value::from(next);
            Ok(())
        }

        Action::ObjectInsert(value) => {
            let (object, key) = object_parent(root, path)?;
            if object.contains_key(key) {
                return Err(OpError::ValueMismatch { path: display_path(path) });
            }
            object.insert(key.to_string(), value.clone());
            Ok(())
        }

        Action::ObjectDelete(value) => {
            let (object, key) = object_parent(root, path)?;
            match object.get(key) {
                Some(existing) if existing == value => {
                    object.remove(key);
                    Ok(())
                }
                Some(_) => Err(OpError::ValueMismatch { path: display_path(path) }),
                None => Err(OpError::PathNotFound { path: display_path(path) }),
            }
        }

        Action::ObjectReplace { before, after } => {
            let (object, key) = object_parent(root, path)?;
            let slot = object
                .get_mut(key)
                .ok_or_else(|| OpError::PathNotFound { path: display_path(path) })?;
            if slot != before {
                return Err(OpError::ValueMismatch { path: display_path(path) });
            }
            *slot = after.clone();
            Ok(())
        }

        Action::ListInsert(value) => {
            let (list, index) = list_parent(root, path)?;
            if index > list.len() {
                return Err(OpError::IndexOutOfBounds {
                    path: display_path(path),
                    index,
                    len: list.len(),
                });
            }
            list.insert(index, value.clone());
            Ok(())
        }

        Action::ListDelete(value) => {
            let (list, index) = list_parent(root, path)?;
            let len = list.len();
            let existing = list.get(index).ok_or_else(|| OpError::IndexOutOfBounds {
                path: display_path(path),
                index,
                len,
            })?;
            if existing != value {
                return Err(OpError::ValueMismatch { path: display_path(path) });
            }
            list.remove(index);
            Ok(())
        }

        Action::ListReplace { before, after } => {
            let (list, index) = list_parent(root, path)?;
            let len = list.len();
            let slot = list.get_mut(index).ok_or_else(|| OpError::IndexOutOfBounds {
                path: display_path(path),
                index,
                len,
            })?;
            if slot != before {
                return Err(OpError::ValueMismatch { path: display_path(path) });
            }
            *slot = after.clone();
            Ok(())
        }

        Action::StringInsert { offset, text } => {
            let target = resolve_mut(root, path)?;
            let s = as_string_mut(target, path)?;
            let at = byte_offset(s, *offset).ok_or_else(|| OpError::IndexOutOfBounds {
                path: display_path(path),
                index: *offset,
                len: s.chars().count(),
            })?;
            s.insert_str(at, text);
            Ok(())
        }

        Action::StringDelete { offset, text } => {
            let target = resolve_mut(root, path)?;
            let s = as_string_mut(target, path)?;
            let start = byte_offset(s, *offset).ok_or_else(|| OpError::IndexOutOfBounds {
                path: display_path(path),
                index: *offset,
                len: s.chars().count(),
            })?;
            if !s[start..].starts_with(text.as_str()) {
                return Err(OpError::ValueMismatch { path: display_path(path) });
            }
            s.replace_range(start..start + text.len(), "");
            Ok(())
        }
    }
}

/// Walk `path` from the root.
fn resolve_mut<'a>(root: &'a mut Value, path: &[PathSegment]) -> Result<&'a mut Value> {
    let mut current = root;
    for (depth, seg) in path.iter().enumerate() {
        let next = match seg {
            PathSegment::Key(k) => current.as_object_mut().and_then(|o| o.get_mut(k)),
            PathSegment::Index(i) => current.as_array_mut().and_then(|a| a.get_mut(*i)),
        };
        current = next.ok_or_else(|| OpError::PathNotFound {
            path: display_path(&path[..=depth]),
        })?;
    }
    Ok(current)
}

fn object_parent<'a, 'p>(
    root: &'a mut Value,
    path: &'p [PathSegment],
) -> Result<(&'a mut serde_json::Map<String, Value>, &'p str)> {
    let (last, parent) = path.split_last().ok_or(OpError::EmptyPath)?;
    let PathSegment::Key(key) = last else {
        return Err(OpError::TypeMismatch { path: display_path(path), expected: "object key" });
    };
    let object = resolve_mut(root, parent)?
        .as_object_mut()
        .ok_or_else(|| OpError::TypeMismatch { path: display_path(parent), expected: "object" })?;
    Ok((object, key.as_str()))
}

fn list_parent<'a>(root: &'a mut Value, path: &[PathSegment]) -> Result<(&'a mut Vec<Value>, usize)> {
    let (last, parent) = path.split_last().ok_or(OpError::EmptyPath)?;
    let PathSegment::Index(index) = last else {
        return Err(OpError::TypeMismatch { path: display_path(path), expected: "list index" });
    };
    let list = resolve_mut(root, parent)?
        .as_array_mut()
        .ok_or_else(|| OpError::TypeMismatch { path: display_path(parent), expected: "list" })?;
    Ok((list, *index))
}

fn as_string_mut<'a>(value: &'a mut Value, path: &[PathSegment]) -> Result<&'a mut String> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(OpError::TypeMismatch { path: display_path(path), expected: "string" }),
    }
}

/// Byte index of the `chars`-th char, allowing one-past-the-end.
fn byte_offset(s: &str, chars: usize) -> Option<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(chars)
}
