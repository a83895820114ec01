//! json0-style reference operations.
//!
//! A [`JsonOp`] is an ordered list of [`Component`]s, each targeting one
//! location in a JSON document. Components carry enough of the prior value
//! (deleted items, replaced values) to be inverted without consulting the
//! document, which is what makes backward replay possible.
//!
//! Path conventions:
//! - Number and string components: the path names the number or string itself.
//! - Object components: the last segment is the key inside the parent object.
//! - List components: the last segment is the index inside the parent list.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::Invert;

/// One step of a path into a JSON document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Index into a list.
    Index(usize),
    /// Key into an object.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Key(k) => write!(f, ".{k}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Render a path for error messages, e.g. `$.items[2].title`.
pub(crate) fn display_path(path: &[PathSegment]) -> String {
    let mut out = String::from("$");
    for seg in path {
        out.push_str(&seg.to_string());
    }
    out
}

/// What a component does at its path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Add to an integer.
    NumberAdd(i64),
    /// Insert a key that must not already exist.
    ObjectInsert(Value),
    /// Remove a key holding exactly this value.
    ObjectDelete(Value),
    /// Swap the value under a key.
    ObjectReplace { before: Value, after: Value },
    /// Insert an item at an index, shifting later items right.
    ListInsert(Value),
    /// Remove the item at an index, which must equal this value.
    ListDelete(Value),
    /// Swap the item at an index.
    ListReplace { before: Value, after: Value },
    /// Insert text at a char offset.
    StringInsert { offset: usize, text: String },
    /// Remove text at a char offset, which must match.
    StringDelete { offset: usize, text: String },
}

/// Discriminant of [`Action`], used for summaries and filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionKind {
    NumberAdd,
    ObjectInsert,
    ObjectDelete,
    ObjectReplace,
    ListInsert,
    ListDelete,
    ListReplace,
    StringInsert,
    StringDelete,
}

impl Action {
    /// The kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::NumberAdd(_) => ActionKind::NumberAdd,
            Action::ObjectInsert(_) => ActionKind::ObjectInsert,
            Action::ObjectDelete(_) => ActionKind::ObjectDelete,
            Action::ObjectReplace { .. } => ActionKind::ObjectReplace,
            Action::ListInsert(_) => ActionKind::ListInsert,
            Action::ListDelete(_) => ActionKind::ListDelete,
            Action::ListReplace { .. } => ActionKind::ListReplace,
            Action::StringInsert { .. } => ActionKind::StringInsert,
            Action::StringDelete { .. } => ActionKind::StringDelete,
        }
    }
}

impl Invert for Action {
    fn invert(&self) -> Self {
        match self {
            // i64::MIN maps to itself; documents refuse to apply it.
            Action::NumberAdd(n) => Action::NumberAdd(n.wrapping_neg()),
            Action::ObjectInsert(v) => Action::ObjectDelete(v.clone()),
            Action::ObjectDelete(v) => Action::ObjectInsert(v.clone()),
            Action::ObjectReplace { before, after } => Action::ObjectReplace {
                before: after.clone(),
                after: before.clone(),
            },
            Action::ListInsert(v) => Action::ListDelete(v.clone()),
            Action::ListDelete(v) => Action::ListInsert(v.clone()),
            Action::ListReplace { before, after } => Action::ListReplace {
                before: after.clone(),
                after: before.clone(),
            },
            Action::StringInsert { offset, text } => Action::StringDelete {
                offset: *offset,
                text: text.clone(),
            },
            Action::StringDelete { offset, text } => Action::StringInsert {
                offset: *offset,
                text: text.clone(),
            },
        }
    }
}

/// A single edit at one path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Location in the document (see module docs for conventions).
    #[serde(rename = "p")]
    pub path: Vec<PathSegment>,
    /// The edit to perform there.
    #[serde(flatten)]
    pub action: Action,
}

impl Component {
    /// Create a component from an explicit path.
    pub fn new(path: Vec<PathSegment>, action: Action) -> Self {
        Self { path, action }
    }

    fn at<P, S>(path: P, action: Action) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::new(path.into_iter().map(Into::into).collect(), action)
    }

    fn in_list<P, S>(list: P, index: usize, action: Action) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        let mut path: Vec<PathSegment> = list.into_iter().map(Into::into).collect();
        path.push(PathSegment::Index(index));
        Self::new(path, action)
    }

    pub fn number_add<P, S>(path: P, delta: i64) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::at(path, Action::NumberAdd(delta))
    }

    pub fn object_insert<P, S>(path: P, value: Value) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::at(path, Action::ObjectInsert(value))
    }

    pub fn object_delete<P, S>(path: P, value: Value) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::at(path, Action::ObjectDelete(value))
    }

    pub fn object_replace<P, S>(path: P, before: Value, after: Value) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::at(path, Action::ObjectReplace { before, after })
    }

    /// Insert into the list at `list`, before position `index`.
    pub fn list_insert<P, S>(list: P, index: usize, value: Value) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::in_list(list, index, Action::ListInsert(value))
    }

    pub fn list_delete<P, S>(list: P, index: usize, value: Value) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::in_list(list, index, Action::ListDelete(value))
    }

    pub fn list_replace<P, S>(list: P, index: usize, before: Value, after: Value) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::in_list(list, index, Action::ListReplace { before, after })
    }

    pub fn string_insert<P, S>(path: P, offset: usize, text: impl Into<String>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::at(path, Action::StringInsert { offset, text: text.into() })
    }

    pub fn string_delete<P, S>(path: P, offset: usize, text: impl Into<String>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::at(path, Action::StringDelete { offset, text: text.into() })
    }

    /// Human-readable path, e.g. `$.items[0]`.
    pub fn display_path(&self) -> String {
        display_path(&self.path)
    }
}

impl Invert for Component {
    fn invert(&self) -> Self {
        Self {
            path: self.path.clone(),
            action: self.action.invert(),
        }
    }
}

/// One logged edit: a list of components applied in order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonOp {
    pub components: Vec<Component>,
}

impl JsonOp {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// An op with exactly one component.
    pub fn single(component: Component) -> Self {
        Self { components: vec![component] }
    }

    /// Whether this op has no components (a no-op).
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }
}

impl Invert for JsonOp {
    /// Components are undone last-first, each inverted.
    fn invert(&self) -> Self {
        Self {
            components: self.components.iter().rev().map(Invert::invert).collect(),
        }
    }
}
