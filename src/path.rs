//! Paths into a nested JSON value.
//!
//! A [`Path`] is the ordered list of [`Segment`]s leading from the root to a
//! nested location. Tracked views recompute their path lazily from their
//! parent chain on every operation; paths are never stored persistently.

use serde_json::Value;
use std::fmt;

/// One step into a nested value: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, ".{}", k),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// An ordered sequence of segments from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Path(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Follow the path through `root`, returning the addressed sub-value.
    /// `None` when any step no longer resolves.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut cursor = root;
        for seg in &self.0 {
            cursor = step(cursor, seg)?;
        }
        Some(cursor)
    }

    /// Mutable variant of [`Path::resolve`].
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut cursor = root;
        for seg in &self.0 {
            cursor = step_mut(cursor, seg)?;
        }
        Some(cursor)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        write!(f, "$")?;
        for seg in &self.0 {
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

pub(crate) fn step<'a>(value: &'a Value, seg: &Segment) -> Option<&'a Value> {
    match seg {
        Segment::Key(k) => value.as_object()?.get(k),
        Segment::Index(i) => value.as_array()?.get(*i),
    }
}

pub(crate) fn step_mut<'a>(value: &'a mut Value, seg: &Segment) -> Option<&'a mut Value> {
    match seg {
        Segment::Key(k) => value.as_object_mut()?.get_mut(k),
        Segment::Index(i) => value.as_array_mut()?.get_mut(*i),
    }
}
