//! # Mutation Tracker
//!
//! The tracker wraps a root JSON value so that every write goes through a
//! simulate-validate-commit sequence:
//!
//! 1. Deep-clone the true current root into a candidate.
//! 2. Resolve this view's path inside the candidate and apply the write there.
//! 3. If a validator is configured, validate the whole candidate root.
//!    Rejection aborts the operation: the live value, every view, and the
//!    durable file are exactly as before.
//! 4. On acceptance, apply the identical write to the live root and hand the
//!    new root to the commit callback.
//!
//! The tracker performs no I/O itself; the commit callback (wired to the
//! debounced scheduler by [`Nook::tracked`](crate::Nook::tracked)) is the only
//! way an accepted root leaves this module.
//!
//! ## Views
//!
//! A [`Tracked`] handle addresses one location in the root. [`Tracked::child`]
//! descends into composite sub-values and caches the resulting view per
//! segment, so traversing the same property twice yields handles sharing one
//! node ([`Tracked::ptr_eq`]). Paths are recomputed from the parent chain on
//! every operation: a view is purely an address, never a cached value. A view
//! held across structural changes therefore reads whatever its path resolves
//! to *now* (possibly a scalar that replaced the composite it was created
//! over), reads `None` once the path stops resolving at all, and fails
//! structurally on writes whose target no longer has the right shape.
//!
//! ## Write semantics over typed JSON
//!
//! - `set` with a key needs an object target; with an index, an array target
//!   where the index is at most the length (equal appends).
//! - `remove` with a key is fine even when the key is absent; with an index
//!   it shifts later elements down and is an error out of bounds.
//! - `push` appends to arrays only.
//!
//! Writes that change nothing still run the full sequence. There is no
//! diffing short-circuit: an equal-value `set` validates, commits, and
//! persists like any other write.

use crate::error::{NookError, Result};
use crate::path::{step, Path, Segment};
use crate::validator::{Validation, Validator};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Receives each accepted root. May fail (an inline durable write reporting
/// an I/O error); the failure propagates out of the mutating call.
pub(crate) type CommitFn = Box<dyn FnMut(&Value) -> Result<()>>;

enum WriteOp {
    Set(Segment, Value),
    Remove(Segment),
    Push(Value),
}

struct Engine {
    root: Value,
    validator: Option<Box<dyn Validator>>,
    commit: CommitFn,
}

impl Engine {
    fn apply(&mut self, at: &Path, op: &WriteOp) -> Result<()> {
        // Simulate against a deep clone of the whole root.
        let mut candidate = self.root.clone();
        let target = at.resolve_mut(&mut candidate).ok_or_else(|| detached(at))?;
        apply_op(target, op, at)?;

        if let Some(validator) = &self.validator {
            match validator.validate(&candidate) {
                Validation::Accepted(_) => {}
                Validation::Rejected(reason) => {
                    return Err(NookError::ValidationRejected(reason));
                }
            }
        }

        // Accepted: the identical write against the live root cannot fail
        // structurally (same shape the simulation just succeeded on).
        let live = at.resolve_mut(&mut self.root).ok_or_else(|| detached(at))?;
        apply_op(live, op, at)?;

        let Engine {
            ref root,
            ref mut commit,
            ..
        } = *self;
        (commit)(root)
    }
}

fn detached(at: &Path) -> NookError {
    NookError::StructuralWrite(format!("{} no longer resolves in the root value", at))
}

fn apply_op(target: &mut Value, op: &WriteOp, at: &Path) -> Result<()> {
    match op {
        WriteOp::Set(Segment::Key(key), value) => match target {
            Value::Object(map) => {
                map.insert(key.clone(), value.clone());
                Ok(())
            }
            _ => Err(NookError::StructuralWrite(format!(
                "cannot set key \"{}\" on non-object at {}",
                key, at
            ))),
        },
        WriteOp::Set(Segment::Index(index), value) => match target {
            Value::Array(items) => {
                if *index < items.len() {
                    items[*index] = value.clone();
                    Ok(())
                } else if *index == items.len() {
                    items.push(value.clone());
                    Ok(())
                } else {
                    Err(NookError::StructuralWrite(format!(
                        "index {} out of bounds (len {}) at {}",
                        index,
                        items.len(),
                        at
                    )))
                }
            }
            _ => Err(NookError::StructuralWrite(format!(
                "cannot set index {} on non-array at {}",
                index, at
            ))),
        },
        WriteOp::Remove(Segment::Key(key)) => match target {
            Value::Object(map) => {
                // Removing an absent key is not an error.
                map.remove(key);
                Ok(())
            }
            _ => Err(NookError::StructuralWrite(format!(
                "cannot remove key \"{}\" from non-object at {}",
                key, at
            ))),
        },
        WriteOp::Remove(Segment::Index(index)) => match target {
            Value::Array(items) => {
                if *index < items.len() {
                    items.remove(*index);
                    Ok(())
                } else {
                    Err(NookError::StructuralWrite(format!(
                        "index {} out of bounds (len {}) at {}",
                        index,
                        items.len(),
                        at
                    )))
                }
            }
            _ => Err(NookError::StructuralWrite(format!(
                "cannot remove index {} from non-array at {}",
                index, at
            ))),
        },
        WriteOp::Push(value) => match target {
            Value::Array(items) => {
                items.push(value.clone());
                Ok(())
            }
            _ => Err(NookError::StructuralWrite(format!(
                "cannot push onto non-array at {}",
                at
            ))),
        },
    }
}

/// A view node. Children are held weakly: a view stays identity-stable for
/// as long as some handle to it is alive, and is rebuilt transparently after
/// all handles drop.
struct Node {
    link: Option<(Rc<Node>, Segment)>,
    children: RefCell<HashMap<Segment, Weak<Node>>>,
}

impl Node {
    fn path(&self) -> Path {
        let mut segments = Vec::new();
        let mut current = self;
        while let Some((parent, seg)) = &current.link {
            segments.push(seg.clone());
            current = parent.as_ref();
        }
        segments.reverse();
        Path::from_segments(segments)
    }
}

/// A tracked view of a (possibly nested) location in a managed root value.
///
/// Cheap to clone; clones address the same location and share identity.
pub struct Tracked {
    engine: Rc<RefCell<Engine>>,
    node: Rc<Node>,
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self {
            engine: Rc::clone(&self.engine),
            node: Rc::clone(&self.node),
        }
    }
}

impl Tracked {
    pub(crate) fn new_root(
        root: Value,
        validator: Option<Box<dyn Validator>>,
        commit: CommitFn,
    ) -> Self {
        Self {
            engine: Rc::new(RefCell::new(Engine {
                root,
                validator,
                commit,
            })),
            node: Rc::new(Node {
                link: None,
                children: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// A detached deep copy of whatever this view's path currently
    /// addresses, or `None` when the path no longer resolves. After a
    /// structural change elsewhere, that can be a different value than the
    /// one the view was created over, including a scalar.
    pub fn snapshot(&self) -> Option<Value> {
        let engine = self.engine.borrow();
        self.node.path().resolve(&engine.root).cloned()
    }

    /// A detached deep copy of one child value (scalar or composite), or
    /// `None` when absent.
    pub fn get(&self, seg: impl Into<Segment>) -> Option<Value> {
        let seg = seg.into();
        let engine = self.engine.borrow();
        let here = self.node.path().resolve(&engine.root)?;
        step(here, &seg).cloned()
    }

    /// Descend into a composite child, returning a view of it.
    ///
    /// The view is cached per segment: descending the same way twice while
    /// the first handle is alive yields the same node (see
    /// [`Tracked::ptr_eq`]). Scalar and absent children cannot be viewed.
    pub fn child(&self, seg: impl Into<Segment>) -> Result<Tracked> {
        let seg = seg.into();
        {
            let engine = self.engine.borrow();
            let base = self.node.path();
            let here = base
                .resolve(&engine.root)
                .ok_or_else(|| detached(&base))?;
            match step(here, &seg) {
                Some(v) if v.is_object() || v.is_array() => {}
                Some(_) => {
                    return Err(NookError::StructuralWrite(format!(
                        "cannot view scalar at {}{}",
                        base, seg
                    )))
                }
                None => {
                    return Err(NookError::StructuralWrite(format!(
                        "nothing at {}{}",
                        base, seg
                    )))
                }
            }
        }

        let mut children = self.node.children.borrow_mut();
        if let Some(existing) = children.get(&seg).and_then(Weak::upgrade) {
            return Ok(Tracked {
                engine: Rc::clone(&self.engine),
                node: existing,
            });
        }
        let node = Rc::new(Node {
            link: Some((Rc::clone(&self.node), seg.clone())),
            children: RefCell::new(HashMap::new()),
        });
        children.insert(seg, Rc::downgrade(&node));
        Ok(Tracked {
            engine: Rc::clone(&self.engine),
            node,
        })
    }

    /// Set a child of this view. See the module docs for the shape rules.
    pub fn set(&self, seg: impl Into<Segment>, value: impl Into<Value>) -> Result<()> {
        self.engine
            .borrow_mut()
            .apply(&self.node.path(), &WriteOp::Set(seg.into(), value.into()))
    }

    /// Remove a child of this view.
    pub fn remove(&self, seg: impl Into<Segment>) -> Result<()> {
        self.engine
            .borrow_mut()
            .apply(&self.node.path(), &WriteOp::Remove(seg.into()))
    }

    /// Append to the array this view addresses.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        self.engine
            .borrow_mut()
            .apply(&self.node.path(), &WriteOp::Push(value.into()))
    }

    /// Element count for arrays, key count for objects. Scalars and views
    /// whose path no longer resolves also report 0; use [`Tracked::snapshot`]
    /// to distinguish an empty composite from a missing or scalar one.
    pub fn len(&self) -> usize {
        match self.snapshot() {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(map)) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two handles are views of the same node.
    pub fn ptr_eq(a: &Tracked, b: &Tracked) -> bool {
        Rc::ptr_eq(&a.node, &b.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validation;
    use serde_json::json;

    type CommitLog = Rc<RefCell<Vec<Value>>>;

    fn tracked(root: Value, validator: Option<Box<dyn Validator>>) -> (Tracked, CommitLog) {
        let log: CommitLog = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let view = Tracked::new_root(
            root,
            validator,
            Box::new(move |v| {
                sink.borrow_mut().push(v.clone());
                Ok(())
            }),
        );
        (view, log)
    }

    fn all_strings(candidate: &Value) -> Validation {
        match candidate.as_array() {
            Some(items) if items.iter().all(|v| v.is_string()) => {
                Validation::Accepted(candidate.clone())
            }
            _ => Validation::Rejected("expected an array of strings".to_string()),
        }
    }

    #[test]
    fn test_set_key_commits_new_root() {
        let (view, log) = tracked(json!({"a": 1}), None);
        view.set("b", 2).unwrap();

        assert_eq!(view.snapshot().unwrap(), json!({"a": 1, "b": 2}));
        assert_eq!(log.borrow().as_slice(), &[json!({"a": 1, "b": 2})]);
    }

    #[test]
    fn test_push_appends() {
        let (view, log) = tracked(json!([]), None);
        view.push("a").unwrap();
        view.push("b").unwrap();

        assert_eq!(view.snapshot().unwrap(), json!(["a", "b"]));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_nested_child_write() {
        let (root, log) = tracked(json!({"users": [{"name": "ada"}]}), None);
        let first = root.child("users").unwrap().child(0).unwrap();
        first.set("name", "grace").unwrap();

        assert_eq!(
            root.snapshot().unwrap(),
            json!({"users": [{"name": "grace"}]})
        );
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_set_index_replaces_and_appends() {
        let (view, _log) = tracked(json!(["a", "b"]), None);
        view.set(1, "B").unwrap();
        view.set(2, "c").unwrap();
        assert_eq!(view.snapshot().unwrap(), json!(["a", "B", "c"]));
    }

    #[test]
    fn test_remove_key_and_absent_key() {
        let (view, log) = tracked(json!({"a": 1, "b": 2}), None);
        view.remove("a").unwrap();
        view.remove("missing").unwrap();

        assert_eq!(view.snapshot().unwrap(), json!({"b": 2}));
        // The absent-key delete still ran the full sequence.
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_remove_index_shifts() {
        let (view, _log) = tracked(json!(["a", "b", "c"]), None);
        view.remove(1).unwrap();
        assert_eq!(view.snapshot().unwrap(), json!(["a", "c"]));
    }

    #[test]
    fn test_structural_errors() {
        let (arr, _log) = tracked(json!(["a"]), None);
        assert!(matches!(
            arr.set("key", 1),
            Err(NookError::StructuralWrite(_))
        ));
        assert!(matches!(arr.set(5, 1), Err(NookError::StructuralWrite(_))));
        assert!(matches!(arr.remove(5), Err(NookError::StructuralWrite(_))));

        let (obj, _log) = tracked(json!({"a": 1}), None);
        assert!(matches!(obj.push(1), Err(NookError::StructuralWrite(_))));
        assert!(matches!(
            obj.child("a"),
            Err(NookError::StructuralWrite(_))
        ));
        assert!(matches!(
            obj.child("missing"),
            Err(NookError::StructuralWrite(_))
        ));
    }

    #[test]
    fn test_validation_rejection_leaves_everything_untouched() {
        let (view, log) = tracked(json!(["x"]), Some(Box::new(all_strings)));
        view.push("y").unwrap();

        let err = view.push(123).unwrap_err();
        assert!(matches!(err, NookError::ValidationRejected(_)));
        assert_eq!(view.snapshot().unwrap(), json!(["x", "y"]));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_noop_write_still_commits() {
        let (view, log) = tracked(json!({"a": 1}), None);
        view.set("a", 1).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_identity_is_stable_between_mutations() {
        let (root, _log) = tracked(json!({"inner": {"deep": []}}), None);
        let a = root.child("inner").unwrap();
        let b = root.child("inner").unwrap();
        assert!(Tracked::ptr_eq(&a, &b));

        let deep_a = a.child("deep").unwrap();
        let deep_b = b.child("deep").unwrap();
        assert!(Tracked::ptr_eq(&deep_a, &deep_b));

        // Mutating does not invalidate identity of still-resolving views.
        deep_a.push(1).unwrap();
        let deep_c = root.child("inner").unwrap().child("deep").unwrap();
        assert!(Tracked::ptr_eq(&deep_a, &deep_c));
    }

    #[test]
    fn test_stale_view_reads_through_its_path() {
        let (root, _log) = tracked(json!({"list": [1]}), None);
        let list = root.child("list").unwrap();
        root.set("list", json!(null)).unwrap();

        // The path still resolves, so the view reads the replacement value,
        // but the array write now fails structurally.
        assert_eq!(list.snapshot(), Some(json!(null)));
        assert!(matches!(list.push(2), Err(NookError::StructuralWrite(_))));
        // The failed write changed nothing.
        assert_eq!(root.snapshot().unwrap(), json!({"list": null}));
    }

    #[test]
    fn test_detached_view_after_removal() {
        let (root, _log) = tracked(json!({"list": [1]}), None);
        let list = root.child("list").unwrap();
        root.remove("list").unwrap();

        // The path no longer resolves at all.
        assert_eq!(list.snapshot(), None);
        assert_eq!(list.get(0), None);
        assert!(matches!(list.push(2), Err(NookError::StructuralWrite(_))));
        assert_eq!(root.snapshot().unwrap(), json!({}));
    }

    #[test]
    fn test_commit_failure_propagates() {
        let view = Tracked::new_root(
            json!([]),
            None,
            Box::new(|_| Err(NookError::Store("write failed".to_string()))),
        );
        assert!(matches!(view.push(1), Err(NookError::Store(_))));
    }

    #[test]
    fn test_len_and_get() {
        let (view, _log) = tracked(json!({"a": 1, "b": [1, 2, 3]}), None);
        assert_eq!(view.len(), 2);
        assert_eq!(view.get("a"), Some(json!(1)));
        assert_eq!(view.get("missing"), None);
        assert_eq!(view.child("b").unwrap().len(), 3);
    }

    #[test]
    fn test_len_collapses_scalars_and_detached_views_to_zero() {
        let (root, _log) = tracked(json!({"list": []}), None);
        let list = root.child("list").unwrap();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());

        // A scalar replacement and a removed entry read the same way; only
        // snapshot() tells them apart.
        root.set("list", 7).unwrap();
        assert_eq!(list.len(), 0);
        assert_eq!(list.snapshot(), Some(json!(7)));

        root.remove("list").unwrap();
        assert_eq!(list.len(), 0);
        assert_eq!(list.snapshot(), None);
    }
}
