//! Per-call traversal state.
//!
//! [`TraversalContext`] owns the three stacks that make closures work:
//!
//! - the **lineage**: one random token per open object frame;
//! - the **detach lineage**: one flag per open object frame, pushed by the
//!   parent right before it descends and popped when the child closes;
//! - the **family tree**: for every open frame token, the detached ids seen
//!   below it and the detach-lineage length at which each was seen.
//!
//! When a frame closes, its family-tree entry shifted down by the remaining
//! detach-lineage length becomes its closure. A direct detached child
//! therefore has depth 1, a grandchild depth 2, and so on.

use std::collections::{BTreeMap, HashMap};

use spk_crypto::LineageToken;
use spk_types::{Closure, ObjectId, ObjectReference, Reference};

use crate::error::{TraverseError, TraverseResult};

/// Mutable state of one serialize call. Never shared between calls.
#[derive(Debug)]
pub struct TraversalContext {
    lineage: Vec<LineageToken>,
    detach_lineage: Vec<bool>,
    family_tree: HashMap<LineageToken, BTreeMap<ObjectId, u32>>,
    depth: usize,
    max_depth: usize,
    object_references: BTreeMap<String, ObjectReference>,
}

impl TraversalContext {
    pub fn new(max_depth: usize) -> Self {
        Self {
            lineage: Vec::new(),
            detach_lineage: Vec::new(),
            family_tree: HashMap::new(),
            depth: 0,
            max_depth,
            object_references: BTreeMap::new(),
        }
    }

    /// Drop every open frame and pending closure entry left by an aborted
    /// traversal. Reuse handles are kept.
    pub(crate) fn reset_frames(&mut self) {
        self.lineage.clear();
        self.detach_lineage.clear();
        self.family_tree.clear();
        self.depth = 0;
    }

    /// Announce whether the next opened frame is detached from its parent.
    pub fn push_detach(&mut self, detach: bool) {
        self.detach_lineage.push(detach);
    }

    /// Number of open object and array frames.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Enter a nested frame, enforcing the depth guard.
    pub(crate) fn enter(&mut self) -> TraverseResult<()> {
        if self.depth >= self.max_depth {
            return Err(TraverseError::DepthExceeded {
                depth: self.depth + 1,
                max: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Open an object frame. Returns its token and whether it is detached.
    pub(crate) fn open_frame(&mut self) -> TraverseResult<(LineageToken, bool)> {
        self.enter()?;
        let detached = *self.detach_lineage.last().ok_or_else(|| {
            TraverseError::Bookkeeping("detach lineage is empty when opening a frame".into())
        })?;
        let token = LineageToken::random();
        self.lineage.push(token);
        Ok((token, detached))
    }

    /// Close the frame opened with `token` and compute its closure.
    pub(crate) fn close_frame(&mut self, token: LineageToken) -> TraverseResult<Closure> {
        match self.lineage.pop() {
            Some(top) if top == token => {}
            Some(top) => {
                return Err(TraverseError::Bookkeeping(format!(
                    "closing frame {token} but {top} is on top of the lineage"
                )))
            }
            None => {
                return Err(TraverseError::Bookkeeping(format!(
                    "closing frame {token} with an empty lineage"
                )))
            }
        }
        self.detach_lineage.pop().ok_or_else(|| {
            TraverseError::Bookkeeping(format!("closing frame {token} with an empty detach lineage"))
        })?;
        let shift = self.detach_lineage_len();

        let mut closure = Closure::new();
        for (id, depth) in self.family_tree.remove(&token).unwrap_or_default() {
            let relative = depth.checked_sub(shift).ok_or_else(|| {
                TraverseError::Bookkeeping(format!(
                    "closure depth {depth} of {id} is shallower than its owner at {shift}"
                ))
            })?;
            closure.record_min(id, relative);
        }
        self.leave();
        Ok(closure)
    }

    /// Register `referenced_id` as a detached descendant of every open frame
    /// and return the stub that replaces it.
    pub fn detach_helper(&mut self, referenced_id: ObjectId) -> Reference {
        self.record(referenced_id, 0);
        Reference::new(referenced_id)
    }

    /// Like [`detach_helper`](Self::detach_helper) for an object sent by an
    /// earlier call: its own closure is threaded through first, each entry
    /// one closure-depth further down than the reference itself.
    pub fn detach_existing(&mut self, reference: &ObjectReference) -> Reference {
        for (id, depth) in &reference.closure {
            self.record(*id, *depth);
        }
        self.detach_helper(reference.referenced_id)
    }

    fn record(&mut self, id: ObjectId, extra: u32) {
        let depth = self.detach_lineage_len().saturating_add(extra);
        for token in &self.lineage {
            let seen = self.family_tree.entry(*token).or_default();
            seen.entry(id)
                .and_modify(|d| *d = (*d).min(depth))
                .or_insert(depth);
        }
    }

    fn detach_lineage_len(&self) -> u32 {
        u32::try_from(self.detach_lineage.len()).unwrap_or(u32::MAX)
    }

    pub(crate) fn record_object_reference(&mut self, application_id: String, reference: ObjectReference) {
        self.object_references.insert(application_id, reference);
    }

    /// Object references recorded so far, keyed by `applicationId`.
    pub fn object_references(&self) -> &BTreeMap<String, ObjectReference> {
        &self.object_references
    }

    pub fn into_object_references(self) -> BTreeMap<String, ObjectReference> {
        self.object_references
    }

    /// Check that every frame has been closed.
    pub(crate) fn ensure_settled(&self) -> TraverseResult<()> {
        if !self.lineage.is_empty() || !self.detach_lineage.is_empty() || self.depth != 0 {
            return Err(TraverseError::Bookkeeping(format!(
                "traversal finished with {} open frames, {} detach flags and depth {}",
                self.lineage.len(),
                self.detach_lineage.len(),
                self.depth
            )));
        }
        if !self.family_tree.is_empty() {
            return Err(TraverseError::Bookkeeping(format!(
                "traversal finished with {} unclaimed family-tree entries",
                self.family_tree.len()
            )));
        }
        Ok(())
    }
}
