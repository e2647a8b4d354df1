//! Construction frames for cycle detection.
//!
//! A frame lives on the stack of the resolving call and points at its parent,
//! so the chain from the root request to the current construction is a
//! linked list that needs no thread-local state and no allocation.

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// One key under construction.
pub(crate) struct ConstructionFrame<'a> {
    key: Key,
    parent: Option<&'a ConstructionFrame<'a>>,
    depth: usize,
}

impl<'a> ConstructionFrame<'a> {
    /// Pushes `key` below `parent`.
    ///
    /// Fails with `CircularDependency` when `key` is already under
    /// construction in this chain, and with `DepthExceeded` past `max_depth`.
    pub(crate) fn enter(parent: Option<&'a ConstructionFrame<'a>>, key: &Key, max_depth: usize) -> DiResult<Self> {
        let depth = parent.map_or(1, |p| p.depth + 1);
        if let Some(parent) = parent {
            if parent.contains(key) {
                let mut chain = parent.chain();
                chain.push(key.clone());
                return Err(DiError::CircularDependency(chain));
            }
        }
        if depth > max_depth {
            return Err(DiError::DepthExceeded(max_depth));
        }
        Ok(Self {
            key: key.clone(),
            parent,
            depth,
        })
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    fn ancestors(&self) -> impl Iterator<Item = &ConstructionFrame<'a>> {
        std::iter::successors(Some(self), |frame| frame.parent)
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.ancestors().any(|frame| &frame.key == key)
    }

    /// Keys from the root request down to this frame.
    pub(crate) fn chain(&self) -> Vec<Key> {
        let mut chain: Vec<Key> = self.ancestors().map(|frame| frame.key.clone()).collect();
        chain.reverse();
        chain
    }
}
