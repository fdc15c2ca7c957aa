//! In-memory transform graph
//!
//! Every frame has at most one parent. A transform between two frames is
//! composed by walking both frames up to their common root.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::time::Duration;
use nalgebra::Isometry3;

use super::{FrameError, TransformLookup};

/// Transform graph keyed by child frame name
#[derive(Debug, Clone, Default)]
pub struct FrameTree {
    /// child -> (parent, pose of child in parent)
    parents: BTreeMap<String, (String, Isometry3<f64>)>,
}

impl FrameTree {
    /// Create an empty frame tree
    pub fn new() -> Self {
        Self {
            parents: BTreeMap::new(),
        }
    }

    /// Set (or replace) the pose of `child` expressed in `parent`
    pub fn set_transform(
        &mut self,
        parent: &str,
        child: &str,
        child_in_parent: Isometry3<f64>,
    ) -> Result<(), FrameError> {
        if parent.is_empty() || child.is_empty() {
            return Err(FrameError::EmptyFrameId);
        }

        // Reject if child is already an ancestor of parent (or the same frame)
        let mut cursor = parent;
        loop {
            if cursor == child {
                return Err(FrameError::Cycle {
                    parent: parent.to_string(),
                    child: child.to_string(),
                });
            }
            match self.parents.get(cursor) {
                Some((next, _)) => cursor = next.as_str(),
                None => break,
            }
        }

        self.parents
            .insert(child.to_string(), (parent.to_string(), child_in_parent));
        Ok(())
    }

    /// Remove a frame's link to its parent
    ///
    /// Children of the removed frame stay attached to it, so they become
    /// a separate tree rooted at `child`.
    pub fn remove_transform(&mut self, child: &str) -> bool {
        self.parents.remove(child).is_some()
    }

    /// Check if a frame appears anywhere in the graph
    pub fn contains(&self, frame: &str) -> bool {
        self.parents.contains_key(frame) || self.parents.values().any(|(p, _)| p == frame)
    }

    /// Number of parent links
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// True if no transform has been set
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Walk to the root; returns (root, pose of frame in root)
    fn to_root<'a>(&'a self, frame: &'a str) -> (&'a str, Isometry3<f64>) {
        let mut transform = Isometry3::identity();
        let mut cursor = frame;
        while let Some((parent, child_in_parent)) = self.parents.get(cursor) {
            transform = child_in_parent * transform;
            cursor = parent.as_str();
        }
        (cursor, transform)
    }

    /// Transform mapping coordinates in `source` into `target`
    pub fn transform(&self, target: &str, source: &str) -> Result<Isometry3<f64>, FrameError> {
        if target.is_empty() || source.is_empty() {
            return Err(FrameError::EmptyFrameId);
        }
        for frame in [target, source] {
            if !self.contains(frame) {
                return Err(FrameError::UnknownFrame(frame.to_string()));
            }
        }
        if target == source {
            return Ok(Isometry3::identity());
        }

        let (target_root, target_in_root) = self.to_root(target);
        let (source_root, source_in_root) = self.to_root(source);
        if target_root != source_root {
            return Err(FrameError::Disconnected {
                target_frame: target.to_string(),
                source_frame: source.to_string(),
            });
        }

        Ok(target_in_root.inverse() * source_in_root)
    }
}

impl TransformLookup for FrameTree {
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        _timeout: Duration,
    ) -> Result<Isometry3<f64>, FrameError> {
        self.transform(target, source)
    }
}
