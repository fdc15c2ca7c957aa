//! Thread-safe frame tree
//!
//! Publishers (localization, the simulator) and behaviors share one
//! [`SharedFrameTree`]. Lookups of transforms that are not available yet
//! block the calling thread until they are published or the timeout
//! expires, so call them from a blocking context.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use aerial_behaviors_core::frames::{FrameError, FrameTree, TransformLookup};
use nalgebra::Isometry3;

/// Frame tree shared between publishers and behaviors
#[derive(Clone, Default)]
pub struct SharedFrameTree {
    inner: Arc<(Mutex<FrameTree>, Condvar)>,
}

impl SharedFrameTree {
    /// Create an empty shared tree
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrameTree> {
        self.inner.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish (or replace) the pose of `child` in `parent` and wake waiters
    pub fn set_transform(
        &self,
        parent: &str,
        child: &str,
        child_in_parent: Isometry3<f64>,
    ) -> Result<(), FrameError> {
        self.lock().set_transform(parent, child, child_in_parent)?;
        self.inner.1.notify_all();
        Ok(())
    }

    /// Remove a frame's link to its parent
    pub fn remove_transform(&self, child: &str) -> bool {
        self.lock().remove_transform(child)
    }

    /// Current transform without waiting
    pub fn transform(&self, target: &str, source: &str) -> Result<Isometry3<f64>, FrameError> {
        self.lock().transform(target, source)
    }
}

impl TransformLookup for SharedFrameTree {
    /// Look up a transform, waiting up to `timeout` for it to appear
    ///
    /// A zero timeout returns the lookup error as is; otherwise an expired
    /// wait is reported as [`FrameError::Timeout`]. A timeout too large to
    /// form a deadline waits until the transform is published.
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        timeout: Duration,
    ) -> Result<Isometry3<f64>, FrameError> {
        let deadline = Instant::now().checked_add(timeout);
        let (_, available) = &*self.inner;
        let mut tree = self.lock();

        loop {
            let error = match tree.transform(target, source) {
                Ok(transform) => return Ok(transform),
                Err(FrameError::EmptyFrameId) => return Err(FrameError::EmptyFrameId),
                Err(e) => e,
            };

            tree = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        if timeout.is_zero() {
                            return Err(error);
                        }
                        log::debug!("Transform lookup timed out: {}", error);
                        return Err(FrameError::Timeout {
                            target_frame: target.to_string(),
                            source_frame: source.to_string(),
                            timeout,
                        });
                    }
                    available
                        .wait_timeout(tree, deadline - now)
                        .map(|(guard, _)| guard)
                        .unwrap_or_else(|poisoned| poisoned.into_inner().0)
                }
                None => available
                    .wait(tree)
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            };
        }
    }
}
