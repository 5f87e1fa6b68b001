//! The execution environment wrapping one native engine world.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::engine::{NativeEngine, RawWorld};
use crate::error::{RdfError, RdfResult};
use crate::node::Node;
use crate::uri::Uri;

/// A Redland execution environment.
///
/// Exactly one native world backs each `World`; every other handle in the
/// crate is created from one and keeps a cheap clone of it, so the native
/// world outlives its children unless [`World::close`] is called early.
/// `World` is cheap to clone (it shares the same underlying world).
///
/// Two teardown paths coexist: an explicit, idempotent [`close`](World::close)
/// and an automatic release when the last clone is dropped. Using any child
/// handle after the world is closed fails with
/// [`RdfError::UseAfterRelease`].
#[derive(Clone)]
pub struct World {
    inner: Arc<WorldInner>,
}

struct WorldInner {
    engine: Arc<dyn NativeEngine>,
    raw: Mutex<Option<RawWorld>>,
}

impl World {
    /// Open a world backed by the linked system librdf.
    #[cfg(feature = "redland")]
    pub fn open() -> RdfResult<World> {
        World::open_with(crate::engine::redland::RedlandEngine::shared())
    }

    /// Open a world backed by the given engine implementation.
    pub fn open_with(engine: Arc<dyn NativeEngine>) -> RdfResult<World> {
        let raw = engine
            .world_create()
            .ok_or(RdfError::Allocation { what: "world" })?;
        engine.world_open(raw);
        debug!("world opened");

        Ok(World {
            inner: Arc::new(WorldInner {
                engine,
                raw: Mutex::new(Some(raw)),
            }),
        })
    }

    /// Whether the world is still open.
    pub fn is_open(&self) -> bool {
        self.lock_raw().is_some()
    }

    /// Release the native world.
    ///
    /// Idempotent; repeated calls are no-ops. Must only be called once every
    /// child handle has been released: operations on surviving children fail
    /// with [`RdfError::UseAfterRelease`] afterwards, but native teardown
    /// ordering is the caller's responsibility.
    pub fn close(&self) {
        let taken = self
            .inner
            .raw
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(raw) = taken {
            self.inner.engine.world_free(raw);
            debug!("world closed");
        }
    }

    /// Ask the engine to guess a parser name for content at `uri`.
    ///
    /// Returns `Ok(None)` when the engine has no opinion.
    pub fn guess_parser_name(&self, uri: &Uri) -> RdfResult<Option<String>> {
        let raw = self.raw()?;
        Ok(self.engine().world_guess_parser_name(raw, uri.raw()?))
    }

    /// Set an engine feature (identified by URI) to `value`. The node is
    /// copied; the caller keeps ownership.
    pub fn set_feature(&self, feature: &Uri, value: &Node) -> RdfResult<()> {
        let raw = self.raw()?;
        let rc = self
            .engine()
            .world_set_feature(raw, feature.raw()?, value.raw()?);
        if rc != 0 {
            return Err(RdfError::operation(
                "set world feature",
                "engine rejected the feature",
            ));
        }
        Ok(())
    }

    /// The current value of an engine feature, when one is set.
    pub fn feature(&self, feature: &Uri) -> RdfResult<Option<Node>> {
        let raw = self.raw()?;
        Ok(self
            .engine()
            .world_get_feature(raw, feature.raw()?)
            .map(|n| Node::from_raw(self.clone(), n)))
    }

    /// Select the engine's content digest algorithm by name (`"MD5"`,
    /// `"SHA1"`, ...), validated only by the engine.
    pub fn set_digest(&self, name: &str) -> RdfResult<()> {
        self.engine().world_set_digest(self.raw()?, name);
        Ok(())
    }

    pub(crate) fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.inner.engine
    }

    pub(crate) fn raw(&self) -> RdfResult<RawWorld> {
        self.lock_raw()
            .ok_or(RdfError::UseAfterRelease { what: "world" })
    }

    fn lock_raw(&self) -> Option<RawWorld> {
        *self.inner.raw.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for WorldInner {
    fn drop(&mut self) {
        // Fallback release for callers that never closed explicitly.
        if let Some(raw) = self.raw.lock().unwrap_or_else(|e| e.into_inner()).take() {
            self.engine.world_free(raw);
            debug!("world released on drop");
        }
    }
}
