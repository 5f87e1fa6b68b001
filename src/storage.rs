//! Storage backend handles.

use crate::engine::RawStorage;
use crate::error::{RdfError, RdfResult};
use crate::world::World;

/// A persistence backend for models.
///
/// `kind` selects an engine-registered backend (`"memory"`, `"hashes"`,
/// `"file"`, ...) and `options` is free-form backend configuration such as
/// `"hash-type='memory',dir='./data'"`, passed through uninterpreted. A
/// storage must outlive every model built on it.
#[derive(Debug)]
pub struct Storage {
    world: World,
    raw: Option<RawStorage>,
}

impl Storage {
    pub fn new(world: &World, kind: &str, name: &str, options: &str) -> RdfResult<Storage> {
        let raw = world
            .engine()
            .storage_create(world.raw()?, kind, name, options)
            .ok_or(RdfError::Allocation { what: "storage" })?;
        Ok(Storage {
            world: world.clone(),
            raw: Some(raw),
        })
    }

    /// Release the native storage. Idempotent.
    pub fn free(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().storage_free(raw);
        }
    }

    pub(crate) fn raw(&self) -> RdfResult<RawStorage> {
        self.raw.ok_or(RdfError::UseAfterRelease { what: "storage" })
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        self.free();
    }
}
