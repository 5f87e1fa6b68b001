//! Serializer handles.

use crate::engine::RawSerializer;
use crate::error::{RdfError, RdfResult};
use crate::model::Model;
use crate::uri::Uri;
use crate::world::World;

/// A serializer rendering a model's triples into a formatted string.
/// `name` is an engine-registered format name (`"rdfxml"`, `"ntriples"`,
/// ...).
pub struct Serializer {
    world: World,
    raw: Option<RawSerializer>,
}

impl Serializer {
    pub fn new(
        world: &World,
        name: &str,
        mime_type: Option<&str>,
        type_uri: Option<&Uri>,
    ) -> RdfResult<Serializer> {
        let type_raw = type_uri.map(|u| u.raw()).transpose()?;
        let raw = world
            .engine()
            .serializer_create(world.raw()?, name, mime_type, type_raw)
            .ok_or(RdfError::Allocation { what: "serializer" })?;
        Ok(Serializer {
            world: world.clone(),
            raw: Some(raw),
        })
    }

    /// Render the whole model to a string, resolving against `base` when
    /// given. Synchronous and single-shot.
    pub fn serialize_model_to_string(
        &self,
        model: &Model,
        base: Option<&Uri>,
    ) -> RdfResult<String> {
        let base_raw = base.map(|u| u.raw()).transpose()?;
        self.world
            .engine()
            .serializer_model_to_string(self.raw()?, base_raw, model.raw()?)
            .ok_or_else(|| RdfError::operation("serialize model", "engine produced no output"))
    }

    /// Release the native serializer. Idempotent.
    pub fn free(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().serializer_free(raw);
        }
    }

    pub(crate) fn raw(&self) -> RdfResult<RawSerializer> {
        self.raw.ok_or(RdfError::UseAfterRelease {
            what: "serializer",
        })
    }
}

impl Drop for Serializer {
    fn drop(&mut self) {
        self.free();
    }
}
