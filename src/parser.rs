//! Parser handles.

use crate::engine::RawParser;
use crate::error::{RdfError, RdfResult};
use crate::model::Model;
use crate::uri::Uri;
use crate::world::World;

/// A parser appending triples read from a source into a model.
///
/// `name` is an engine-registered grammar name (`"rdfxml"`, `"turtle"`,
/// ...); [`World::guess_parser_name`] can pick one for a URI.
pub struct Parser {
    world: World,
    raw: Option<RawParser>,
    name: String,
}

impl Parser {
    pub fn new(world: &World, name: &str, mime_type: Option<&str>) -> RdfResult<Parser> {
        let raw = world
            .engine()
            .parser_create(world.raw()?, name, mime_type)
            .ok_or(RdfError::Allocation { what: "parser" })?;
        Ok(Parser {
            world: world.clone(),
            raw: Some(raw),
            name: name.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse the content at `uri` into `model`.
    pub fn parse_uri_into_model(
        &self,
        uri: &Uri,
        base: Option<&Uri>,
        model: &mut Model,
    ) -> RdfResult<()> {
        let base_raw = base.map(|u| u.raw()).transpose()?;
        let rc = self.world.engine().parser_parse_uri_into_model(
            self.raw()?,
            uri.raw()?,
            base_raw,
            model.raw()?,
        );
        if rc != 0 {
            return Err(RdfError::operation("parse uri", "engine failed to parse"));
        }
        Ok(())
    }

    /// Parse `text` into `model`.
    pub fn parse_string_into_model(
        &self,
        text: &str,
        base: Option<&Uri>,
        model: &mut Model,
    ) -> RdfResult<()> {
        let base_raw = base.map(|u| u.raw()).transpose()?;
        let rc = self.world.engine().parser_parse_string_into_model(
            self.raw()?,
            text,
            base_raw,
            model.raw()?,
        );
        if rc != 0 {
            return Err(RdfError::operation("parse string", "engine failed to parse"));
        }
        Ok(())
    }

    /// Release the native parser. Idempotent.
    pub fn free(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().parser_free(raw);
        }
    }

    fn raw(&self) -> RdfResult<RawParser> {
        self.raw.ok_or(RdfError::UseAfterRelease { what: "parser" })
    }
}

impl Drop for Parser {
    fn drop(&mut self) {
        self.free();
    }
}
