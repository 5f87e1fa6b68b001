//! URI handles.

use std::cmp::Ordering;
use std::fmt;

use crate::engine::RawUri;
use crate::error::{RdfError, RdfResult};
use crate::world::World;

/// An immutable URI owning one native URI resource.
pub struct Uri {
    world: World,
    raw: Option<RawUri>,
}

impl Uri {
    /// Construct a URI from a string.
    pub fn new(world: &World, uri: &str) -> RdfResult<Uri> {
        let raw = world
            .engine()
            .uri_create(world.raw()?, uri)
            .ok_or(RdfError::Allocation { what: "uri" })?;
        Ok(Uri::from_raw(world.clone(), raw))
    }

    /// Construct a `file:` URI from a local filename.
    pub fn from_filename(world: &World, filename: &str) -> RdfResult<Uri> {
        let raw = world
            .engine()
            .uri_from_filename(world.raw()?, filename)
            .ok_or(RdfError::Allocation { what: "uri" })?;
        Ok(Uri::from_raw(world.clone(), raw))
    }

    /// Construct a URI by appending `local_name` to this URI.
    pub fn with_local_name(&self, local_name: &str) -> RdfResult<Uri> {
        let raw = self
            .world
            .engine()
            .uri_from_uri_local_name(self.raw()?, local_name)
            .ok_or(RdfError::Allocation { what: "uri" })?;
        Ok(Uri::from_raw(self.world.clone(), raw))
    }

    /// Construct a URI from `uri` resolved relative to this base URI.
    pub fn resolve(&self, uri: &str) -> RdfResult<Uri> {
        let raw = self
            .world
            .engine()
            .uri_relative_to_base(self.raw()?, uri)
            .ok_or(RdfError::Allocation { what: "uri" })?;
        Ok(Uri::from_raw(self.world.clone(), raw))
    }

    /// Construct a URI from `uri` normalised from `source` to `base`.
    pub fn normalized_to_base(uri: &str, source: &Uri, base: &Uri) -> RdfResult<Uri> {
        let raw = source
            .world
            .engine()
            .uri_normalized_to_base(uri, source.raw()?, base.raw()?)
            .ok_or(RdfError::Allocation { what: "uri" })?;
        Ok(Uri::from_raw(source.world.clone(), raw))
    }

    /// Copy this URI into a new independently owned handle.
    pub fn duplicate(&self) -> RdfResult<Uri> {
        let raw = self
            .world
            .engine()
            .uri_clone(self.raw()?)
            .ok_or(RdfError::Allocation { what: "uri" })?;
        Ok(Uri::from_raw(self.world.clone(), raw))
    }

    /// The URI as a string.
    pub fn as_string(&self) -> RdfResult<String> {
        self.world
            .engine()
            .uri_as_string(self.raw()?)
            .ok_or_else(|| RdfError::operation("uri to string", "engine returned no string"))
    }

    /// Convert a `file:` URI to a local filename.
    pub fn to_filename(&self) -> RdfResult<String> {
        self.world
            .engine()
            .uri_to_filename(self.raw()?)
            .ok_or_else(|| RdfError::operation("uri to filename", "not a file uri"))
    }

    /// Whether the URI names a local file.
    pub fn is_file_uri(&self) -> RdfResult<bool> {
        Ok(self.world.engine().uri_is_file_uri(self.raw()?))
    }

    /// Equality as decided by the native engine.
    pub fn equals(&self, other: &Uri) -> RdfResult<bool> {
        Ok(self.world.engine().uri_equals(self.raw()?, other.raw()?))
    }

    /// Three-way comparison as decided by the native engine.
    pub fn compare(&self, other: &Uri) -> RdfResult<Ordering> {
        let c = self.world.engine().uri_compare(self.raw()?, other.raw()?);
        Ok(c.cmp(&0))
    }

    /// Release the native URI. Idempotent.
    pub fn free(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().uri_free(raw);
        }
    }

    pub(crate) fn from_raw(world: World, raw: RawUri) -> Uri {
        Uri {
            world,
            raw: Some(raw),
        }
    }

    pub(crate) fn raw(&self) -> RdfResult<RawUri> {
        self.raw.ok_or(RdfError::UseAfterRelease { what: "uri" })
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_string() {
            Ok(s) => write!(f, "Uri({s})"),
            Err(_) => write!(f, "Uri(<released>)"),
        }
    }
}

impl Drop for Uri {
    fn drop(&mut self) {
        self.free();
    }
}
