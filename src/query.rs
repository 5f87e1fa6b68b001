//! Query handles and result rows.

use std::fmt;

use indexmap::IndexMap;

use crate::engine::RawQuery;
use crate::error::{RdfError, RdfResult};
use crate::node::Node;
use crate::uri::Uri;
use crate::world::World;

/// A compiled query: an immutable (dialect, text) pair prepared by the
/// native engine, run against exactly one model at a time.
///
/// `dialect` is an engine-registered language name (`"sparql"`, `"rdql"`,
/// ...), not validated by this layer.
pub struct Query {
    world: World,
    raw: Option<RawQuery>,
    dialect: String,
    text: String,
}

impl Query {
    pub fn new(world: &World, dialect: &str, text: &str, base: Option<&Uri>) -> RdfResult<Query> {
        let base_raw = base.map(|u| u.raw()).transpose()?;
        let raw = world
            .engine()
            .query_create(world.raw()?, dialect, text, base_raw)
            .ok_or(RdfError::Allocation { what: "query" })?;
        Ok(Query {
            world: world.clone(),
            raw: Some(raw),
            dialect: dialect.to_owned(),
            text: text.to_owned(),
        })
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Release the native query. Idempotent.
    pub fn free(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().query_free(raw);
        }
    }

    pub(crate) fn raw(&self) -> RdfResult<RawQuery> {
        self.raw.ok_or(RdfError::UseAfterRelease { what: "query" })
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("dialect", &self.dialect)
            .field("text", &self.text)
            .finish()
    }
}

impl Drop for Query {
    fn drop(&mut self) {
        self.free();
    }
}

/// One solution row of a binding query: ordered (variable, node) pairs.
///
/// Pair order follows the binding declaration order reported by the engine.
/// Variables the engine left unbound in this row are absent. A row may be
/// empty; an empty row is still a row and is delivered, not skipped.
#[derive(Debug)]
pub struct QueryResultItem {
    bindings: IndexMap<String, Node>,
}

impl QueryResultItem {
    pub(crate) fn new(bindings: IndexMap<String, Node>) -> QueryResultItem {
        QueryResultItem { bindings }
    }

    /// The bound value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.bindings.get(name)
    }

    /// Variable names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// (variable, node) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
