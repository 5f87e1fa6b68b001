//! Cursor adapters wrapping the engine's pull-style iterators.
//!
//! Each adapter owns one native cursor resource and releases it exactly once
//! on drop, whether or not iteration reached natural exhaustion. A `None`
//! native cursor at construction is a legal empty result and behaves as an
//! immediately exhausted cursor. A null item *mid-iteration* violates the
//! engine contract and surfaces as [`RdfError::StreamFault`].

use indexmap::IndexMap;

use crate::engine::{RawIterator, RawQueryResults, RawStream};
use crate::error::{RdfError, RdfResult};
use crate::node::Node;
use crate::query::QueryResultItem;
use crate::statement::Statement;
use crate::world::World;

/// The has-next / current / advance contract over a native pull-iterator.
///
/// `current` copies the engine's borrowed item out into an independently
/// owned value; borrowed handles never escape the adapter.
pub(crate) trait Cursor: Send + 'static {
    type Item: Send + 'static;

    fn is_exhausted(&mut self) -> bool;
    fn current(&mut self) -> RdfResult<Self::Item>;
    fn advance(&mut self);
}

/// Cursor over a native statement stream.
pub(crate) struct StatementCursor {
    world: World,
    raw: Option<RawStream>,
}

impl StatementCursor {
    pub(crate) fn new(world: World, raw: Option<RawStream>) -> StatementCursor {
        StatementCursor { world, raw }
    }
}

impl Cursor for StatementCursor {
    type Item = Statement;

    fn is_exhausted(&mut self) -> bool {
        match self.raw {
            Some(raw) => self.world.engine().stream_end(raw),
            None => true,
        }
    }

    fn current(&mut self) -> RdfResult<Statement> {
        let raw = self
            .raw
            .ok_or_else(|| RdfError::fault("statement stream read past exhaustion"))?;
        let borrowed = self
            .world
            .engine()
            .stream_current(raw)
            .ok_or_else(|| RdfError::fault("engine returned null statement mid-stream"))?;
        let owned = self
            .world
            .engine()
            .statement_clone(borrowed)
            .ok_or(RdfError::Allocation { what: "statement" })?;
        Ok(Statement::from_raw(self.world.clone(), owned))
    }

    fn advance(&mut self) {
        if let Some(raw) = self.raw {
            self.world.engine().stream_next(raw);
        }
    }
}

impl Drop for StatementCursor {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().stream_free(raw);
        }
    }
}

/// Cursor over a native node iterator (model target lookup).
pub(crate) struct TargetCursor {
    world: World,
    raw: Option<RawIterator>,
}

impl TargetCursor {
    pub(crate) fn new(world: World, raw: Option<RawIterator>) -> TargetCursor {
        TargetCursor { world, raw }
    }
}

impl Cursor for TargetCursor {
    type Item = Node;

    fn is_exhausted(&mut self) -> bool {
        match self.raw {
            Some(raw) => self.world.engine().iterator_end(raw),
            None => true,
        }
    }

    fn current(&mut self) -> RdfResult<Node> {
        let raw = self
            .raw
            .ok_or_else(|| RdfError::fault("target iterator read past exhaustion"))?;
        let borrowed = self
            .world
            .engine()
            .iterator_current(raw)
            .ok_or_else(|| RdfError::fault("engine returned null node mid-iteration"))?;
        let owned = self
            .world
            .engine()
            .node_clone(borrowed)
            .ok_or(RdfError::Allocation { what: "node" })?;
        Ok(Node::from_raw(self.world.clone(), owned))
    }

    fn advance(&mut self) {
        if let Some(raw) = self.raw {
            self.world.engine().iterator_next(raw);
        }
    }
}

impl Drop for TargetCursor {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().iterator_free(raw);
        }
    }
}

/// Cursor over binding rows of a query result.
///
/// A row for which the engine reports zero bindings is a legitimate,
/// distinct result row and is yielded as an empty item rather than skipped.
/// Variables the engine leaves unbound in a row are omitted from that row's
/// bindings.
pub(crate) struct BindingsCursor {
    world: World,
    raw: Option<RawQueryResults>,
}

impl BindingsCursor {
    pub(crate) fn new(world: World, raw: Option<RawQueryResults>) -> BindingsCursor {
        BindingsCursor { world, raw }
    }
}

impl Cursor for BindingsCursor {
    type Item = QueryResultItem;

    fn is_exhausted(&mut self) -> bool {
        match self.raw {
            Some(raw) => self.world.engine().results_finished(raw),
            None => true,
        }
    }

    fn current(&mut self) -> RdfResult<QueryResultItem> {
        let raw = self
            .raw
            .ok_or_else(|| RdfError::fault("query results read past exhaustion"))?;
        let engine = self.world.engine();
        let count = engine
            .results_bindings_count(raw)
            .ok_or_else(|| RdfError::fault("engine reported no bindings count"))?;

        let mut bindings = IndexMap::with_capacity(count);
        for index in 0..count {
            let name = engine
                .results_binding_name(raw, index)
                .ok_or_else(|| RdfError::fault("engine returned null binding name"))?;
            // An unbound variable yields no value for this row.
            if let Some(node) = engine.results_binding_value(raw, index) {
                bindings.insert(name, Node::from_raw(self.world.clone(), node));
            }
        }
        Ok(QueryResultItem::new(bindings))
    }

    fn advance(&mut self) {
        if let Some(raw) = self.raw {
            self.world.engine().results_next(raw);
        }
    }
}

impl Drop for BindingsCursor {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().results_free(raw);
        }
    }
}
