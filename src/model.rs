//! Model handles: a mutable RDF graph backed by one storage.

use tracing::debug;

use crate::engine::{RawModel, RawQueryResults, RawStream};
use crate::error::{RdfError, RdfResult};
use crate::node::Node;
use crate::query::{Query, QueryResultItem};
use crate::serializer::Serializer;
use crate::statement::Statement;
use crate::storage::Storage;
use crate::stream::cursor::{BindingsCursor, StatementCursor, TargetCursor};
use crate::stream::{self, ItemStream};
use crate::uri::Uri;
use crate::world::World;

/// A mutable RDF graph: a *set* of triples (duplicates collapse) backed by
/// exactly one [`Storage`], which must outlive the model.
///
/// Mutation is single-writer; coordinating concurrent access across tasks is
/// the caller's responsibility. The `find_*` and `execute_query` methods
/// spawn one producer task each and must be called within a Tokio runtime.
pub struct Model {
    world: World,
    raw: Option<RawModel>,
}

impl Model {
    /// Construct a model on `storage`. `options` is free-form engine
    /// configuration, usually empty.
    pub fn new(world: &World, storage: &Storage, options: &str) -> RdfResult<Model> {
        let raw = world
            .engine()
            .model_create(world.raw()?, storage.raw()?, options)
            .ok_or(RdfError::Allocation { what: "model" })?;
        Ok(Model {
            world: world.clone(),
            raw: Some(raw),
        })
    }

    /// Add a complete statement to the model. The statement is copied; the
    /// caller keeps ownership.
    pub fn add_statement(&mut self, statement: &Statement) -> RdfResult<()> {
        let rc = self
            .world
            .engine()
            .model_add_statement(self.raw()?, statement.raw()?);
        if rc != 0 {
            return Err(RdfError::operation(
                "add statement",
                "engine rejected the statement",
            ));
        }
        Ok(())
    }

    /// Remove a statement. Fails when the statement is not present.
    pub fn remove_statement(&mut self, statement: &Statement) -> RdfResult<()> {
        let rc = self
            .world
            .engine()
            .model_remove_statement(self.raw()?, statement.raw()?);
        if rc != 0 {
            return Err(RdfError::operation(
                "remove statement",
                "statement could not be removed",
            ));
        }
        Ok(())
    }

    /// Membership test for a complete statement.
    pub fn contains_statement(&self, statement: &Statement) -> RdfResult<bool> {
        Ok(self
            .world
            .engine()
            .model_contains_statement(self.raw()?, statement.raw()?))
    }

    /// Number of statements, when the storage can report it.
    pub fn size(&self) -> RdfResult<usize> {
        self.world
            .engine()
            .model_size(self.raw()?)
            .ok_or_else(|| RdfError::operation("model size", "storage cannot report a size"))
    }

    /// Parse the content at `uri` into the model, guessing the parser.
    pub fn load(&mut self, uri: &Uri) -> RdfResult<()> {
        let rc = self.world.engine().model_load(self.raw()?, uri.raw()?);
        if rc != 0 {
            return Err(RdfError::operation("model load", "engine failed to load uri"));
        }
        Ok(())
    }

    /// Serialize the whole model with the engine's default syntax (RDF/XML).
    pub fn to_rdf_string(&self, base: Option<&Uri>) -> RdfResult<String> {
        let base_raw = base.map(|u| u.raw()).transpose()?;
        self.world
            .engine()
            .model_to_string(self.raw()?, base_raw)
            .ok_or_else(|| RdfError::operation("model to string", "engine produced no output"))
    }

    /// Stream every statement matching `partial` (unset slots match
    /// anything), in engine order, through a channel of `capacity`.
    ///
    /// Dropping the returned stream before exhaustion cancels the producer
    /// task and releases the native cursor. A `capacity` of 0 still admits
    /// one in-flight item, the channel's tightest hand-off.
    pub fn find_statements(
        &self,
        partial: &Statement,
        capacity: usize,
    ) -> RdfResult<ItemStream<Statement>> {
        let raw = self
            .world
            .engine()
            .model_find_statements(self.raw()?, partial.raw()?);
        debug!(found_cursor = raw.is_some(), "find statements");
        let cursor = StatementCursor::new(self.world.clone(), raw);
        Ok(stream::stream(cursor, capacity))
    }

    /// Stream every object node of triples `(subject, predicate, ?)`.
    /// A `capacity` of 0 still admits one in-flight item, the channel's
    /// tightest hand-off.
    pub fn find_targets(
        &self,
        subject: &Node,
        predicate: &Node,
        capacity: usize,
    ) -> RdfResult<ItemStream<Node>> {
        let raw =
            self.world
                .engine()
                .model_get_targets(self.raw()?, subject.raw()?, predicate.raw()?);
        debug!(found_cursor = raw.is_some(), "find targets");
        let cursor = TargetCursor::new(self.world.clone(), raw);
        Ok(stream::stream(cursor, capacity))
    }

    /// Execute a binding query and stream its solution rows.
    ///
    /// An empty result set yields a stream that closes immediately with zero
    /// items; it is not an error. A boolean- or graph-shaped result is an
    /// [`RdfError::OperationFailed`]; render those with
    /// [`Model::execute_query_to_string`] instead. A `capacity` of 0 still
    /// admits one in-flight item, the channel's tightest hand-off.
    pub fn execute_query(
        &self,
        query: &Query,
        capacity: usize,
    ) -> RdfResult<ItemStream<QueryResultItem>> {
        let engine = self.world.engine();
        let raw = engine
            .model_execute_query(self.raw()?, query.raw()?)
            .ok_or_else(|| RdfError::operation("query execute", "engine returned no results"))?;
        if !engine.results_is_bindings(raw) {
            engine.results_free(raw);
            return Err(RdfError::operation(
                "query execute",
                "result is not binding-shaped",
            ));
        }
        let cursor = BindingsCursor::new(self.world.clone(), Some(raw));
        Ok(stream::stream(cursor, capacity))
    }

    /// Execute a query and render the whole result as one string in
    /// `format` (an engine-registered format name such as `"json"`).
    ///
    /// The rendering path is chosen by the result's declared shape:
    /// boolean- and binding-shaped results go through the engine's
    /// results-to-string transform, graph-shaped results through a
    /// serializer fed by the result's triple stream.
    pub fn execute_query_to_string(&self, query: &Query, format: &str) -> RdfResult<String> {
        let raw_model = self.raw()?;
        let engine = self.world.engine();
        let results = engine
            .model_execute_query(raw_model, query.raw()?)
            .ok_or_else(|| RdfError::operation("query execute", "engine returned no results"))?;
        let results = ResultsGuard {
            world: &self.world,
            raw: results,
        };

        if engine.results_is_bindings(results.raw) || engine.results_is_boolean(results.raw) {
            engine
                .results_to_string(results.raw, format, None)
                .ok_or_else(|| {
                    RdfError::operation("query results to string", "engine produced no output")
                })
        } else if engine.results_is_graph(results.raw) {
            let serializer = Serializer::new(&self.world, format, None, None)?;
            let triples = engine.results_as_stream(results.raw).ok_or_else(|| {
                RdfError::operation("query results as stream", "engine produced no stream")
            })?;
            let triples = StreamGuard {
                world: &self.world,
                raw: triples,
            };
            engine
                .serializer_stream_to_string(serializer.raw()?, None, triples.raw)
                .ok_or_else(|| {
                    RdfError::operation("serialize query results", "engine produced no output")
                })
        } else {
            Err(RdfError::operation(
                "query execute",
                "result has unknown shape",
            ))
        }
    }

    /// Release the native model. Idempotent. The backing storage is
    /// released separately by its own handle.
    pub fn free(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().model_free(raw);
        }
    }

    pub(crate) fn raw(&self) -> RdfResult<RawModel> {
        self.raw.ok_or(RdfError::UseAfterRelease { what: "model" })
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        self.free();
    }
}

/// Scoped release for a query results handle used synchronously.
struct ResultsGuard<'a> {
    world: &'a World,
    raw: RawQueryResults,
}

impl Drop for ResultsGuard<'_> {
    fn drop(&mut self) {
        self.world.engine().results_free(self.raw);
    }
}

/// Scoped release for a statement stream used synchronously.
struct StreamGuard<'a> {
    world: &'a World,
    raw: RawStream,
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        self.world.engine().stream_free(self.raw);
    }
}
