//! The narrow call surface of the native RDF engine.
//!
//! The binding delegates all RDF semantics (storage, parsing grammars, SPARQL
//! execution, serialization formats) to an engine reached through the
//! [`NativeEngine`] trait. The trait mirrors the librdf C call surface one
//! method per native function: nullable returns become `Option`, C status
//! codes stay `i32`, and every handle crossing the boundary is an opaque raw
//! token. Ownership is *not* tracked here; the safe wrapper types own raw
//! handles and decide when the matching `*_free` call happens.
//!
//! The production implementation ([`redland::RedlandEngine`], cargo feature
//! `redland`) forwards each method to librdf over FFI. The test suite drives
//! the same trait with a scripted in-memory double.

#[cfg(feature = "redland")]
pub mod redland;

macro_rules! raw_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub usize);
    };
}

raw_handle!(
    /// Raw world (execution environment) handle.
    RawWorld
);
raw_handle!(
    /// Raw URI handle.
    RawUri
);
raw_handle!(
    /// Raw node (graph term) handle.
    RawNode
);
raw_handle!(
    /// Raw statement (triple) handle.
    RawStatement
);
raw_handle!(
    /// Raw storage backend handle.
    RawStorage
);
raw_handle!(
    /// Raw model handle.
    RawModel
);
raw_handle!(
    /// Raw statement stream (pull cursor over statements).
    RawStream
);
raw_handle!(
    /// Raw node iterator (pull cursor over nodes).
    RawIterator
);
raw_handle!(
    /// Raw parser handle.
    RawParser
);
raw_handle!(
    /// Raw serializer handle.
    RawSerializer
);
raw_handle!(
    /// Raw query handle.
    RawQuery
);
raw_handle!(
    /// Raw query results cursor handle.
    RawQueryResults
);

/// The fixed, versioned call surface of the native RDF engine.
///
/// Contract notes, inherited from the C ABI:
///
/// * Constructors return `None` where the native call would return a null
///   handle; a `Some` handle is live and must eventually be passed to the
///   matching `*_free` method exactly once.
/// * `stream_current`, `iterator_current` and the statement slot getters
///   return *borrowed* handles owned by the cursor or statement; callers
///   must copy (`statement_clone`, `node_clone`) before retaining them and
///   must never free them directly.
/// * `results_binding_value` returns an *owned* node, per the native
///   contract.
/// * Storage options, format identifiers, parser/serializer names and query
///   dialect names are free-form strings interpreted only by the engine.
/// * Methods returning `i32` follow the C convention: zero is success.
pub trait NativeEngine: Send + Sync + 'static {
    // --- world ---
    fn world_create(&self) -> Option<RawWorld>;
    fn world_open(&self, world: RawWorld);
    fn world_free(&self, world: RawWorld);
    fn world_guess_parser_name(&self, world: RawWorld, uri: RawUri) -> Option<String>;
    fn world_set_feature(&self, world: RawWorld, feature: RawUri, value: RawNode) -> i32;
    /// Returns an owned node, per the native contract.
    fn world_get_feature(&self, world: RawWorld, feature: RawUri) -> Option<RawNode>;
    fn world_set_digest(&self, world: RawWorld, name: &str);

    // --- uri ---
    fn uri_create(&self, world: RawWorld, uri: &str) -> Option<RawUri>;
    fn uri_clone(&self, uri: RawUri) -> Option<RawUri>;
    fn uri_from_filename(&self, world: RawWorld, filename: &str) -> Option<RawUri>;
    fn uri_from_uri_local_name(&self, uri: RawUri, local_name: &str) -> Option<RawUri>;
    fn uri_relative_to_base(&self, base: RawUri, uri: &str) -> Option<RawUri>;
    fn uri_normalized_to_base(&self, uri: &str, source: RawUri, base: RawUri) -> Option<RawUri>;
    fn uri_as_string(&self, uri: RawUri) -> Option<String>;
    fn uri_to_filename(&self, uri: RawUri) -> Option<String>;
    fn uri_is_file_uri(&self, uri: RawUri) -> bool;
    fn uri_equals(&self, a: RawUri, b: RawUri) -> bool;
    fn uri_compare(&self, a: RawUri, b: RawUri) -> i32;
    fn uri_free(&self, uri: RawUri);

    // --- node ---
    fn node_from_uri(&self, world: RawWorld, uri: RawUri) -> Option<RawNode>;
    fn node_from_literal(
        &self,
        world: RawWorld,
        value: &str,
        language: Option<&str>,
        is_xml: bool,
    ) -> Option<RawNode>;
    fn node_blank(&self, world: RawWorld, id: Option<&str>) -> Option<RawNode>;
    fn node_clone(&self, node: RawNode) -> Option<RawNode>;
    fn node_is_resource(&self, node: RawNode) -> bool;
    fn node_is_literal(&self, node: RawNode) -> bool;
    fn node_is_blank(&self, node: RawNode) -> bool;
    fn node_uri_string(&self, node: RawNode) -> Option<String>;
    fn node_literal_value(&self, node: RawNode) -> Option<String>;
    fn node_literal_language(&self, node: RawNode) -> Option<String>;
    fn node_to_string(&self, node: RawNode) -> Option<String>;
    fn node_equals(&self, a: RawNode, b: RawNode) -> bool;
    fn node_free(&self, node: RawNode);

    // --- statement ---
    fn statement_create(&self, world: RawWorld) -> Option<RawStatement>;
    /// Ownership of all three nodes transfers into the statement.
    fn statement_from_nodes(
        &self,
        world: RawWorld,
        subject: RawNode,
        predicate: RawNode,
        object: RawNode,
    ) -> Option<RawStatement>;
    fn statement_clone(&self, statement: RawStatement) -> Option<RawStatement>;
    fn statement_clear(&self, statement: RawStatement);
    /// Ownership of `node` transfers into the statement.
    fn statement_set_subject(&self, statement: RawStatement, node: RawNode);
    /// Ownership of `node` transfers into the statement.
    fn statement_set_predicate(&self, statement: RawStatement, node: RawNode);
    /// Ownership of `node` transfers into the statement.
    fn statement_set_object(&self, statement: RawStatement, node: RawNode);
    fn statement_subject(&self, statement: RawStatement) -> Option<RawNode>;
    fn statement_predicate(&self, statement: RawStatement) -> Option<RawNode>;
    fn statement_object(&self, statement: RawStatement) -> Option<RawNode>;
    fn statement_is_complete(&self, statement: RawStatement) -> bool;
    fn statement_equals(&self, a: RawStatement, b: RawStatement) -> bool;
    fn statement_matches(&self, statement: RawStatement, partial: RawStatement) -> bool;
    fn statement_encode(&self, world: RawWorld, statement: RawStatement) -> Option<Vec<u8>>;
    /// Encode only the slots selected by the `parts` bitmask, together with
    /// an optional context node.
    fn statement_encode_parts(
        &self,
        world: RawWorld,
        statement: RawStatement,
        context: Option<RawNode>,
        parts: u32,
    ) -> Option<Vec<u8>>;
    fn statement_decode(&self, world: RawWorld, statement: RawStatement, encoded: &[u8]) -> bool;
    /// Like `statement_decode`, additionally recovering the context node
    /// (owned) when the encoding carries one. `None` means the decode
    /// failed.
    fn statement_decode_with_context(
        &self,
        world: RawWorld,
        statement: RawStatement,
        encoded: &[u8],
    ) -> Option<Option<RawNode>>;
    fn statement_to_string(&self, statement: RawStatement) -> Option<String>;
    fn statement_free(&self, statement: RawStatement);

    // --- storage ---
    fn storage_create(
        &self,
        world: RawWorld,
        kind: &str,
        name: &str,
        options: &str,
    ) -> Option<RawStorage>;
    fn storage_free(&self, storage: RawStorage);

    // --- model ---
    fn model_create(&self, world: RawWorld, storage: RawStorage, options: &str)
        -> Option<RawModel>;
    fn model_add_statement(&self, model: RawModel, statement: RawStatement) -> i32;
    fn model_remove_statement(&self, model: RawModel, statement: RawStatement) -> i32;
    fn model_contains_statement(&self, model: RawModel, statement: RawStatement) -> bool;
    fn model_size(&self, model: RawModel) -> Option<usize>;
    fn model_find_statements(&self, model: RawModel, partial: RawStatement) -> Option<RawStream>;
    fn model_get_targets(
        &self,
        model: RawModel,
        subject: RawNode,
        predicate: RawNode,
    ) -> Option<RawIterator>;
    fn model_load(&self, model: RawModel, uri: RawUri) -> i32;
    fn model_to_string(&self, model: RawModel, base: Option<RawUri>) -> Option<String>;
    fn model_execute_query(&self, model: RawModel, query: RawQuery) -> Option<RawQueryResults>;
    fn model_free(&self, model: RawModel);

    // --- statement stream cursor ---
    fn stream_end(&self, stream: RawStream) -> bool;
    fn stream_current(&self, stream: RawStream) -> Option<RawStatement>;
    fn stream_next(&self, stream: RawStream);
    fn stream_free(&self, stream: RawStream);

    // --- node iterator cursor ---
    fn iterator_end(&self, iterator: RawIterator) -> bool;
    fn iterator_current(&self, iterator: RawIterator) -> Option<RawNode>;
    fn iterator_next(&self, iterator: RawIterator);
    fn iterator_free(&self, iterator: RawIterator);

    // --- parser ---
    fn parser_create(
        &self,
        world: RawWorld,
        name: &str,
        mime_type: Option<&str>,
    ) -> Option<RawParser>;
    fn parser_parse_uri_into_model(
        &self,
        parser: RawParser,
        uri: RawUri,
        base: Option<RawUri>,
        model: RawModel,
    ) -> i32;
    fn parser_parse_string_into_model(
        &self,
        parser: RawParser,
        text: &str,
        base: Option<RawUri>,
        model: RawModel,
    ) -> i32;
    fn parser_free(&self, parser: RawParser);

    // --- serializer ---
    fn serializer_create(
        &self,
        world: RawWorld,
        name: &str,
        mime_type: Option<&str>,
        type_uri: Option<RawUri>,
    ) -> Option<RawSerializer>;
    fn serializer_model_to_string(
        &self,
        serializer: RawSerializer,
        base: Option<RawUri>,
        model: RawModel,
    ) -> Option<String>;
    fn serializer_stream_to_string(
        &self,
        serializer: RawSerializer,
        base: Option<RawUri>,
        stream: RawStream,
    ) -> Option<String>;
    fn serializer_free(&self, serializer: RawSerializer);

    // --- query ---
    fn query_create(
        &self,
        world: RawWorld,
        dialect: &str,
        text: &str,
        base: Option<RawUri>,
    ) -> Option<RawQuery>;
    fn query_free(&self, query: RawQuery);

    // --- query results cursor ---
    fn results_is_bindings(&self, results: RawQueryResults) -> bool;
    fn results_is_boolean(&self, results: RawQueryResults) -> bool;
    fn results_is_graph(&self, results: RawQueryResults) -> bool;
    fn results_boolean(&self, results: RawQueryResults) -> Option<bool>;
    fn results_finished(&self, results: RawQueryResults) -> bool;
    fn results_next(&self, results: RawQueryResults);
    fn results_bindings_count(&self, results: RawQueryResults) -> Option<usize>;
    fn results_binding_name(&self, results: RawQueryResults, index: usize) -> Option<String>;
    fn results_binding_value(&self, results: RawQueryResults, index: usize) -> Option<RawNode>;
    fn results_as_stream(&self, results: RawQueryResults) -> Option<RawStream>;
    fn results_to_string(
        &self,
        results: RawQueryResults,
        format: &str,
        base: Option<RawUri>,
    ) -> Option<String>;
    fn results_free(&self, results: RawQueryResults);
}
