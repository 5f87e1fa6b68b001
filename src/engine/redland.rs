//! The production [`NativeEngine`]: FFI over the system librdf.
//!
//! librdf is not thread-safe; a process-wide mutex serializes every native
//! call. Strings returned by the native side are copied out and, where the
//! native contract says the caller owns them, freed with `libc::free`.
//! Borrowed native strings (literal values, binding names, statement slot
//! nodes) are copied without freeing.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uchar, c_void};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use super::{
    NativeEngine, RawIterator, RawModel, RawNode, RawParser, RawQuery, RawQueryResults,
    RawSerializer, RawStatement, RawStorage, RawStream, RawUri, RawWorld,
};

mod sys {
    #![allow(non_camel_case_types)]

    use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_void};

    macro_rules! opaque {
        ($name:ident) => {
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
            }
        };
    }

    opaque!(librdf_world);
    opaque!(librdf_uri);
    opaque!(librdf_node);
    opaque!(librdf_statement);
    opaque!(librdf_storage);
    opaque!(librdf_model);
    opaque!(librdf_stream);
    opaque!(librdf_iterator);
    opaque!(librdf_parser);
    opaque!(librdf_serializer);
    opaque!(librdf_query);
    opaque!(librdf_query_results);

    #[link(name = "rdf")]
    extern "C" {
        // world
        pub fn librdf_new_world() -> *mut librdf_world;
        pub fn librdf_world_open(world: *mut librdf_world);
        pub fn librdf_free_world(world: *mut librdf_world);
        pub fn librdf_parser_guess_name2(
            world: *mut librdf_world,
            mime_type: *const c_char,
            buffer: *const c_uchar,
            identifier: *const c_uchar,
        ) -> *const c_char;
        pub fn librdf_world_set_feature(
            world: *mut librdf_world,
            feature: *mut librdf_uri,
            value: *mut librdf_node,
        ) -> c_int;
        pub fn librdf_world_get_feature(
            world: *mut librdf_world,
            feature: *mut librdf_uri,
        ) -> *mut librdf_node;
        pub fn librdf_world_set_digest(world: *mut librdf_world, name: *const c_char);

        // uri
        pub fn librdf_new_uri(
            world: *mut librdf_world,
            uri_string: *const c_uchar,
        ) -> *mut librdf_uri;
        pub fn librdf_new_uri_from_uri(old_uri: *mut librdf_uri) -> *mut librdf_uri;
        pub fn librdf_new_uri_from_uri_local_name(
            old_uri: *mut librdf_uri,
            local_name: *const c_uchar,
        ) -> *mut librdf_uri;
        pub fn librdf_new_uri_relative_to_base(
            base_uri: *mut librdf_uri,
            uri_string: *const c_uchar,
        ) -> *mut librdf_uri;
        pub fn librdf_new_uri_normalised_to_base(
            uri_string: *const c_uchar,
            source_uri: *mut librdf_uri,
            base_uri: *mut librdf_uri,
        ) -> *mut librdf_uri;
        pub fn librdf_new_uri_from_filename(
            world: *mut librdf_world,
            filename: *const c_char,
        ) -> *mut librdf_uri;
        pub fn librdf_uri_to_string(uri: *mut librdf_uri) -> *mut c_uchar;
        pub fn librdf_uri_to_filename(uri: *mut librdf_uri) -> *mut c_char;
        pub fn librdf_uri_is_file_uri(uri: *mut librdf_uri) -> c_int;
        pub fn librdf_uri_equals(first_uri: *mut librdf_uri, second_uri: *mut librdf_uri)
            -> c_int;
        pub fn librdf_uri_compare(first_uri: *mut librdf_uri, second_uri: *mut librdf_uri)
            -> c_int;
        pub fn librdf_free_uri(uri: *mut librdf_uri);

        // node
        pub fn librdf_new_node_from_uri(
            world: *mut librdf_world,
            uri: *mut librdf_uri,
        ) -> *mut librdf_node;
        pub fn librdf_new_node_from_literal(
            world: *mut librdf_world,
            string: *const c_uchar,
            xml_language: *const c_char,
            is_wf_xml: c_int,
        ) -> *mut librdf_node;
        pub fn librdf_new_node_from_blank_identifier(
            world: *mut librdf_world,
            identifier: *const c_uchar,
        ) -> *mut librdf_node;
        pub fn librdf_new_node_from_node(node: *mut librdf_node) -> *mut librdf_node;
        pub fn librdf_node_is_resource(node: *mut librdf_node) -> c_int;
        pub fn librdf_node_is_literal(node: *mut librdf_node) -> c_int;
        pub fn librdf_node_is_blank(node: *mut librdf_node) -> c_int;
        pub fn librdf_node_get_uri(node: *mut librdf_node) -> *mut librdf_uri;
        pub fn librdf_node_get_literal_value(node: *mut librdf_node) -> *mut c_uchar;
        pub fn librdf_node_get_literal_value_language(node: *mut librdf_node) -> *mut c_char;
        pub fn librdf_node_to_string(node: *mut librdf_node) -> *mut c_uchar;
        pub fn librdf_node_equals(
            first_node: *mut librdf_node,
            second_node: *mut librdf_node,
        ) -> c_int;
        pub fn librdf_free_node(node: *mut librdf_node);

        // statement
        pub fn librdf_new_statement(world: *mut librdf_world) -> *mut librdf_statement;
        pub fn librdf_new_statement_from_nodes(
            world: *mut librdf_world,
            subject: *mut librdf_node,
            predicate: *mut librdf_node,
            object: *mut librdf_node,
        ) -> *mut librdf_statement;
        pub fn librdf_new_statement_from_statement(
            statement: *mut librdf_statement,
        ) -> *mut librdf_statement;
        pub fn librdf_statement_clear(statement: *mut librdf_statement);
        pub fn librdf_statement_set_subject(
            statement: *mut librdf_statement,
            node: *mut librdf_node,
        );
        pub fn librdf_statement_set_predicate(
            statement: *mut librdf_statement,
            node: *mut librdf_node,
        );
        pub fn librdf_statement_set_object(
            statement: *mut librdf_statement,
            node: *mut librdf_node,
        );
        pub fn librdf_statement_get_subject(
            statement: *mut librdf_statement,
        ) -> *mut librdf_node;
        pub fn librdf_statement_get_predicate(
            statement: *mut librdf_statement,
        ) -> *mut librdf_node;
        pub fn librdf_statement_get_object(statement: *mut librdf_statement)
            -> *mut librdf_node;
        pub fn librdf_statement_is_complete(statement: *mut librdf_statement) -> c_int;
        pub fn librdf_statement_equals(
            statement1: *mut librdf_statement,
            statement2: *mut librdf_statement,
        ) -> c_int;
        pub fn librdf_statement_match(
            statement: *mut librdf_statement,
            partial_statement: *mut librdf_statement,
        ) -> c_int;
        pub fn librdf_statement_encode2(
            world: *mut librdf_world,
            statement: *mut librdf_statement,
            buffer: *mut c_uchar,
            length: usize,
        ) -> usize;
        pub fn librdf_statement_encode_parts2(
            world: *mut librdf_world,
            statement: *mut librdf_statement,
            context_node: *mut librdf_node,
            buffer: *mut c_uchar,
            length: usize,
            fields: c_uint,
        ) -> usize;
        pub fn librdf_statement_decode2(
            world: *mut librdf_world,
            statement: *mut librdf_statement,
            context_node: *mut *mut librdf_node,
            buffer: *mut c_uchar,
            length: usize,
        ) -> usize;
        pub fn librdf_statement_to_string(statement: *mut librdf_statement) -> *mut c_uchar;
        pub fn librdf_free_statement(statement: *mut librdf_statement);

        // storage
        pub fn librdf_new_storage(
            world: *mut librdf_world,
            storage_name: *const c_char,
            name: *const c_char,
            options_string: *const c_char,
        ) -> *mut librdf_storage;
        pub fn librdf_free_storage(storage: *mut librdf_storage);

        // model
        pub fn librdf_new_model(
            world: *mut librdf_world,
            storage: *mut librdf_storage,
            options_string: *const c_char,
        ) -> *mut librdf_model;
        pub fn librdf_model_add_statement(
            model: *mut librdf_model,
            statement: *mut librdf_statement,
        ) -> c_int;
        pub fn librdf_model_remove_statement(
            model: *mut librdf_model,
            statement: *mut librdf_statement,
        ) -> c_int;
        pub fn librdf_model_contains_statement(
            model: *mut librdf_model,
            statement: *mut librdf_statement,
        ) -> c_int;
        pub fn librdf_model_size(model: *mut librdf_model) -> c_int;
        pub fn librdf_model_find_statements(
            model: *mut librdf_model,
            statement: *mut librdf_statement,
        ) -> *mut librdf_stream;
        pub fn librdf_model_get_targets(
            model: *mut librdf_model,
            source: *mut librdf_node,
            arc: *mut librdf_node,
        ) -> *mut librdf_iterator;
        pub fn librdf_model_load(
            model: *mut librdf_model,
            uri: *mut librdf_uri,
            name: *const c_char,
            mime_type: *const c_char,
            type_uri: *mut librdf_uri,
        ) -> c_int;
        pub fn librdf_model_to_string(
            model: *mut librdf_model,
            uri: *mut librdf_uri,
            name: *const c_char,
            mime_type: *const c_char,
            type_uri: *mut librdf_uri,
        ) -> *mut c_uchar;
        pub fn librdf_model_query_execute(
            model: *mut librdf_model,
            query: *mut librdf_query,
        ) -> *mut librdf_query_results;
        pub fn librdf_free_model(model: *mut librdf_model);

        // stream
        pub fn librdf_stream_end(stream: *mut librdf_stream) -> c_int;
        pub fn librdf_stream_get_object(stream: *mut librdf_stream) -> *mut librdf_statement;
        pub fn librdf_stream_next(stream: *mut librdf_stream) -> c_int;
        pub fn librdf_free_stream(stream: *mut librdf_stream);

        // iterator
        pub fn librdf_iterator_end(iterator: *mut librdf_iterator) -> c_int;
        pub fn librdf_iterator_get_object(iterator: *mut librdf_iterator) -> *mut c_void;
        pub fn librdf_iterator_next(iterator: *mut librdf_iterator) -> c_int;
        pub fn librdf_free_iterator(iterator: *mut librdf_iterator);

        // parser
        pub fn librdf_new_parser(
            world: *mut librdf_world,
            name: *const c_char,
            mime_type: *const c_char,
            type_uri: *mut librdf_uri,
        ) -> *mut librdf_parser;
        pub fn librdf_parser_parse_into_model(
            parser: *mut librdf_parser,
            uri: *mut librdf_uri,
            base_uri: *mut librdf_uri,
            model: *mut librdf_model,
        ) -> c_int;
        pub fn librdf_parser_parse_string_into_model(
            parser: *mut librdf_parser,
            string: *const c_uchar,
            base_uri: *mut librdf_uri,
            model: *mut librdf_model,
        ) -> c_int;
        pub fn librdf_free_parser(parser: *mut librdf_parser);

        // serializer
        pub fn librdf_new_serializer(
            world: *mut librdf_world,
            name: *const c_char,
            mime_type: *const c_char,
            type_uri: *mut librdf_uri,
        ) -> *mut librdf_serializer;
        pub fn librdf_serializer_serialize_model_to_string(
            serializer: *mut librdf_serializer,
            base_uri: *mut librdf_uri,
            model: *mut librdf_model,
        ) -> *mut c_uchar;
        pub fn librdf_serializer_serialize_stream_to_string(
            serializer: *mut librdf_serializer,
            base_uri: *mut librdf_uri,
            stream: *mut librdf_stream,
        ) -> *mut c_uchar;
        pub fn librdf_free_serializer(serializer: *mut librdf_serializer);

        // query
        pub fn librdf_new_query(
            world: *mut librdf_world,
            name: *const c_char,
            uri: *mut librdf_uri,
            query_string: *const c_uchar,
            base_uri: *mut librdf_uri,
        ) -> *mut librdf_query;
        pub fn librdf_free_query(query: *mut librdf_query);

        // query results
        pub fn librdf_query_results_is_bindings(
            query_results: *mut librdf_query_results,
        ) -> c_int;
        pub fn librdf_query_results_is_boolean(
            query_results: *mut librdf_query_results,
        ) -> c_int;
        pub fn librdf_query_results_is_graph(query_results: *mut librdf_query_results) -> c_int;
        pub fn librdf_query_results_get_boolean(
            query_results: *mut librdf_query_results,
        ) -> c_int;
        pub fn librdf_query_results_finished(query_results: *mut librdf_query_results) -> c_int;
        pub fn librdf_query_results_next(query_results: *mut librdf_query_results) -> c_int;
        pub fn librdf_query_results_get_bindings_count(
            query_results: *mut librdf_query_results,
        ) -> c_int;
        pub fn librdf_query_results_get_binding_name(
            query_results: *mut librdf_query_results,
            offset: c_int,
        ) -> *const c_char;
        pub fn librdf_query_results_get_binding_value(
            query_results: *mut librdf_query_results,
            offset: c_int,
        ) -> *mut librdf_node;
        pub fn librdf_query_results_as_stream(
            query_results: *mut librdf_query_results,
        ) -> *mut librdf_stream;
        pub fn librdf_query_results_to_string2(
            query_results: *mut librdf_query_results,
            format_name: *const c_char,
            mime_type: *const c_char,
            format_uri: *mut librdf_uri,
            base_uri: *mut librdf_uri,
        ) -> *mut c_uchar;
        pub fn librdf_free_query_results(query_results: *mut librdf_query_results);
    }
}

/// Copy a native string the caller owns, then free it.
unsafe fn owned_string(ptr: *mut c_uchar) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let copied = CStr::from_ptr(ptr as *const c_char)
        .to_string_lossy()
        .into_owned();
    libc::free(ptr as *mut c_void);
    Some(copied)
}

/// Copy a native string the native side keeps owning.
unsafe fn shared_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

fn cstring(value: &str) -> Option<CString> {
    CString::new(value).ok()
}

fn opt_cstring(value: Option<&str>) -> Option<CString> {
    value.and_then(cstring)
}

fn as_ptr(value: &Option<CString>) -> *const c_char {
    value.as_ref().map_or(ptr::null(), |c| c.as_ptr())
}

fn handle<T, R>(ptr: *mut T, wrap: impl FnOnce(usize) -> R) -> Option<R> {
    if ptr.is_null() {
        None
    } else {
        Some(wrap(ptr as usize))
    }
}

macro_rules! cast {
    ($raw:expr, $ty:ty) => {
        $raw.0 as *mut $ty
    };
}

fn uri_ptr(uri: Option<RawUri>) -> *mut sys::librdf_uri {
    uri.map_or(ptr::null_mut(), |u| cast!(u, sys::librdf_uri))
}

/// FFI-backed engine. One instance per process is enough; obtain it with
/// [`RedlandEngine::shared`].
pub struct RedlandEngine {
    // librdf has no internal locking; serialize every call.
    lock: Mutex<()>,
}

impl RedlandEngine {
    pub fn new() -> RedlandEngine {
        RedlandEngine {
            lock: Mutex::new(()),
        }
    }

    /// The process-wide engine instance.
    pub fn shared() -> Arc<RedlandEngine> {
        static SHARED: OnceLock<Arc<RedlandEngine>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(RedlandEngine::new())).clone()
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RedlandEngine {
    fn default() -> Self {
        RedlandEngine::new()
    }
}

impl NativeEngine for RedlandEngine {
    fn world_create(&self) -> Option<RawWorld> {
        let _g = self.guard();
        unsafe { handle(sys::librdf_new_world(), RawWorld) }
    }

    fn world_open(&self, world: RawWorld) {
        let _g = self.guard();
        unsafe { sys::librdf_world_open(cast!(world, sys::librdf_world)) }
    }

    fn world_free(&self, world: RawWorld) {
        let _g = self.guard();
        unsafe { sys::librdf_free_world(cast!(world, sys::librdf_world)) }
    }

    fn world_guess_parser_name(&self, world: RawWorld, uri: RawUri) -> Option<String> {
        let _g = self.guard();
        unsafe {
            let uri_string = sys::librdf_uri_to_string(cast!(uri, sys::librdf_uri));
            if uri_string.is_null() {
                return None;
            }
            let name = sys::librdf_parser_guess_name2(
                cast!(world, sys::librdf_world),
                ptr::null(),
                ptr::null(),
                uri_string as *const c_uchar,
            );
            let guessed = shared_string(name);
            libc::free(uri_string as *mut c_void);
            guessed
        }
    }

    fn world_set_feature(&self, world: RawWorld, feature: RawUri, value: RawNode) -> i32 {
        let _g = self.guard();
        unsafe {
            sys::librdf_world_set_feature(
                cast!(world, sys::librdf_world),
                cast!(feature, sys::librdf_uri),
                cast!(value, sys::librdf_node),
            )
        }
    }

    fn world_get_feature(&self, world: RawWorld, feature: RawUri) -> Option<RawNode> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_world_get_feature(
                    cast!(world, sys::librdf_world),
                    cast!(feature, sys::librdf_uri),
                ),
                RawNode,
            )
        }
    }

    fn world_set_digest(&self, world: RawWorld, name: &str) {
        let Some(c_name) = cstring(name) else {
            return;
        };
        let _g = self.guard();
        unsafe { sys::librdf_world_set_digest(cast!(world, sys::librdf_world), c_name.as_ptr()) }
    }

    fn uri_create(&self, world: RawWorld, uri: &str) -> Option<RawUri> {
        let c_uri = cstring(uri)?;
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_uri(
                    cast!(world, sys::librdf_world),
                    c_uri.as_ptr() as *const c_uchar,
                ),
                RawUri,
            )
        }
    }

    fn uri_clone(&self, uri: RawUri) -> Option<RawUri> {
        let _g = self.guard();
        unsafe { handle(sys::librdf_new_uri_from_uri(cast!(uri, sys::librdf_uri)), RawUri) }
    }

    fn uri_from_filename(&self, world: RawWorld, filename: &str) -> Option<RawUri> {
        let c_filename = cstring(filename)?;
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_uri_from_filename(
                    cast!(world, sys::librdf_world),
                    c_filename.as_ptr(),
                ),
                RawUri,
            )
        }
    }

    fn uri_from_uri_local_name(&self, uri: RawUri, local_name: &str) -> Option<RawUri> {
        let c_name = cstring(local_name)?;
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_uri_from_uri_local_name(
                    cast!(uri, sys::librdf_uri),
                    c_name.as_ptr() as *const c_uchar,
                ),
                RawUri,
            )
        }
    }

    fn uri_relative_to_base(&self, base: RawUri, uri: &str) -> Option<RawUri> {
        let c_uri = cstring(uri)?;
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_uri_relative_to_base(
                    cast!(base, sys::librdf_uri),
                    c_uri.as_ptr() as *const c_uchar,
                ),
                RawUri,
            )
        }
    }

    fn uri_normalized_to_base(&self, uri: &str, source: RawUri, base: RawUri) -> Option<RawUri> {
        let c_uri = cstring(uri)?;
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_uri_normalised_to_base(
                    c_uri.as_ptr() as *const c_uchar,
                    cast!(source, sys::librdf_uri),
                    cast!(base, sys::librdf_uri),
                ),
                RawUri,
            )
        }
    }

    fn uri_as_string(&self, uri: RawUri) -> Option<String> {
        let _g = self.guard();
        unsafe { owned_string(sys::librdf_uri_to_string(cast!(uri, sys::librdf_uri))) }
    }

    fn uri_to_filename(&self, uri: RawUri) -> Option<String> {
        let _g = self.guard();
        unsafe {
            owned_string(sys::librdf_uri_to_filename(cast!(uri, sys::librdf_uri)) as *mut c_uchar)
        }
    }

    fn uri_is_file_uri(&self, uri: RawUri) -> bool {
        let _g = self.guard();
        unsafe { sys::librdf_uri_is_file_uri(cast!(uri, sys::librdf_uri)) != 0 }
    }

    fn uri_equals(&self, a: RawUri, b: RawUri) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_uri_equals(cast!(a, sys::librdf_uri), cast!(b, sys::librdf_uri)) != 0
        }
    }

    fn uri_compare(&self, a: RawUri, b: RawUri) -> i32 {
        let _g = self.guard();
        unsafe { sys::librdf_uri_compare(cast!(a, sys::librdf_uri), cast!(b, sys::librdf_uri)) }
    }

    fn uri_free(&self, uri: RawUri) {
        let _g = self.guard();
        unsafe { sys::librdf_free_uri(cast!(uri, sys::librdf_uri)) }
    }

    fn node_from_uri(&self, world: RawWorld, uri: RawUri) -> Option<RawNode> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_node_from_uri(
                    cast!(world, sys::librdf_world),
                    cast!(uri, sys::librdf_uri),
                ),
                RawNode,
            )
        }
    }

    fn node_from_literal(
        &self,
        world: RawWorld,
        value: &str,
        language: Option<&str>,
        is_xml: bool,
    ) -> Option<RawNode> {
        let c_value = cstring(value)?;
        let c_language = opt_cstring(language);
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_node_from_literal(
                    cast!(world, sys::librdf_world),
                    c_value.as_ptr() as *const c_uchar,
                    as_ptr(&c_language),
                    is_xml as c_int,
                ),
                RawNode,
            )
        }
    }

    fn node_blank(&self, world: RawWorld, id: Option<&str>) -> Option<RawNode> {
        let c_id = opt_cstring(id);
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_node_from_blank_identifier(
                    cast!(world, sys::librdf_world),
                    as_ptr(&c_id) as *const c_uchar,
                ),
                RawNode,
            )
        }
    }

    fn node_clone(&self, node: RawNode) -> Option<RawNode> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_node_from_node(cast!(node, sys::librdf_node)),
                RawNode,
            )
        }
    }

    fn node_is_resource(&self, node: RawNode) -> bool {
        let _g = self.guard();
        unsafe { sys::librdf_node_is_resource(cast!(node, sys::librdf_node)) != 0 }
    }

    fn node_is_literal(&self, node: RawNode) -> bool {
        let _g = self.guard();
        unsafe { sys::librdf_node_is_literal(cast!(node, sys::librdf_node)) != 0 }
    }

    fn node_is_blank(&self, node: RawNode) -> bool {
        let _g = self.guard();
        unsafe { sys::librdf_node_is_blank(cast!(node, sys::librdf_node)) != 0 }
    }

    fn node_uri_string(&self, node: RawNode) -> Option<String> {
        let _g = self.guard();
        unsafe {
            let uri = sys::librdf_node_get_uri(cast!(node, sys::librdf_node));
            if uri.is_null() {
                return None;
            }
            owned_string(sys::librdf_uri_to_string(uri))
        }
    }

    fn node_literal_value(&self, node: RawNode) -> Option<String> {
        let _g = self.guard();
        unsafe {
            shared_string(
                sys::librdf_node_get_literal_value(cast!(node, sys::librdf_node))
                    as *const c_char,
            )
        }
    }

    fn node_literal_language(&self, node: RawNode) -> Option<String> {
        let _g = self.guard();
        unsafe {
            shared_string(sys::librdf_node_get_literal_value_language(cast!(
                node,
                sys::librdf_node
            )))
        }
    }

    fn node_to_string(&self, node: RawNode) -> Option<String> {
        let _g = self.guard();
        unsafe { owned_string(sys::librdf_node_to_string(cast!(node, sys::librdf_node))) }
    }

    fn node_equals(&self, a: RawNode, b: RawNode) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_node_equals(cast!(a, sys::librdf_node), cast!(b, sys::librdf_node)) != 0
        }
    }

    fn node_free(&self, node: RawNode) {
        let _g = self.guard();
        unsafe { sys::librdf_free_node(cast!(node, sys::librdf_node)) }
    }

    fn statement_create(&self, world: RawWorld) -> Option<RawStatement> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_statement(cast!(world, sys::librdf_world)),
                RawStatement,
            )
        }
    }

    fn statement_from_nodes(
        &self,
        world: RawWorld,
        subject: RawNode,
        predicate: RawNode,
        object: RawNode,
    ) -> Option<RawStatement> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_statement_from_nodes(
                    cast!(world, sys::librdf_world),
                    cast!(subject, sys::librdf_node),
                    cast!(predicate, sys::librdf_node),
                    cast!(object, sys::librdf_node),
                ),
                RawStatement,
            )
        }
    }

    fn statement_clone(&self, statement: RawStatement) -> Option<RawStatement> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_statement_from_statement(cast!(
                    statement,
                    sys::librdf_statement
                )),
                RawStatement,
            )
        }
    }

    fn statement_clear(&self, statement: RawStatement) {
        let _g = self.guard();
        unsafe { sys::librdf_statement_clear(cast!(statement, sys::librdf_statement)) }
    }

    fn statement_set_subject(&self, statement: RawStatement, node: RawNode) {
        let _g = self.guard();
        unsafe {
            sys::librdf_statement_set_subject(
                cast!(statement, sys::librdf_statement),
                cast!(node, sys::librdf_node),
            )
        }
    }

    fn statement_set_predicate(&self, statement: RawStatement, node: RawNode) {
        let _g = self.guard();
        unsafe {
            sys::librdf_statement_set_predicate(
                cast!(statement, sys::librdf_statement),
                cast!(node, sys::librdf_node),
            )
        }
    }

    fn statement_set_object(&self, statement: RawStatement, node: RawNode) {
        let _g = self.guard();
        unsafe {
            sys::librdf_statement_set_object(
                cast!(statement, sys::librdf_statement),
                cast!(node, sys::librdf_node),
            )
        }
    }

    fn statement_subject(&self, statement: RawStatement) -> Option<RawNode> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_statement_get_subject(cast!(statement, sys::librdf_statement)),
                RawNode,
            )
        }
    }

    fn statement_predicate(&self, statement: RawStatement) -> Option<RawNode> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_statement_get_predicate(cast!(statement, sys::librdf_statement)),
                RawNode,
            )
        }
    }

    fn statement_object(&self, statement: RawStatement) -> Option<RawNode> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_statement_get_object(cast!(statement, sys::librdf_statement)),
                RawNode,
            )
        }
    }

    fn statement_is_complete(&self, statement: RawStatement) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_statement_is_complete(cast!(statement, sys::librdf_statement)) != 0
        }
    }

    fn statement_equals(&self, a: RawStatement, b: RawStatement) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_statement_equals(
                cast!(a, sys::librdf_statement),
                cast!(b, sys::librdf_statement),
            ) != 0
        }
    }

    fn statement_matches(&self, statement: RawStatement, partial: RawStatement) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_statement_match(
                cast!(statement, sys::librdf_statement),
                cast!(partial, sys::librdf_statement),
            ) != 0
        }
    }

    fn statement_encode(&self, world: RawWorld, statement: RawStatement) -> Option<Vec<u8>> {
        let _g = self.guard();
        unsafe {
            let needed = sys::librdf_statement_encode2(
                cast!(world, sys::librdf_world),
                cast!(statement, sys::librdf_statement),
                ptr::null_mut(),
                0,
            );
            if needed == 0 {
                return None;
            }
            let mut buffer = vec![0u8; needed];
            let written = sys::librdf_statement_encode2(
                cast!(world, sys::librdf_world),
                cast!(statement, sys::librdf_statement),
                buffer.as_mut_ptr(),
                buffer.len(),
            );
            if written == 0 {
                return None;
            }
            buffer.truncate(written);
            Some(buffer)
        }
    }

    fn statement_encode_parts(
        &self,
        world: RawWorld,
        statement: RawStatement,
        context: Option<RawNode>,
        parts: u32,
    ) -> Option<Vec<u8>> {
        let context_ptr = context.map_or(ptr::null_mut(), |n| cast!(n, sys::librdf_node));
        let _g = self.guard();
        unsafe {
            let needed = sys::librdf_statement_encode_parts2(
                cast!(world, sys::librdf_world),
                cast!(statement, sys::librdf_statement),
                context_ptr,
                ptr::null_mut(),
                0,
                parts,
            );
            if needed == 0 {
                return None;
            }
            let mut buffer = vec![0u8; needed];
            let written = sys::librdf_statement_encode_parts2(
                cast!(world, sys::librdf_world),
                cast!(statement, sys::librdf_statement),
                context_ptr,
                buffer.as_mut_ptr(),
                buffer.len(),
                parts,
            );
            if written == 0 {
                return None;
            }
            buffer.truncate(written);
            Some(buffer)
        }
    }

    fn statement_decode_with_context(
        &self,
        world: RawWorld,
        statement: RawStatement,
        encoded: &[u8],
    ) -> Option<Option<RawNode>> {
        let mut buffer = encoded.to_vec();
        let _g = self.guard();
        unsafe {
            let mut context: *mut sys::librdf_node = ptr::null_mut();
            let read = sys::librdf_statement_decode2(
                cast!(world, sys::librdf_world),
                cast!(statement, sys::librdf_statement),
                &mut context,
                buffer.as_mut_ptr(),
                buffer.len(),
            );
            if read == 0 {
                return None;
            }
            Some(handle(context, RawNode))
        }
    }

    fn statement_decode(&self, world: RawWorld, statement: RawStatement, encoded: &[u8]) -> bool {
        let mut buffer = encoded.to_vec();
        let _g = self.guard();
        unsafe {
            sys::librdf_statement_decode2(
                cast!(world, sys::librdf_world),
                cast!(statement, sys::librdf_statement),
                ptr::null_mut(),
                buffer.as_mut_ptr(),
                buffer.len(),
            ) != 0
        }
    }

    fn statement_to_string(&self, statement: RawStatement) -> Option<String> {
        let _g = self.guard();
        unsafe {
            owned_string(sys::librdf_statement_to_string(cast!(
                statement,
                sys::librdf_statement
            )))
        }
    }

    fn statement_free(&self, statement: RawStatement) {
        let _g = self.guard();
        unsafe { sys::librdf_free_statement(cast!(statement, sys::librdf_statement)) }
    }

    fn storage_create(
        &self,
        world: RawWorld,
        kind: &str,
        name: &str,
        options: &str,
    ) -> Option<RawStorage> {
        let c_kind = cstring(kind)?;
        let c_name = cstring(name)?;
        let c_options = cstring(options)?;
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_storage(
                    cast!(world, sys::librdf_world),
                    c_kind.as_ptr(),
                    c_name.as_ptr(),
                    c_options.as_ptr(),
                ),
                RawStorage,
            )
        }
    }

    fn storage_free(&self, storage: RawStorage) {
        let _g = self.guard();
        unsafe { sys::librdf_free_storage(cast!(storage, sys::librdf_storage)) }
    }

    fn model_create(
        &self,
        world: RawWorld,
        storage: RawStorage,
        options: &str,
    ) -> Option<RawModel> {
        let c_options = cstring(options)?;
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_model(
                    cast!(world, sys::librdf_world),
                    cast!(storage, sys::librdf_storage),
                    c_options.as_ptr(),
                ),
                RawModel,
            )
        }
    }

    fn model_add_statement(&self, model: RawModel, statement: RawStatement) -> i32 {
        let _g = self.guard();
        unsafe {
            sys::librdf_model_add_statement(
                cast!(model, sys::librdf_model),
                cast!(statement, sys::librdf_statement),
            )
        }
    }

    fn model_remove_statement(&self, model: RawModel, statement: RawStatement) -> i32 {
        let _g = self.guard();
        unsafe {
            sys::librdf_model_remove_statement(
                cast!(model, sys::librdf_model),
                cast!(statement, sys::librdf_statement),
            )
        }
    }

    fn model_contains_statement(&self, model: RawModel, statement: RawStatement) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_model_contains_statement(
                cast!(model, sys::librdf_model),
                cast!(statement, sys::librdf_statement),
            ) != 0
        }
    }

    fn model_size(&self, model: RawModel) -> Option<usize> {
        let _g = self.guard();
        let size = unsafe { sys::librdf_model_size(cast!(model, sys::librdf_model)) };
        usize::try_from(size).ok()
    }

    fn model_find_statements(&self, model: RawModel, partial: RawStatement) -> Option<RawStream> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_model_find_statements(
                    cast!(model, sys::librdf_model),
                    cast!(partial, sys::librdf_statement),
                ),
                RawStream,
            )
        }
    }

    fn model_get_targets(
        &self,
        model: RawModel,
        subject: RawNode,
        predicate: RawNode,
    ) -> Option<RawIterator> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_model_get_targets(
                    cast!(model, sys::librdf_model),
                    cast!(subject, sys::librdf_node),
                    cast!(predicate, sys::librdf_node),
                ),
                RawIterator,
            )
        }
    }

    fn model_load(&self, model: RawModel, uri: RawUri) -> i32 {
        let _g = self.guard();
        unsafe {
            sys::librdf_model_load(
                cast!(model, sys::librdf_model),
                cast!(uri, sys::librdf_uri),
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
            )
        }
    }

    fn model_to_string(&self, model: RawModel, base: Option<RawUri>) -> Option<String> {
        let _g = self.guard();
        unsafe {
            owned_string(sys::librdf_model_to_string(
                cast!(model, sys::librdf_model),
                uri_ptr(base),
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
            ))
        }
    }

    fn model_execute_query(&self, model: RawModel, query: RawQuery) -> Option<RawQueryResults> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_model_query_execute(
                    cast!(model, sys::librdf_model),
                    cast!(query, sys::librdf_query),
                ),
                RawQueryResults,
            )
        }
    }

    fn model_free(&self, model: RawModel) {
        let _g = self.guard();
        unsafe { sys::librdf_free_model(cast!(model, sys::librdf_model)) }
    }

    fn stream_end(&self, stream: RawStream) -> bool {
        let _g = self.guard();
        unsafe { sys::librdf_stream_end(cast!(stream, sys::librdf_stream)) != 0 }
    }

    fn stream_current(&self, stream: RawStream) -> Option<RawStatement> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_stream_get_object(cast!(stream, sys::librdf_stream)),
                RawStatement,
            )
        }
    }

    fn stream_next(&self, stream: RawStream) {
        let _g = self.guard();
        unsafe {
            sys::librdf_stream_next(cast!(stream, sys::librdf_stream));
        }
    }

    fn stream_free(&self, stream: RawStream) {
        let _g = self.guard();
        unsafe { sys::librdf_free_stream(cast!(stream, sys::librdf_stream)) }
    }

    fn iterator_end(&self, iterator: RawIterator) -> bool {
        let _g = self.guard();
        unsafe { sys::librdf_iterator_end(cast!(iterator, sys::librdf_iterator)) != 0 }
    }

    fn iterator_current(&self, iterator: RawIterator) -> Option<RawNode> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_iterator_get_object(cast!(iterator, sys::librdf_iterator))
                    as *mut sys::librdf_node,
                RawNode,
            )
        }
    }

    fn iterator_next(&self, iterator: RawIterator) {
        let _g = self.guard();
        unsafe {
            sys::librdf_iterator_next(cast!(iterator, sys::librdf_iterator));
        }
    }

    fn iterator_free(&self, iterator: RawIterator) {
        let _g = self.guard();
        unsafe { sys::librdf_free_iterator(cast!(iterator, sys::librdf_iterator)) }
    }

    fn parser_create(
        &self,
        world: RawWorld,
        name: &str,
        mime_type: Option<&str>,
    ) -> Option<RawParser> {
        let c_name = cstring(name)?;
        let c_mime = opt_cstring(mime_type);
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_parser(
                    cast!(world, sys::librdf_world),
                    c_name.as_ptr(),
                    as_ptr(&c_mime),
                    ptr::null_mut(),
                ),
                RawParser,
            )
        }
    }

    fn parser_parse_uri_into_model(
        &self,
        parser: RawParser,
        uri: RawUri,
        base: Option<RawUri>,
        model: RawModel,
    ) -> i32 {
        let _g = self.guard();
        unsafe {
            sys::librdf_parser_parse_into_model(
                cast!(parser, sys::librdf_parser),
                cast!(uri, sys::librdf_uri),
                uri_ptr(base),
                cast!(model, sys::librdf_model),
            )
        }
    }

    fn parser_parse_string_into_model(
        &self,
        parser: RawParser,
        text: &str,
        base: Option<RawUri>,
        model: RawModel,
    ) -> i32 {
        let Some(c_text) = cstring(text) else {
            return -1;
        };
        let _g = self.guard();
        unsafe {
            sys::librdf_parser_parse_string_into_model(
                cast!(parser, sys::librdf_parser),
                c_text.as_ptr() as *const c_uchar,
                uri_ptr(base),
                cast!(model, sys::librdf_model),
            )
        }
    }

    fn parser_free(&self, parser: RawParser) {
        let _g = self.guard();
        unsafe { sys::librdf_free_parser(cast!(parser, sys::librdf_parser)) }
    }

    fn serializer_create(
        &self,
        world: RawWorld,
        name: &str,
        mime_type: Option<&str>,
        type_uri: Option<RawUri>,
    ) -> Option<RawSerializer> {
        let c_name = cstring(name)?;
        let c_mime = opt_cstring(mime_type);
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_serializer(
                    cast!(world, sys::librdf_world),
                    c_name.as_ptr(),
                    as_ptr(&c_mime),
                    uri_ptr(type_uri),
                ),
                RawSerializer,
            )
        }
    }

    fn serializer_model_to_string(
        &self,
        serializer: RawSerializer,
        base: Option<RawUri>,
        model: RawModel,
    ) -> Option<String> {
        let _g = self.guard();
        unsafe {
            owned_string(sys::librdf_serializer_serialize_model_to_string(
                cast!(serializer, sys::librdf_serializer),
                uri_ptr(base),
                cast!(model, sys::librdf_model),
            ))
        }
    }

    fn serializer_stream_to_string(
        &self,
        serializer: RawSerializer,
        base: Option<RawUri>,
        stream: RawStream,
    ) -> Option<String> {
        let _g = self.guard();
        unsafe {
            owned_string(sys::librdf_serializer_serialize_stream_to_string(
                cast!(serializer, sys::librdf_serializer),
                uri_ptr(base),
                cast!(stream, sys::librdf_stream),
            ))
        }
    }

    fn serializer_free(&self, serializer: RawSerializer) {
        let _g = self.guard();
        unsafe { sys::librdf_free_serializer(cast!(serializer, sys::librdf_serializer)) }
    }

    fn query_create(
        &self,
        world: RawWorld,
        dialect: &str,
        text: &str,
        base: Option<RawUri>,
    ) -> Option<RawQuery> {
        let c_dialect = cstring(dialect)?;
        let c_text = cstring(text)?;
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_new_query(
                    cast!(world, sys::librdf_world),
                    c_dialect.as_ptr(),
                    ptr::null_mut(),
                    c_text.as_ptr() as *const c_uchar,
                    uri_ptr(base),
                ),
                RawQuery,
            )
        }
    }

    fn query_free(&self, query: RawQuery) {
        let _g = self.guard();
        unsafe { sys::librdf_free_query(cast!(query, sys::librdf_query)) }
    }

    fn results_is_bindings(&self, results: RawQueryResults) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_query_results_is_bindings(cast!(results, sys::librdf_query_results)) != 0
        }
    }

    fn results_is_boolean(&self, results: RawQueryResults) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_query_results_is_boolean(cast!(results, sys::librdf_query_results)) != 0
        }
    }

    fn results_is_graph(&self, results: RawQueryResults) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_query_results_is_graph(cast!(results, sys::librdf_query_results)) != 0
        }
    }

    fn results_boolean(&self, results: RawQueryResults) -> Option<bool> {
        let _g = self.guard();
        let value = unsafe {
            sys::librdf_query_results_get_boolean(cast!(results, sys::librdf_query_results))
        };
        if value < 0 {
            None
        } else {
            Some(value > 0)
        }
    }

    fn results_finished(&self, results: RawQueryResults) -> bool {
        let _g = self.guard();
        unsafe {
            sys::librdf_query_results_finished(cast!(results, sys::librdf_query_results)) != 0
        }
    }

    fn results_next(&self, results: RawQueryResults) {
        let _g = self.guard();
        unsafe {
            sys::librdf_query_results_next(cast!(results, sys::librdf_query_results));
        }
    }

    fn results_bindings_count(&self, results: RawQueryResults) -> Option<usize> {
        let _g = self.guard();
        let count = unsafe {
            sys::librdf_query_results_get_bindings_count(cast!(
                results,
                sys::librdf_query_results
            ))
        };
        usize::try_from(count).ok()
    }

    fn results_binding_name(&self, results: RawQueryResults, index: usize) -> Option<String> {
        let _g = self.guard();
        unsafe {
            shared_string(sys::librdf_query_results_get_binding_name(
                cast!(results, sys::librdf_query_results),
                index as c_int,
            ))
        }
    }

    fn results_binding_value(&self, results: RawQueryResults, index: usize) -> Option<RawNode> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_query_results_get_binding_value(
                    cast!(results, sys::librdf_query_results),
                    index as c_int,
                ),
                RawNode,
            )
        }
    }

    fn results_as_stream(&self, results: RawQueryResults) -> Option<RawStream> {
        let _g = self.guard();
        unsafe {
            handle(
                sys::librdf_query_results_as_stream(cast!(results, sys::librdf_query_results)),
                RawStream,
            )
        }
    }

    fn results_to_string(
        &self,
        results: RawQueryResults,
        format: &str,
        base: Option<RawUri>,
    ) -> Option<String> {
        let c_format = cstring(format)?;
        let _g = self.guard();
        unsafe {
            owned_string(sys::librdf_query_results_to_string2(
                cast!(results, sys::librdf_query_results),
                c_format.as_ptr(),
                ptr::null(),
                ptr::null_mut(),
                uri_ptr(base),
            ))
        }
    }

    fn results_free(&self, results: RawQueryResults) {
        let _g = self.guard();
        unsafe { sys::librdf_free_query_results(cast!(results, sys::librdf_query_results)) }
    }
}
