//! A scripted in-memory double for the native engine.
//!
//! Every handle kind gets an id table; frees panic on unknown or already
//! freed ids, so lifetime bugs in the wrappers fail tests loudly instead of
//! leaking silently. Query results are scripted per query text, and streams
//! can be poisoned to produce a null item mid-iteration.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use redland::engine::{
    NativeEngine, RawIterator, RawModel, RawNode, RawParser, RawQuery, RawQueryResults,
    RawSerializer, RawStatement, RawStorage, RawStream, RawUri, RawWorld,
};
use redland::World;

/// Node values by content, independent of any handle.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeVal {
    Resource(String),
    Literal {
        value: String,
        language: Option<String>,
        xml: bool,
    },
    Blank(String),
}

impl NodeVal {
    pub fn resource(uri: &str) -> NodeVal {
        NodeVal::Resource(uri.to_owned())
    }

    pub fn literal(value: &str) -> NodeVal {
        NodeVal::Literal {
            value: value.to_owned(),
            language: None,
            xml: false,
        }
    }
}

pub type TripleVal = (NodeVal, NodeVal, NodeVal);

/// A scripted result set for one query text.
pub enum QueryScript {
    /// Solution rows; a row may be empty.
    Bindings(Vec<Vec<(String, NodeVal)>>),
    Boolean(bool),
    Graph(Vec<TripleVal>),
}

struct ModelData {
    storage: usize,
    triples: Vec<TripleVal>,
}

struct StreamData {
    // Statement handles owned by the stream; a `None` slot is a scripted
    // contract violation (null item).
    items: Vec<Option<usize>>,
    pos: usize,
}

struct IterData {
    // Node handles owned by the iterator.
    items: Vec<usize>,
    pos: usize,
}

enum ResultsData {
    Bindings {
        rows: Vec<Vec<(String, NodeVal)>>,
        pos: usize,
    },
    Boolean(bool),
    Graph(Vec<TripleVal>),
}

#[derive(Default)]
struct Inner {
    next_id: usize,
    blank_counter: usize,
    worlds: HashMap<usize, ()>,
    uris: HashMap<usize, String>,
    nodes: HashMap<usize, NodeVal>,
    statements: HashMap<usize, [Option<usize>; 3]>,
    storages: HashMap<usize, ()>,
    models: HashMap<usize, ModelData>,
    streams: HashMap<usize, StreamData>,
    iterators: HashMap<usize, IterData>,
    parsers: HashMap<usize, ()>,
    serializers: HashMap<usize, String>,
    queries: HashMap<usize, String>,
    results: HashMap<usize, ResultsData>,
    scripts: HashMap<String, QueryScript>,
    features: HashMap<String, NodeVal>,
    digest: Option<String>,
    poison_after: Option<usize>,
    null_cursor_next: bool,
}

impl Inner {
    fn alloc(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    fn node_val(&self, id: usize) -> NodeVal {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("use of freed or unknown node {id}"))
            .clone()
    }

    fn stmt_slots(&self, id: usize) -> [Option<usize>; 3] {
        *self
            .statements
            .get(&id)
            .unwrap_or_else(|| panic!("use of freed or unknown statement {id}"))
    }

    fn stmt_vals(&self, id: usize) -> [Option<NodeVal>; 3] {
        self.stmt_slots(id).map(|slot| slot.map(|n| self.node_val(n)))
    }

    fn alloc_node(&mut self, val: NodeVal) -> usize {
        let id = self.alloc();
        self.nodes.insert(id, val);
        id
    }

    fn alloc_statement(&mut self, triple: &TripleVal) -> usize {
        let s = self.alloc_node(triple.0.clone());
        let p = self.alloc_node(triple.1.clone());
        let o = self.alloc_node(triple.2.clone());
        let id = self.alloc();
        self.statements.insert(id, [Some(s), Some(p), Some(o)]);
        id
    }

    fn free_node(&mut self, id: usize) {
        self.nodes
            .remove(&id)
            .unwrap_or_else(|| panic!("double free of node {id}"));
    }

    fn free_statement(&mut self, id: usize) {
        let slots = self
            .statements
            .remove(&id)
            .unwrap_or_else(|| panic!("double free of statement {id}"));
        for slot in slots.into_iter().flatten() {
            self.free_node(slot);
        }
    }

    fn stream_from_triples(&mut self, triples: Vec<TripleVal>) -> usize {
        let mut items: Vec<Option<usize>> = triples
            .iter()
            .map(|t| Some(self.alloc_statement(t)))
            .collect();
        if let Some(good) = self.poison_after.take() {
            items.truncate(good);
            items.push(None);
        }
        let id = self.alloc();
        self.streams.insert(id, StreamData { items, pos: 0 });
        id
    }

    fn matches(&self, triple: &TripleVal, partial: &[Option<NodeVal>; 3]) -> bool {
        let slots = [&triple.0, &triple.1, &triple.2];
        partial
            .iter()
            .zip(slots)
            .all(|(pattern, actual)| match pattern {
                Some(v) => v == actual,
                None => true,
            })
    }

    fn parse_term(token: &str) -> Option<NodeVal> {
        if let Some(uri) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return Some(NodeVal::resource(uri));
        }
        if let Some(id) = token.strip_prefix("_:") {
            return Some(NodeVal::Blank(id.to_owned()));
        }
        if let Some(rest) = token.strip_prefix('"') {
            let (value, tail) = rest.split_once('"')?;
            let language = tail.strip_prefix('@').map(str::to_owned);
            return Some(NodeVal::Literal {
                value: value.to_owned(),
                language,
                xml: false,
            });
        }
        None
    }

    // One triple per line: `<s> <p> <o> .` with simple (space-free) terms.
    fn parse_text(&mut self, text: &str, model: usize) -> i32 {
        let mut parsed = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.last() == Some(&".") {
                tokens.pop();
            }
            if tokens.len() != 3 {
                return 1;
            }
            let (Some(s), Some(p), Some(o)) = (
                Self::parse_term(tokens[0]),
                Self::parse_term(tokens[1]),
                Self::parse_term(tokens[2]),
            ) else {
                return 1;
            };
            parsed.push((s, p, o));
        }
        let data = self
            .models
            .get_mut(&model)
            .unwrap_or_else(|| panic!("use of freed or unknown model {model}"));
        for triple in parsed {
            if !data.triples.contains(&triple) {
                data.triples.push(triple);
            }
        }
        0
    }

    fn encode_slot(val: &Option<NodeVal>) -> String {
        match val {
            None => String::new(),
            Some(NodeVal::Resource(u)) => format!("R\x1f{u}"),
            Some(NodeVal::Literal {
                value,
                language,
                xml,
            }) => format!(
                "L\x1f{}\x1f{}\x1f{value}",
                u8::from(*xml),
                language.clone().unwrap_or_default()
            ),
            Some(NodeVal::Blank(b)) => format!("B\x1f{b}"),
        }
    }

    fn decode_slot(segment: &str) -> Result<Option<NodeVal>, ()> {
        if segment.is_empty() {
            return Ok(None);
        }
        let mut parts = segment.split('\x1f');
        match parts.next() {
            Some("R") => Ok(Some(NodeVal::resource(parts.next().ok_or(())?))),
            Some("L") => {
                let xml = parts.next().ok_or(())? == "1";
                let language = match parts.next().ok_or(())? {
                    "" => None,
                    l => Some(l.to_owned()),
                };
                Ok(Some(NodeVal::Literal {
                    value: parts.next().ok_or(())?.to_owned(),
                    language,
                    xml,
                }))
            }
            Some("B") => Ok(Some(NodeVal::Blank(parts.next().ok_or(())?.to_owned()))),
            _ => Err(()),
        }
    }
}

pub fn format_term(val: &NodeVal) -> String {
    match val {
        NodeVal::Resource(u) => format!("<{u}>"),
        NodeVal::Literal {
            value,
            language: Some(l),
            ..
        } => format!("\"{value}\"@{l}"),
        NodeVal::Literal { value, .. } => format!("\"{value}\""),
        NodeVal::Blank(b) => format!("_:{b}"),
    }
}

fn format_triple(triple: &TripleVal) -> String {
    format!(
        "{} {} {} .",
        format_term(&triple.0),
        format_term(&triple.1),
        format_term(&triple.2)
    )
}

/// The engine double. Construct with [`FakeEngine::new`], hand the `Arc` to
/// [`World::open_with`], keep a clone for scripting and accounting.
#[derive(Default)]
pub struct FakeEngine {
    inner: Mutex<Inner>,
}

impl FakeEngine {
    pub fn new() -> Arc<FakeEngine> {
        Arc::new(FakeEngine::default())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Script the result set returned for a query with exactly this text.
    pub fn script_query(&self, text: &str, result: QueryScript) {
        self.lock().scripts.insert(text.to_owned(), result);
    }

    /// Make the next created statement stream yield `good_items` items and
    /// then a null item, violating the cursor contract.
    pub fn poison_next_stream(&self, good_items: usize) {
        self.lock().poison_after = Some(good_items);
    }

    /// Make the next find-statements call return a null cursor.
    pub fn null_cursor_on_next_find(&self) {
        self.lock().null_cursor_next = true;
    }

    /// The digest algorithm name most recently set on the world.
    pub fn digest(&self) -> Option<String> {
        self.lock().digest.clone()
    }

    pub fn live_streams(&self) -> usize {
        self.lock().streams.len()
    }

    pub fn live_iterators(&self) -> usize {
        self.lock().iterators.len()
    }

    pub fn live_results(&self) -> usize {
        self.lock().results.len()
    }

    /// Total live handles across every table, the world included.
    pub fn live_handles(&self) -> usize {
        let inner = self.lock();
        inner.worlds.len()
            + inner.uris.len()
            + inner.nodes.len()
            + inner.statements.len()
            + inner.storages.len()
            + inner.models.len()
            + inner.streams.len()
            + inner.iterators.len()
            + inner.parsers.len()
            + inner.serializers.len()
            + inner.queries.len()
            + inner.results.len()
    }
}

/// Open a world over a fresh engine double.
pub fn open_world() -> (Arc<FakeEngine>, World) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let engine = FakeEngine::new();
    let world = World::open_with(engine.clone()).expect("world open");
    (engine, world)
}

impl NativeEngine for FakeEngine {
    // --- world ---
    fn world_create(&self) -> Option<RawWorld> {
        let mut inner = self.lock();
        let id = inner.alloc();
        inner.worlds.insert(id, ());
        Some(RawWorld(id))
    }

    fn world_open(&self, world: RawWorld) {
        assert!(
            self.lock().worlds.contains_key(&world.0),
            "open of unknown world"
        );
    }

    fn world_free(&self, world: RawWorld) {
        self.lock()
            .worlds
            .remove(&world.0)
            .unwrap_or_else(|| panic!("double free of world {}", world.0));
    }

    fn world_guess_parser_name(&self, _world: RawWorld, uri: RawUri) -> Option<String> {
        let inner = self.lock();
        let uri = inner.uris.get(&uri.0)?;
        if uri.ends_with(".nt") {
            Some("ntriples".to_owned())
        } else if uri.ends_with(".rdf") {
            Some("rdfxml".to_owned())
        } else {
            None
        }
    }

    fn world_set_feature(&self, _world: RawWorld, feature: RawUri, value: RawNode) -> i32 {
        let mut inner = self.lock();
        let Some(uri) = inner.uris.get(&feature.0).cloned() else {
            return 1;
        };
        let val = inner.node_val(value.0);
        inner.features.insert(uri, val);
        0
    }

    fn world_get_feature(&self, _world: RawWorld, feature: RawUri) -> Option<RawNode> {
        let mut inner = self.lock();
        let uri = inner.uris.get(&feature.0)?.clone();
        let val = inner.features.get(&uri)?.clone();
        Some(RawNode(inner.alloc_node(val)))
    }

    fn world_set_digest(&self, _world: RawWorld, name: &str) {
        self.lock().digest = Some(name.to_owned());
    }

    // --- uri ---
    fn uri_create(&self, _world: RawWorld, uri: &str) -> Option<RawUri> {
        if uri.is_empty() {
            return None;
        }
        let mut inner = self.lock();
        let id = inner.alloc();
        inner.uris.insert(id, uri.to_owned());
        Some(RawUri(id))
    }

    fn uri_clone(&self, uri: RawUri) -> Option<RawUri> {
        let mut inner = self.lock();
        let value = inner.uris.get(&uri.0)?.clone();
        let id = inner.alloc();
        inner.uris.insert(id, value);
        Some(RawUri(id))
    }

    fn uri_from_filename(&self, world: RawWorld, filename: &str) -> Option<RawUri> {
        self.uri_create(world, &format!("file://{filename}"))
    }

    fn uri_from_uri_local_name(&self, uri: RawUri, local_name: &str) -> Option<RawUri> {
        let base = self.lock().uris.get(&uri.0)?.clone();
        self.uri_create(RawWorld(0), &format!("{base}{local_name}"))
    }

    fn uri_relative_to_base(&self, base: RawUri, uri: &str) -> Option<RawUri> {
        let base_str = self.lock().uris.get(&base.0)?.clone();
        let resolved = if uri.contains("://") {
            uri.to_owned()
        } else {
            match base_str.rfind('/') {
                Some(slash) => format!("{}/{uri}", &base_str[..slash]),
                None => uri.to_owned(),
            }
        };
        self.uri_create(RawWorld(0), &resolved)
    }

    fn uri_normalized_to_base(&self, uri: &str, source: RawUri, base: RawUri) -> Option<RawUri> {
        let (source_str, base_str) = {
            let inner = self.lock();
            (inner.uris.get(&source.0)?.clone(), inner.uris.get(&base.0)?.clone())
        };
        let normalized = match uri.strip_prefix(source_str.as_str()) {
            Some(rest) => format!("{base_str}{rest}"),
            None => uri.to_owned(),
        };
        self.uri_create(RawWorld(0), &normalized)
    }

    fn uri_as_string(&self, uri: RawUri) -> Option<String> {
        Some(
            self.lock()
                .uris
                .get(&uri.0)
                .unwrap_or_else(|| panic!("use of freed or unknown uri {}", uri.0))
                .clone(),
        )
    }

    fn uri_to_filename(&self, uri: RawUri) -> Option<String> {
        self.lock()
            .uris
            .get(&uri.0)?
            .strip_prefix("file://")
            .map(str::to_owned)
    }

    fn uri_is_file_uri(&self, uri: RawUri) -> bool {
        self.lock()
            .uris
            .get(&uri.0)
            .is_some_and(|u| u.starts_with("file:"))
    }

    fn uri_equals(&self, a: RawUri, b: RawUri) -> bool {
        let inner = self.lock();
        inner.uris.get(&a.0) == inner.uris.get(&b.0)
    }

    fn uri_compare(&self, a: RawUri, b: RawUri) -> i32 {
        let inner = self.lock();
        match inner.uris.get(&a.0).cmp(&inner.uris.get(&b.0)) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }
    }

    fn uri_free(&self, uri: RawUri) {
        self.lock()
            .uris
            .remove(&uri.0)
            .unwrap_or_else(|| panic!("double free of uri {}", uri.0));
    }

    // --- node ---
    fn node_from_uri(&self, _world: RawWorld, uri: RawUri) -> Option<RawNode> {
        let mut inner = self.lock();
        let value = inner.uris.get(&uri.0)?.clone();
        Some(RawNode(inner.alloc_node(NodeVal::Resource(value))))
    }

    fn node_from_literal(
        &self,
        _world: RawWorld,
        value: &str,
        language: Option<&str>,
        is_xml: bool,
    ) -> Option<RawNode> {
        let mut inner = self.lock();
        Some(RawNode(inner.alloc_node(NodeVal::Literal {
            value: value.to_owned(),
            language: language.map(str::to_owned),
            xml: is_xml,
        })))
    }

    fn node_blank(&self, _world: RawWorld, id: Option<&str>) -> Option<RawNode> {
        let mut inner = self.lock();
        let id = match id {
            Some(id) => id.to_owned(),
            None => {
                inner.blank_counter += 1;
                format!("b{}", inner.blank_counter)
            }
        };
        Some(RawNode(inner.alloc_node(NodeVal::Blank(id))))
    }

    fn node_clone(&self, node: RawNode) -> Option<RawNode> {
        let mut inner = self.lock();
        let value = inner.node_val(node.0);
        Some(RawNode(inner.alloc_node(value)))
    }

    fn node_is_resource(&self, node: RawNode) -> bool {
        matches!(self.lock().node_val(node.0), NodeVal::Resource(_))
    }

    fn node_is_literal(&self, node: RawNode) -> bool {
        matches!(self.lock().node_val(node.0), NodeVal::Literal { .. })
    }

    fn node_is_blank(&self, node: RawNode) -> bool {
        matches!(self.lock().node_val(node.0), NodeVal::Blank(_))
    }

    fn node_uri_string(&self, node: RawNode) -> Option<String> {
        match self.lock().node_val(node.0) {
            NodeVal::Resource(u) => Some(u),
            _ => None,
        }
    }

    fn node_literal_value(&self, node: RawNode) -> Option<String> {
        match self.lock().node_val(node.0) {
            NodeVal::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    fn node_literal_language(&self, node: RawNode) -> Option<String> {
        match self.lock().node_val(node.0) {
            NodeVal::Literal { language, .. } => language,
            _ => None,
        }
    }

    fn node_to_string(&self, node: RawNode) -> Option<String> {
        Some(format_term(&self.lock().node_val(node.0)))
    }

    fn node_equals(&self, a: RawNode, b: RawNode) -> bool {
        let inner = self.lock();
        inner.node_val(a.0) == inner.node_val(b.0)
    }

    fn node_free(&self, node: RawNode) {
        self.lock().free_node(node.0);
    }

    // --- statement ---
    fn statement_create(&self, _world: RawWorld) -> Option<RawStatement> {
        let mut inner = self.lock();
        let id = inner.alloc();
        inner.statements.insert(id, [None; 3]);
        Some(RawStatement(id))
    }

    fn statement_from_nodes(
        &self,
        _world: RawWorld,
        subject: RawNode,
        predicate: RawNode,
        object: RawNode,
    ) -> Option<RawStatement> {
        let mut inner = self.lock();
        for n in [subject.0, predicate.0, object.0] {
            assert!(inner.nodes.contains_key(&n), "statement over freed node {n}");
        }
        let id = inner.alloc();
        inner
            .statements
            .insert(id, [Some(subject.0), Some(predicate.0), Some(object.0)]);
        Some(RawStatement(id))
    }

    fn statement_clone(&self, statement: RawStatement) -> Option<RawStatement> {
        let mut inner = self.lock();
        let slots = inner.stmt_slots(statement.0);
        let cloned = slots.map(|slot| {
            slot.map(|n| {
                let val = inner.node_val(n);
                inner.alloc_node(val)
            })
        });
        let id = inner.alloc();
        inner.statements.insert(id, cloned);
        Some(RawStatement(id))
    }

    fn statement_clear(&self, statement: RawStatement) {
        let mut inner = self.lock();
        let slots = inner.stmt_slots(statement.0);
        for slot in slots.into_iter().flatten() {
            inner.free_node(slot);
        }
        inner.statements.insert(statement.0, [None; 3]);
    }

    fn statement_set_subject(&self, statement: RawStatement, node: RawNode) {
        let mut inner = self.lock();
        let slots = inner.stmt_slots(statement.0);
        if let Some(old) = slots[0] {
            inner.free_node(old);
        }
        inner.statements.get_mut(&statement.0).unwrap()[0] = Some(node.0);
    }

    fn statement_set_predicate(&self, statement: RawStatement, node: RawNode) {
        let mut inner = self.lock();
        let slots = inner.stmt_slots(statement.0);
        if let Some(old) = slots[1] {
            inner.free_node(old);
        }
        inner.statements.get_mut(&statement.0).unwrap()[1] = Some(node.0);
    }

    fn statement_set_object(&self, statement: RawStatement, node: RawNode) {
        let mut inner = self.lock();
        let slots = inner.stmt_slots(statement.0);
        if let Some(old) = slots[2] {
            inner.free_node(old);
        }
        inner.statements.get_mut(&statement.0).unwrap()[2] = Some(node.0);
    }

    fn statement_subject(&self, statement: RawStatement) -> Option<RawNode> {
        self.lock().stmt_slots(statement.0)[0].map(RawNode)
    }

    fn statement_predicate(&self, statement: RawStatement) -> Option<RawNode> {
        self.lock().stmt_slots(statement.0)[1].map(RawNode)
    }

    fn statement_object(&self, statement: RawStatement) -> Option<RawNode> {
        self.lock().stmt_slots(statement.0)[2].map(RawNode)
    }

    fn statement_is_complete(&self, statement: RawStatement) -> bool {
        self.lock()
            .stmt_slots(statement.0)
            .iter()
            .all(Option::is_some)
    }

    fn statement_equals(&self, a: RawStatement, b: RawStatement) -> bool {
        let inner = self.lock();
        inner.stmt_vals(a.0) == inner.stmt_vals(b.0)
    }

    fn statement_matches(&self, statement: RawStatement, partial: RawStatement) -> bool {
        let inner = self.lock();
        let vals = inner.stmt_vals(statement.0);
        let (Some(s), Some(p), Some(o)) = (vals[0].clone(), vals[1].clone(), vals[2].clone())
        else {
            return false;
        };
        inner.matches(&(s, p, o), &inner.stmt_vals(partial.0))
    }

    fn statement_encode(&self, _world: RawWorld, statement: RawStatement) -> Option<Vec<u8>> {
        let inner = self.lock();
        let vals = inner.stmt_vals(statement.0);
        let encoded = vals
            .iter()
            .map(Inner::encode_slot)
            .collect::<Vec<_>>()
            .join("\x1e");
        Some(encoded.into_bytes())
    }

    fn statement_decode(&self, _world: RawWorld, statement: RawStatement, encoded: &[u8]) -> bool {
        let Ok(text) = std::str::from_utf8(encoded) else {
            return false;
        };
        // A fourth segment, when present, is the context node; plain decode
        // discards it.
        let segments: Vec<&str> = text.split('\x1e').collect();
        if segments.len() != 3 && segments.len() != 4 {
            return false;
        }
        let mut decoded = [None, None, None];
        for (i, segment) in segments.iter().take(3).enumerate() {
            match Inner::decode_slot(segment) {
                Ok(val) => decoded[i] = val,
                Err(()) => return false,
            }
        }
        let mut inner = self.lock();
        let old = inner.stmt_slots(statement.0);
        for slot in old.into_iter().flatten() {
            inner.free_node(slot);
        }
        let slots = decoded.map(|val| val.map(|v| inner.alloc_node(v)));
        inner.statements.insert(statement.0, slots);
        true
    }

    fn statement_encode_parts(
        &self,
        _world: RawWorld,
        statement: RawStatement,
        context: Option<RawNode>,
        parts: u32,
    ) -> Option<Vec<u8>> {
        let inner = self.lock();
        let vals = inner.stmt_vals(statement.0);
        let mut segments: Vec<String> = vals
            .iter()
            .enumerate()
            .map(|(i, val)| {
                if parts & (1 << i) != 0 {
                    Inner::encode_slot(val)
                } else {
                    String::new()
                }
            })
            .collect();
        if let Some(ctx) = context {
            segments.push(Inner::encode_slot(&Some(inner.node_val(ctx.0))));
        }
        Some(segments.join("\x1e").into_bytes())
    }

    fn statement_decode_with_context(
        &self,
        world: RawWorld,
        statement: RawStatement,
        encoded: &[u8],
    ) -> Option<Option<RawNode>> {
        let text = std::str::from_utf8(encoded).ok()?;
        let segments: Vec<&str> = text.split('\x1e').collect();
        let context = if segments.len() == 4 {
            Inner::decode_slot(segments[3]).ok()?
        } else {
            None
        };
        if !self.statement_decode(world, statement, encoded) {
            return None;
        }
        let mut inner = self.lock();
        Some(context.map(|v| RawNode(inner.alloc_node(v))))
    }

    fn statement_to_string(&self, statement: RawStatement) -> Option<String> {
        let inner = self.lock();
        let vals = inner.stmt_vals(statement.0);
        Some(
            vals.iter()
                .map(|v| match v {
                    Some(v) => format_term(v),
                    None => "?".to_owned(),
                })
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    fn statement_free(&self, statement: RawStatement) {
        self.lock().free_statement(statement.0);
    }

    // --- storage ---
    fn storage_create(
        &self,
        _world: RawWorld,
        kind: &str,
        _name: &str,
        _options: &str,
    ) -> Option<RawStorage> {
        if kind != "memory" && kind != "hashes" && kind != "file" {
            return None;
        }
        let mut inner = self.lock();
        let id = inner.alloc();
        inner.storages.insert(id, ());
        Some(RawStorage(id))
    }

    fn storage_free(&self, storage: RawStorage) {
        self.lock()
            .storages
            .remove(&storage.0)
            .unwrap_or_else(|| panic!("double free of storage {}", storage.0));
    }

    // --- model ---
    fn model_create(
        &self,
        _world: RawWorld,
        storage: RawStorage,
        _options: &str,
    ) -> Option<RawModel> {
        let mut inner = self.lock();
        if !inner.storages.contains_key(&storage.0) {
            return None;
        }
        let id = inner.alloc();
        inner.models.insert(
            id,
            ModelData {
                storage: storage.0,
                triples: Vec::new(),
            },
        );
        Some(RawModel(id))
    }

    fn model_add_statement(&self, model: RawModel, statement: RawStatement) -> i32 {
        let mut inner = self.lock();
        let vals = inner.stmt_vals(statement.0);
        let (Some(s), Some(p), Some(o)) = (vals[0].clone(), vals[1].clone(), vals[2].clone())
        else {
            return 1;
        };
        let triple = (s, p, o);
        let data = inner
            .models
            .get_mut(&model.0)
            .unwrap_or_else(|| panic!("use of freed or unknown model {}", model.0));
        if !data.triples.contains(&triple) {
            data.triples.push(triple);
        }
        0
    }

    fn model_remove_statement(&self, model: RawModel, statement: RawStatement) -> i32 {
        let mut inner = self.lock();
        let vals = inner.stmt_vals(statement.0);
        let (Some(s), Some(p), Some(o)) = (vals[0].clone(), vals[1].clone(), vals[2].clone())
        else {
            return 1;
        };
        let triple = (s, p, o);
        let data = inner
            .models
            .get_mut(&model.0)
            .unwrap_or_else(|| panic!("use of freed or unknown model {}", model.0));
        match data.triples.iter().position(|t| *t == triple) {
            Some(index) => {
                data.triples.remove(index);
                0
            }
            None => 1,
        }
    }

    fn model_contains_statement(&self, model: RawModel, statement: RawStatement) -> bool {
        let inner = self.lock();
        let vals = inner.stmt_vals(statement.0);
        let (Some(s), Some(p), Some(o)) = (vals[0].clone(), vals[1].clone(), vals[2].clone())
        else {
            return false;
        };
        inner
            .models
            .get(&model.0)
            .unwrap_or_else(|| panic!("use of freed or unknown model {}", model.0))
            .triples
            .contains(&(s, p, o))
    }

    fn model_size(&self, model: RawModel) -> Option<usize> {
        Some(
            self.lock()
                .models
                .get(&model.0)
                .unwrap_or_else(|| panic!("use of freed or unknown model {}", model.0))
                .triples
                .len(),
        )
    }

    fn model_find_statements(&self, model: RawModel, partial: RawStatement) -> Option<RawStream> {
        let mut inner = self.lock();
        if inner.null_cursor_next {
            inner.null_cursor_next = false;
            return None;
        }
        let pattern = inner.stmt_vals(partial.0);
        let matching: Vec<TripleVal> = inner
            .models
            .get(&model.0)
            .unwrap_or_else(|| panic!("use of freed or unknown model {}", model.0))
            .triples
            .iter()
            .filter(|t| inner.matches(t, &pattern))
            .cloned()
            .collect();
        Some(RawStream(inner.stream_from_triples(matching)))
    }

    fn model_get_targets(
        &self,
        model: RawModel,
        subject: RawNode,
        predicate: RawNode,
    ) -> Option<RawIterator> {
        let mut inner = self.lock();
        let s = inner.node_val(subject.0);
        let p = inner.node_val(predicate.0);
        let targets: Vec<NodeVal> = inner
            .models
            .get(&model.0)
            .unwrap_or_else(|| panic!("use of freed or unknown model {}", model.0))
            .triples
            .iter()
            .filter(|t| t.0 == s && t.1 == p)
            .map(|t| t.2.clone())
            .collect();
        let items: Vec<usize> = targets.into_iter().map(|v| inner.alloc_node(v)).collect();
        let id = inner.alloc();
        inner.iterators.insert(id, IterData { items, pos: 0 });
        Some(RawIterator(id))
    }

    fn model_load(&self, model: RawModel, uri: RawUri) -> i32 {
        let path = {
            let inner = self.lock();
            match inner.uris.get(&uri.0).and_then(|u| u.strip_prefix("file://")) {
                Some(path) => path.to_owned(),
                None => return 1,
            }
        };
        let Ok(text) = std::fs::read_to_string(&path) else {
            return 1;
        };
        self.lock().parse_text(&text, model.0)
    }

    fn model_to_string(&self, model: RawModel, _base: Option<RawUri>) -> Option<String> {
        let inner = self.lock();
        let data = inner
            .models
            .get(&model.0)
            .unwrap_or_else(|| panic!("use of freed or unknown model {}", model.0));
        Some(
            data.triples
                .iter()
                .map(format_triple)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    fn model_execute_query(&self, _model: RawModel, query: RawQuery) -> Option<RawQueryResults> {
        let mut inner = self.lock();
        let text = inner
            .queries
            .get(&query.0)
            .unwrap_or_else(|| panic!("use of freed or unknown query {}", query.0))
            .clone();
        let data = match inner.scripts.get(&text)? {
            QueryScript::Bindings(rows) => ResultsData::Bindings {
                rows: rows.clone(),
                pos: 0,
            },
            QueryScript::Boolean(b) => ResultsData::Boolean(*b),
            QueryScript::Graph(triples) => ResultsData::Graph(triples.clone()),
        };
        let id = inner.alloc();
        inner.results.insert(id, data);
        Some(RawQueryResults(id))
    }

    fn model_free(&self, model: RawModel) {
        self.lock()
            .models
            .remove(&model.0)
            .unwrap_or_else(|| panic!("double free of model {}", model.0));
    }

    // --- statement stream cursor ---
    fn stream_end(&self, stream: RawStream) -> bool {
        let inner = self.lock();
        let data = inner
            .streams
            .get(&stream.0)
            .unwrap_or_else(|| panic!("use of freed or unknown stream {}", stream.0));
        data.pos >= data.items.len()
    }

    fn stream_current(&self, stream: RawStream) -> Option<RawStatement> {
        let inner = self.lock();
        let data = inner
            .streams
            .get(&stream.0)
            .unwrap_or_else(|| panic!("use of freed or unknown stream {}", stream.0));
        data.items.get(data.pos).copied().flatten().map(RawStatement)
    }

    fn stream_next(&self, stream: RawStream) {
        let mut inner = self.lock();
        let data = inner
            .streams
            .get_mut(&stream.0)
            .unwrap_or_else(|| panic!("use of freed or unknown stream {}", stream.0));
        data.pos += 1;
    }

    fn stream_free(&self, stream: RawStream) {
        let mut inner = self.lock();
        let data = inner
            .streams
            .remove(&stream.0)
            .unwrap_or_else(|| panic!("double free of stream {}", stream.0));
        for item in data.items.into_iter().flatten() {
            inner.free_statement(item);
        }
    }

    // --- node iterator cursor ---
    fn iterator_end(&self, iterator: RawIterator) -> bool {
        let inner = self.lock();
        let data = inner
            .iterators
            .get(&iterator.0)
            .unwrap_or_else(|| panic!("use of freed or unknown iterator {}", iterator.0));
        data.pos >= data.items.len()
    }

    fn iterator_current(&self, iterator: RawIterator) -> Option<RawNode> {
        let inner = self.lock();
        let data = inner
            .iterators
            .get(&iterator.0)
            .unwrap_or_else(|| panic!("use of freed or unknown iterator {}", iterator.0));
        data.items.get(data.pos).copied().map(RawNode)
    }

    fn iterator_next(&self, iterator: RawIterator) {
        let mut inner = self.lock();
        let data = inner
            .iterators
            .get_mut(&iterator.0)
            .unwrap_or_else(|| panic!("use of freed or unknown iterator {}", iterator.0));
        data.pos += 1;
    }

    fn iterator_free(&self, iterator: RawIterator) {
        let mut inner = self.lock();
        let data = inner
            .iterators
            .remove(&iterator.0)
            .unwrap_or_else(|| panic!("double free of iterator {}", iterator.0));
        for item in data.items {
            inner.free_node(item);
        }
    }

    // --- parser ---
    fn parser_create(
        &self,
        _world: RawWorld,
        name: &str,
        _mime_type: Option<&str>,
    ) -> Option<RawParser> {
        if name != "ntriples" && name != "turtle" && name != "rdfxml" {
            return None;
        }
        let mut inner = self.lock();
        let id = inner.alloc();
        inner.parsers.insert(id, ());
        Some(RawParser(id))
    }

    fn parser_parse_uri_into_model(
        &self,
        parser: RawParser,
        uri: RawUri,
        _base: Option<RawUri>,
        model: RawModel,
    ) -> i32 {
        assert!(
            self.lock().parsers.contains_key(&parser.0),
            "use of freed parser"
        );
        self.model_load(model, uri)
    }

    fn parser_parse_string_into_model(
        &self,
        parser: RawParser,
        text: &str,
        _base: Option<RawUri>,
        model: RawModel,
    ) -> i32 {
        let mut inner = self.lock();
        assert!(inner.parsers.contains_key(&parser.0), "use of freed parser");
        inner.parse_text(text, model.0)
    }

    fn parser_free(&self, parser: RawParser) {
        self.lock()
            .parsers
            .remove(&parser.0)
            .unwrap_or_else(|| panic!("double free of parser {}", parser.0));
    }

    // --- serializer ---
    fn serializer_create(
        &self,
        _world: RawWorld,
        name: &str,
        _mime_type: Option<&str>,
        _type_uri: Option<RawUri>,
    ) -> Option<RawSerializer> {
        let mut inner = self.lock();
        let id = inner.alloc();
        inner.serializers.insert(id, name.to_owned());
        Some(RawSerializer(id))
    }

    fn serializer_model_to_string(
        &self,
        serializer: RawSerializer,
        _base: Option<RawUri>,
        model: RawModel,
    ) -> Option<String> {
        assert!(
            self.lock().serializers.contains_key(&serializer.0),
            "use of freed serializer"
        );
        self.model_to_string(model, None)
    }

    fn serializer_stream_to_string(
        &self,
        serializer: RawSerializer,
        _base: Option<RawUri>,
        stream: RawStream,
    ) -> Option<String> {
        let mut inner = self.lock();
        assert!(
            inner.serializers.contains_key(&serializer.0),
            "use of freed serializer"
        );
        let items = {
            let data = inner
                .streams
                .get_mut(&stream.0)
                .unwrap_or_else(|| panic!("use of freed or unknown stream {}", stream.0));
            let items: Vec<Option<usize>> = data.items[data.pos..].to_vec();
            data.pos = data.items.len();
            items
        };
        let mut lines = Vec::new();
        for item in items {
            let stmt = item?;
            let vals = inner.stmt_vals(stmt);
            let (Some(s), Some(p), Some(o)) = (vals[0].clone(), vals[1].clone(), vals[2].clone())
            else {
                return None;
            };
            lines.push(format_triple(&(s, p, o)));
        }
        Some(lines.join("\n"))
    }

    fn serializer_free(&self, serializer: RawSerializer) {
        self.lock()
            .serializers
            .remove(&serializer.0)
            .unwrap_or_else(|| panic!("double free of serializer {}", serializer.0));
    }

    // --- query ---
    fn query_create(
        &self,
        _world: RawWorld,
        dialect: &str,
        text: &str,
        _base: Option<RawUri>,
    ) -> Option<RawQuery> {
        if dialect != "sparql" && dialect != "rdql" {
            return None;
        }
        let mut inner = self.lock();
        let id = inner.alloc();
        inner.queries.insert(id, text.to_owned());
        Some(RawQuery(id))
    }

    fn query_free(&self, query: RawQuery) {
        self.lock()
            .queries
            .remove(&query.0)
            .unwrap_or_else(|| panic!("double free of query {}", query.0));
    }

    // --- query results cursor ---
    fn results_is_bindings(&self, results: RawQueryResults) -> bool {
        matches!(
            self.lock().results.get(&results.0),
            Some(ResultsData::Bindings { .. })
        )
    }

    fn results_is_boolean(&self, results: RawQueryResults) -> bool {
        matches!(
            self.lock().results.get(&results.0),
            Some(ResultsData::Boolean(_))
        )
    }

    fn results_is_graph(&self, results: RawQueryResults) -> bool {
        matches!(
            self.lock().results.get(&results.0),
            Some(ResultsData::Graph(_))
        )
    }

    fn results_boolean(&self, results: RawQueryResults) -> Option<bool> {
        match self.lock().results.get(&results.0)? {
            ResultsData::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn results_finished(&self, results: RawQueryResults) -> bool {
        match self
            .lock()
            .results
            .get(&results.0)
            .unwrap_or_else(|| panic!("use of freed or unknown results {}", results.0))
        {
            ResultsData::Bindings { rows, pos } => *pos >= rows.len(),
            _ => true,
        }
    }

    fn results_next(&self, results: RawQueryResults) {
        if let Some(ResultsData::Bindings { pos, .. }) = self.lock().results.get_mut(&results.0) {
            *pos += 1;
        }
    }

    fn results_bindings_count(&self, results: RawQueryResults) -> Option<usize> {
        match self.lock().results.get(&results.0)? {
            ResultsData::Bindings { rows, pos } => rows.get(*pos).map(Vec::len),
            _ => None,
        }
    }

    fn results_binding_name(&self, results: RawQueryResults, index: usize) -> Option<String> {
        match self.lock().results.get(&results.0)? {
            ResultsData::Bindings { rows, pos } => {
                rows.get(*pos)?.get(index).map(|(name, _)| name.clone())
            }
            _ => None,
        }
    }

    fn results_binding_value(&self, results: RawQueryResults, index: usize) -> Option<RawNode> {
        let mut inner = self.lock();
        let value = match inner.results.get(&results.0)? {
            ResultsData::Bindings { rows, pos } => rows.get(*pos)?.get(index)?.1.clone(),
            _ => return None,
        };
        Some(RawNode(inner.alloc_node(value)))
    }

    fn results_as_stream(&self, results: RawQueryResults) -> Option<RawStream> {
        let mut inner = self.lock();
        let triples = match inner.results.get(&results.0)? {
            ResultsData::Graph(triples) => triples.clone(),
            _ => return None,
        };
        Some(RawStream(inner.stream_from_triples(triples)))
    }

    fn results_to_string(
        &self,
        results: RawQueryResults,
        format: &str,
        _base: Option<RawUri>,
    ) -> Option<String> {
        match self.lock().results.get(&results.0)? {
            ResultsData::Boolean(b) => Some(format!("{format}: boolean={b}")),
            ResultsData::Bindings { rows, .. } => {
                let mut out = format!("{format}: bindings\n");
                for row in rows {
                    let line = row
                        .iter()
                        .map(|(name, value)| format!("{name}={}", format_term(value)))
                        .collect::<Vec<_>>()
                        .join(" ");
                    out.push_str(&line);
                    out.push('\n');
                }
                Some(out)
            }
            ResultsData::Graph(_) => None,
        }
    }

    fn results_free(&self, results: RawQueryResults) {
        self.lock()
            .results
            .remove(&results.0)
            .unwrap_or_else(|| panic!("double free of results {}", results.0));
    }
}

/// A complete (resource, resource, literal) statement.
pub fn literal_triple(world: &World, s: &str, p: &str, o: &str) -> redland::Statement {
    redland::Statement::from_nodes(
        world,
        redland::Node::from_uri_string(world, s).expect("subject"),
        redland::Node::from_uri_string(world, p).expect("predicate"),
        redland::Node::literal(world, o, None).expect("object"),
    )
    .expect("statement")
}

/// Poll `condition` until it holds or a short deadline passes.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
