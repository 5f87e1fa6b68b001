//! Node (graph term) handles and borrowed node views.

use std::fmt;

use crate::engine::RawNode;
use crate::error::{RdfError, RdfResult};
use crate::uri::Uri;
use crate::world::World;

/// A graph term: a URI-identified resource, a literal, or a blank node.
///
/// A `Node` exclusively owns one native node resource. Nodes handed to a
/// [`Statement`](crate::Statement) by value transfer their ownership into
/// the statement; nodes embedded in statements or yielded by iterators are
/// surfaced as borrowed [`NodeRef`] views instead.
pub struct Node {
    world: World,
    raw: Option<RawNode>,
}

impl Node {
    /// Construct a resource node from a URI.
    pub fn from_uri(world: &World, uri: &Uri) -> RdfResult<Node> {
        let raw = world
            .engine()
            .node_from_uri(world.raw()?, uri.raw()?)
            .ok_or(RdfError::Allocation { what: "node" })?;
        Ok(Node::from_raw(world.clone(), raw))
    }

    /// Construct a resource node from a URI string.
    pub fn from_uri_string(world: &World, uri: &str) -> RdfResult<Node> {
        let uri = Uri::new(world, uri)?;
        Node::from_uri(world, &uri)
    }

    /// Construct a plain literal node with an optional language tag.
    pub fn literal(world: &World, value: &str, language: Option<&str>) -> RdfResult<Node> {
        let raw = world
            .engine()
            .node_from_literal(world.raw()?, value, language, false)
            .ok_or(RdfError::Allocation { what: "node" })?;
        Ok(Node::from_raw(world.clone(), raw))
    }

    /// Construct a well-formed-XML literal node.
    pub fn xml_literal(world: &World, value: &str, language: Option<&str>) -> RdfResult<Node> {
        let raw = world
            .engine()
            .node_from_literal(world.raw()?, value, language, true)
            .ok_or(RdfError::Allocation { what: "node" })?;
        Ok(Node::from_raw(world.clone(), raw))
    }

    /// Construct a blank node; the engine generates an identifier if `id`
    /// is `None`.
    pub fn blank(world: &World, id: Option<&str>) -> RdfResult<Node> {
        let raw = world
            .engine()
            .node_blank(world.raw()?, id)
            .ok_or(RdfError::Allocation { what: "node" })?;
        Ok(Node::from_raw(world.clone(), raw))
    }

    /// A borrowed view of this node.
    pub fn view(&self) -> RdfResult<NodeRef<'_>> {
        Ok(NodeRef {
            world: &self.world,
            raw: self.raw()?,
        })
    }

    pub fn is_resource(&self) -> RdfResult<bool> {
        Ok(self.view()?.is_resource())
    }

    pub fn is_literal(&self) -> RdfResult<bool> {
        Ok(self.view()?.is_literal())
    }

    pub fn is_blank(&self) -> RdfResult<bool> {
        Ok(self.view()?.is_blank())
    }

    /// The URI string, when the node is a resource.
    pub fn uri_string(&self) -> RdfResult<Option<String>> {
        Ok(self.view()?.uri_string())
    }

    /// The literal value, when the node is a literal.
    pub fn literal_value(&self) -> RdfResult<Option<String>> {
        Ok(self.view()?.literal_value())
    }

    /// The language tag of the literal value, when one is set.
    pub fn literal_language(&self) -> RdfResult<Option<String>> {
        Ok(self.view()?.literal_language())
    }

    /// The engine's display form of the node (e.g. `<uri>` or `"literal"`).
    pub fn display_string(&self) -> RdfResult<String> {
        self.view()?.display_string()
    }

    /// Equality as decided by the native engine.
    pub fn equals(&self, other: &Node) -> RdfResult<bool> {
        Ok(self
            .world
            .engine()
            .node_equals(self.raw()?, other.raw()?))
    }

    /// Release the native node. Idempotent.
    ///
    /// Not needed for nodes whose ownership was transferred into a
    /// statement; the statement frees them.
    pub fn free(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().node_free(raw);
        }
    }

    pub(crate) fn from_raw(world: World, raw: RawNode) -> Node {
        Node {
            world,
            raw: Some(raw),
        }
    }

    pub(crate) fn raw(&self) -> RdfResult<RawNode> {
        self.raw.ok_or(RdfError::UseAfterRelease { what: "node" })
    }

    /// Take the raw handle out, transferring ownership to the caller.
    pub(crate) fn into_raw(mut self) -> RdfResult<RawNode> {
        self.raw
            .take()
            .ok_or(RdfError::UseAfterRelease { what: "node" })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_string() {
            Ok(s) => write!(f, "Node({s})"),
            Err(_) => write!(f, "Node(<released>)"),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.free();
    }
}

/// A non-owning view of a node embedded in a parent resource (a statement
/// slot or an iteration step). Carries no release obligation; use
/// [`NodeRef::to_owned`] to copy it out for retention beyond the parent's
/// lifetime.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    world: &'a World,
    raw: RawNode,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(world: &'a World, raw: RawNode) -> NodeRef<'a> {
        NodeRef { world, raw }
    }

    pub fn is_resource(&self) -> bool {
        self.world.engine().node_is_resource(self.raw)
    }

    pub fn is_literal(&self) -> bool {
        self.world.engine().node_is_literal(self.raw)
    }

    pub fn is_blank(&self) -> bool {
        self.world.engine().node_is_blank(self.raw)
    }

    pub fn uri_string(&self) -> Option<String> {
        self.world.engine().node_uri_string(self.raw)
    }

    pub fn literal_value(&self) -> Option<String> {
        self.world.engine().node_literal_value(self.raw)
    }

    pub fn literal_language(&self) -> Option<String> {
        self.world.engine().node_literal_language(self.raw)
    }

    pub fn display_string(&self) -> RdfResult<String> {
        self.world
            .engine()
            .node_to_string(self.raw)
            .ok_or_else(|| RdfError::operation("node to string", "engine returned no string"))
    }

    pub fn equals(&self, other: &NodeRef<'_>) -> bool {
        self.world.engine().node_equals(self.raw, other.raw)
    }

    /// Copy the viewed node into an independently owned [`Node`].
    pub fn to_owned(&self) -> RdfResult<Node> {
        let raw = self
            .world
            .engine()
            .node_clone(self.raw)
            .ok_or(RdfError::Allocation { what: "node" })?;
        Ok(Node::from_raw(self.world.clone(), raw))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_string() {
            Ok(s) => write!(f, "NodeRef({s})"),
            Err(_) => write!(f, "NodeRef(?)"),
        }
    }
}
