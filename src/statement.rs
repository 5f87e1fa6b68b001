//! Statement (triple) handles.

use std::fmt;

use crate::engine::RawStatement;
use crate::error::{RdfError, RdfResult};
use crate::node::{Node, NodeRef};
use crate::world::World;

/// An RDF statement: an ordered (subject, predicate, object) triple.
///
/// Any slot may be unset; such a *partial* statement is used as a pattern
/// for [`Model::find_statements`](crate::Model::find_statements). A
/// statement is *complete* when all three slots are set.
///
/// Nodes are moved into a statement (by [`Statement::from_nodes`] or the
/// slot setters) and are freed together with it; they must not be released
/// separately once attached. Slot getters return borrowed [`NodeRef`] views.
pub struct Statement {
    world: World,
    raw: Option<RawStatement>,
}

impl Statement {
    /// Selects the subject slot for [`Statement::encode_parts`].
    pub const PART_SUBJECT: u32 = 1;
    /// Selects the predicate slot for [`Statement::encode_parts`].
    pub const PART_PREDICATE: u32 = 1 << 1;
    /// Selects the object slot for [`Statement::encode_parts`].
    pub const PART_OBJECT: u32 = 1 << 2;
    /// Selects all three slots.
    pub const PART_ALL: u32 =
        Self::PART_SUBJECT | Self::PART_PREDICATE | Self::PART_OBJECT;

    /// Construct an empty (fully unset) statement.
    pub fn new(world: &World) -> RdfResult<Statement> {
        let raw = world
            .engine()
            .statement_create(world.raw()?)
            .ok_or(RdfError::Allocation { what: "statement" })?;
        Ok(Statement::from_raw(world.clone(), raw))
    }

    /// Construct a complete statement, taking ownership of the nodes.
    pub fn from_nodes(
        world: &World,
        subject: Node,
        predicate: Node,
        object: Node,
    ) -> RdfResult<Statement> {
        let raw_world = world.raw()?;
        let s = subject.into_raw()?;
        let p = predicate.into_raw()?;
        let o = object.into_raw()?;
        let raw = world
            .engine()
            .statement_from_nodes(raw_world, s, p, o)
            .ok_or(RdfError::Allocation { what: "statement" })?;
        Ok(Statement::from_raw(world.clone(), raw))
    }

    /// Decode a statement from the engine's binary encoding, also
    /// recovering the context node when the encoding carries one.
    pub fn decode_with_context(
        world: &World,
        encoded: &[u8],
    ) -> RdfResult<(Statement, Option<Node>)> {
        let statement = Statement::new(world)?;
        let context = world
            .engine()
            .statement_decode_with_context(world.raw()?, statement.raw()?, encoded)
            .ok_or_else(|| {
                RdfError::operation("statement decode", "engine rejected encoded form")
            })?;
        let context = context.map(|n| Node::from_raw(world.clone(), n));
        Ok((statement, context))
    }

    /// Decode a statement from the engine's binary encoding.
    pub fn decode(world: &World, encoded: &[u8]) -> RdfResult<Statement> {
        let statement = Statement::new(world)?;
        let ok = world
            .engine()
            .statement_decode(world.raw()?, statement.raw()?, encoded);
        if ok {
            Ok(statement)
        } else {
            Err(RdfError::operation(
                "statement decode",
                "engine rejected encoded form",
            ))
        }
    }

    /// Deep-copy this statement (nodes included) into a new handle.
    pub fn duplicate(&self) -> RdfResult<Statement> {
        let raw = self
            .world
            .engine()
            .statement_clone(self.raw()?)
            .ok_or(RdfError::Allocation { what: "statement" })?;
        Ok(Statement::from_raw(self.world.clone(), raw))
    }

    /// Unset all three slots, freeing the attached nodes.
    pub fn clear(&mut self) -> RdfResult<()> {
        self.world.engine().statement_clear(self.raw()?);
        Ok(())
    }

    /// Set the subject, taking ownership of `node`.
    pub fn set_subject(&mut self, node: Node) -> RdfResult<()> {
        let raw = self.raw()?;
        self.world
            .engine()
            .statement_set_subject(raw, node.into_raw()?);
        Ok(())
    }

    /// Set the predicate, taking ownership of `node`.
    pub fn set_predicate(&mut self, node: Node) -> RdfResult<()> {
        let raw = self.raw()?;
        self.world
            .engine()
            .statement_set_predicate(raw, node.into_raw()?);
        Ok(())
    }

    /// Set the object, taking ownership of `node`.
    pub fn set_object(&mut self, node: Node) -> RdfResult<()> {
        let raw = self.raw()?;
        self.world
            .engine()
            .statement_set_object(raw, node.into_raw()?);
        Ok(())
    }

    /// The subject slot, as a borrowed view.
    pub fn subject(&self) -> RdfResult<Option<NodeRef<'_>>> {
        let raw = self.raw()?;
        Ok(self
            .world
            .engine()
            .statement_subject(raw)
            .map(|n| NodeRef::new(&self.world, n)))
    }

    /// The predicate slot, as a borrowed view.
    pub fn predicate(&self) -> RdfResult<Option<NodeRef<'_>>> {
        let raw = self.raw()?;
        Ok(self
            .world
            .engine()
            .statement_predicate(raw)
            .map(|n| NodeRef::new(&self.world, n)))
    }

    /// The object slot, as a borrowed view.
    pub fn object(&self) -> RdfResult<Option<NodeRef<'_>>> {
        let raw = self.raw()?;
        Ok(self
            .world
            .engine()
            .statement_object(raw)
            .map(|n| NodeRef::new(&self.world, n)))
    }

    /// Whether subject, predicate and object are all set.
    pub fn is_complete(&self) -> RdfResult<bool> {
        Ok(self.world.engine().statement_is_complete(self.raw()?))
    }

    /// Equality as decided by the native engine.
    pub fn equals(&self, other: &Statement) -> RdfResult<bool> {
        Ok(self
            .world
            .engine()
            .statement_equals(self.raw()?, other.raw()?))
    }

    /// Whether this statement matches `partial` (unset slots in `partial`
    /// are wildcards).
    pub fn matches(&self, partial: &Statement) -> RdfResult<bool> {
        Ok(self
            .world
            .engine()
            .statement_matches(self.raw()?, partial.raw()?))
    }

    /// Encode the statement into the engine's binary form.
    pub fn encode(&self) -> RdfResult<Vec<u8>> {
        self.world
            .engine()
            .statement_encode(self.world.raw()?, self.raw()?)
            .ok_or_else(|| RdfError::operation("statement encode", "engine produced no encoding"))
    }

    /// Encode only the slots selected by the `PART_*` bitmask, together
    /// with an optional context node (e.g. the graph the statement belongs
    /// to). The context node is copied; the caller keeps ownership.
    pub fn encode_parts(&self, context: Option<&Node>, parts: u32) -> RdfResult<Vec<u8>> {
        let context_raw = context.map(|n| n.raw()).transpose()?;
        self.world
            .engine()
            .statement_encode_parts(self.world.raw()?, self.raw()?, context_raw, parts)
            .ok_or_else(|| {
                RdfError::operation("statement encode parts", "engine produced no encoding")
            })
    }

    /// The engine's display form of the statement.
    pub fn display_string(&self) -> RdfResult<String> {
        self.world
            .engine()
            .statement_to_string(self.raw()?)
            .ok_or_else(|| RdfError::operation("statement to string", "engine returned no string"))
    }

    /// Release the native statement and the nodes attached to it.
    /// Idempotent.
    pub fn free(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.world.engine().statement_free(raw);
        }
    }

    pub(crate) fn from_raw(world: World, raw: RawStatement) -> Statement {
        Statement {
            world,
            raw: Some(raw),
        }
    }

    pub(crate) fn raw(&self) -> RdfResult<RawStatement> {
        self.raw.ok_or(RdfError::UseAfterRelease {
            what: "statement",
        })
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_string() {
            Ok(s) => write!(f, "Statement({s})"),
            Err(_) => write!(f, "Statement(<released>)"),
        }
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        self.free();
    }
}
