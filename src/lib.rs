//! Safe Rust bindings for the Redland librdf RDF engine.
//!
//! Every operation delegates to the native engine, which owns all RDF
//! semantics: graph storage, parsing grammars, SPARQL execution and
//! serialization formats. This crate contributes the pieces a binding must
//! get right:
//!
//! * **handle ownership** — each wrapper ([`World`], [`Uri`], [`Node`],
//!   [`Statement`], [`Storage`], [`Model`], [`Parser`], [`Serializer`],
//!   [`Query`]) exclusively owns one native resource, released exactly once
//!   through an idempotent explicit `free()` with `Drop` as the fallback;
//! * **result streaming** — native pull-cursors (statement streams, target
//!   iterators, query binding rows) are drained on a dedicated Tokio task
//!   and delivered through a bounded, backpressured channel
//!   ([`ItemStream`]); dropping the consumer cancels the producer and
//!   releases the cursor;
//! * **error surfacing** — allocation and operation failures return
//!   [`RdfError`] synchronously; contract violations inside a draining task
//!   arrive as a typed terminal error on the stream itself.
//!
//! The native call surface is the [`engine::NativeEngine`] trait. With the
//! `redland` cargo feature the crate links the system librdf and
//! `World::open()` uses it; any other implementation can be supplied through
//! [`World::open_with`].
//!
//! ```ignore
//! use redland::{Model, Node, Statement, Storage, World};
//!
//! #[tokio::main]
//! async fn main() -> redland::RdfResult<()> {
//!     let world = World::open()?;
//!     let storage = Storage::new(&world, "memory", "demo", "")?;
//!     let mut model = Model::new(&world, &storage, "")?;
//!
//!     let statement = Statement::from_nodes(
//!         &world,
//!         Node::from_uri_string(&world, "http://example.org/s")?,
//!         Node::from_uri_string(&world, "http://example.org/p")?,
//!         Node::literal(&world, "o", None)?,
//!     )?;
//!     model.add_statement(&statement)?;
//!
//!     let pattern = Statement::new(&world)?;
//!     let mut matches = model.find_statements(&pattern, 16)?;
//!     while let Some(found) = matches.recv().await {
//!         println!("{}", found?.display_string()?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod engine;
mod error;
mod model;
mod node;
mod parser;
mod query;
mod serializer;
mod statement;
mod storage;
pub mod stream;
mod uri;
mod world;

pub use error::{RdfError, RdfResult};
pub use model::Model;
pub use node::{Node, NodeRef};
pub use parser::Parser;
pub use query::{Query, QueryResultItem};
pub use serializer::Serializer;
pub use statement::Statement;
pub use storage::Storage;
pub use stream::ItemStream;
pub use uri::Uri;
pub use world::World;
