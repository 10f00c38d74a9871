//! Typed document model and query builder for Aidbox-style FHIR backends.
//!
//! - [`Node`] is the ordered field map shared by resources and embedded
//!   objects, with key, index and path access.
//! - [`Reference`] names a resource, locally by type and id or externally by
//!   URL. Reference-shaped JSON objects are promoted to references when a
//!   node is built ([`is_reference`]).
//! - [`serialize()`] projects a node graph to wire JSON; nested references keep
//!   only their root keys.
//! - [`SearchSet`] is an immutable query-parameter builder.
//! - [`Client`] and [`BlockingClient`] run the network-bound operations
//!   against any [`Transport`].

pub mod blocking;
pub mod bundle;
pub mod cache;
pub mod client;
pub mod element;
pub mod error;
pub mod node;
pub mod path;
pub mod reference;
pub mod search;
pub mod serialize;
pub mod transport;

pub use blocking::{BlockingClient, ResourceIter};
pub use bundle::Page;
pub use cache::ResourceCache;
pub use client::Client;
pub use element::Element;
pub use error::{Error, ErrorCategory, Result};
pub use node::Node;
pub use path::PathSegment;
pub use reference::{Reference, ReferenceBuilder, ReferenceTarget, is_reference};
pub use search::{Include, IncludeModifier, SearchSet};
pub use serialize::{serialize, serialize_reference};
pub use transport::{DynTransport, Method, Request, Transport};
