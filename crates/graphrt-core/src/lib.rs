#![warn(missing_docs)]
//! Handle, attribute and error runtime for a native graph library boundary.
//!
//! Native callers never see Rust objects. They hold opaque handles issued by
//! a [`HandleRegistry`], receive a [`Status`] from every call, and read the
//! failure message from the [`ErrorChannel`] of their [`ThreadContext`].
//!
//! - [`status`]: stable status codes
//! - [`error`]: internal error type and its mapping to status codes
//! - [`context`]: per-thread error channel
//! - [`handle`]: generation-checked handle table
//! - [`strings`]: string marshaling and pinned native buffers
//! - [`attributes`]: per-element attribute stores
//! - [`config`]: runtime configuration and process-wide defaults

pub mod attributes;
pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod status;
pub mod strings;

pub use attributes::{
    AnyStore, AttributeCategory, AttributeRegistry, AttributeType, AttributeValue,
    AttributesStore, Element, ExternalRef, GraphStore, Keys, RefAttributesStore, RefEquivalence,
    RefFactory, RegisteredAttribute, StringRefStore,
};
pub use config::{default_encoding, DefaultEncoding, RuntimeConfig, DEFAULT_ENCODING};
pub use context::{ErrorChannel, ThreadContext};
pub use error::{Error, Result};
pub use handle::{HandleRegistry, RawHandle};
pub use status::Status;
pub use strings::{Encoding, NativeString};
