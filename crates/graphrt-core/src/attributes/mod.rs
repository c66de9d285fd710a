//! Attribute storage for graph elements.
//!
//! One generic store ([`GraphStore`]) backs every key/value combination; the
//! aliases below name the ones exposed at the C boundary.

pub mod external_ref;
pub mod registry;
pub mod store;
pub mod value;

pub use external_ref::{ExternalRef, RefEquivalence, RefFactory};
pub use registry::{AttributeCategory, AttributeRegistry, RegisteredAttribute};
pub use store::{
    AnyStore, AttrMap, AttributesStore, Element, ElementId, GraphStore, Keys, RefAttributesStore,
    StringRefStore,
};
pub use value::{AttributeType, AttributeValue};
