//! Declared attributes for exporters.

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;

use super::value::AttributeType;
use crate::error::{Error, Result};

/// Which elements a declared attribute applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeCategory {
    /// The graph itself.
    Graph,
    /// Vertices.
    Node,
    /// Edges.
    Edge,
    /// Every element.
    All,
}

impl AttributeCategory {
    /// Lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            AttributeCategory::Graph => "graph",
            AttributeCategory::Node => "node",
            AttributeCategory::Edge => "edge",
            AttributeCategory::All => "all",
        }
    }
}

impl fmt::Display for AttributeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributeCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(AttributeCategory::Graph),
            "node" | "vertex" => Ok(AttributeCategory::Node),
            "edge" => Ok(AttributeCategory::Edge),
            "all" => Ok(AttributeCategory::All),
            _ => Err(Error::IllegalArgument(format!(
                "unknown attribute category {s:?}"
            ))),
        }
    }
}

/// One declared attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegisteredAttribute {
    /// Attribute key.
    pub name: String,
    /// Elements the attribute applies to.
    pub category: AttributeCategory,
    /// Declared value type.
    pub attr_type: AttributeType,
    /// Value used when an element lacks the attribute.
    pub default: Option<String>,
}

impl RegisteredAttribute {
    /// Build a declaration. Only scalar and string types may be declared.
    pub fn new(
        name: impl Into<String>,
        category: AttributeCategory,
        attr_type: AttributeType,
        default: Option<String>,
    ) -> Result<Self> {
        match attr_type {
            AttributeType::Boolean
            | AttributeType::Int
            | AttributeType::Long
            | AttributeType::Float
            | AttributeType::Double
            | AttributeType::String => {}
            other => {
                return Err(Error::IllegalArgument(format!(
                    "attribute type {other} cannot be declared"
                )))
            }
        }
        Ok(Self {
            name: name.into(),
            category,
            attr_type,
            default,
        })
    }
}

/// Ordered list of declared attributes.
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    entries: RwLock<Vec<RegisteredAttribute>>,
}

impl AttributeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration. Duplicates are kept.
    pub fn register(&self, attribute: RegisteredAttribute) {
        self.entries.write().push(attribute);
    }

    /// Remove the first declaration equal to `attribute`.
    pub fn unregister(&self, attribute: &RegisteredAttribute) -> Result<()> {
        let mut entries = self.entries.write();
        let index = entries
            .iter()
            .position(|a| a == attribute)
            .ok_or_else(|| {
                Error::NoSuchElement(format!(
                    "attribute {} ({}, {}) is not registered",
                    attribute.name, attribute.category, attribute.attr_type
                ))
            })?;
        entries.remove(index);
        Ok(())
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the declarations in registration order.
    pub fn attributes(&self) -> Vec<RegisteredAttribute> {
        self.entries.read().clone()
    }

    /// Declarations that apply to `category`, including those for all elements.
    pub fn for_category(&self, category: AttributeCategory) -> Vec<RegisteredAttribute> {
        self.entries
            .read()
            .iter()
            .filter(|a| a.category == category || a.category == AttributeCategory::All)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight() -> RegisteredAttribute {
        RegisteredAttribute::new(
            "weight",
            AttributeCategory::Edge,
            AttributeType::Double,
            Some("1.0".into()),
        )
        .unwrap()
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = AttributeRegistry::new();
        registry.register(weight());
        registry.register(weight());
        assert_eq!(registry.len(), 2);

        registry.unregister(&weight()).unwrap();
        assert_eq!(registry.len(), 1);
        registry.unregister(&weight()).unwrap();
        assert!(registry.is_empty());

        let err = registry.unregister(&weight()).unwrap_err();
        assert_eq!(err.status(), crate::Status::NoSuchElement);
    }

    #[test]
    fn test_default_is_part_of_identity() {
        let registry = AttributeRegistry::new();
        registry.register(weight());
        let mut other = weight();
        other.default = None;
        assert!(registry.unregister(&other).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_category_filter() {
        let registry = AttributeRegistry::new();
        registry.register(weight());
        registry.register(
            RegisteredAttribute::new("label", AttributeCategory::All, AttributeType::String, None)
                .unwrap(),
        );
        let nodes = registry.for_category(AttributeCategory::Node);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "label");
        assert_eq!(registry.for_category(AttributeCategory::Edge).len(), 2);
    }

    #[test]
    fn test_parse_category_and_reject_types() {
        assert_eq!(
            "Node".parse::<AttributeCategory>().unwrap(),
            AttributeCategory::Node
        );
        assert!("face".parse::<AttributeCategory>().is_err());
        assert!(
            RegisteredAttribute::new("x", AttributeCategory::All, AttributeType::Html, None)
                .is_err()
        );
    }
}
