//! Attribute schema of the `multirotate_set` resource.

use std::fmt;

use itertools::Itertools;

/// Resource type name reported to the orchestrator.
pub const RESOURCE_TYPE: &str = "multirotate_set";

// Must render `types::DEFAULT_COUNT`.
const DEFAULT_COUNT_TEXT: &str = "2";

/// How an attribute gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Must be declared.
    Required,
    /// May be declared, otherwise takes the default.
    Optional { default: &'static str },
    /// May be declared, otherwise computed.
    OptionalComputed,
    /// Always computed.
    Computed,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Optional { default } => write!(f, "optional, default {default}"),
            Self::OptionalComputed => write!(f, "optional, computed"),
            Self::Computed => write!(f, "computed"),
        }
    }
}

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Int64,
    /// Ordered list of nested objects.
    List(&'static [Attribute]),
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int64 => write!(f, "int64"),
            Self::List(nested) => {
                write!(f, "list({})", nested.iter().map(|a| a.name).join(", "))
            }
        }
    }
}

/// One attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: AttributeKind,
    pub ty: AttributeType,
}

/// Full resource schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.type_name)?;
        writeln!(f, "  {}", self.description)?;
        for attribute in &self.attributes {
            writeln!(
                f,
                "  {:<16} {:<40} {} ({})",
                attribute.name, attribute.ty, attribute.description, attribute.kind
            )?;
        }
        Ok(())
    }
}

const SLOT_ATTRIBUTES: &[Attribute] = &[
    Attribute {
        name: "creation",
        description: "Creation time",
        kind: AttributeKind::Computed,
        ty: AttributeType::String,
    },
    Attribute {
        name: "expiration",
        description: "Expiration time",
        kind: AttributeKind::Computed,
        ty: AttributeType::String,
    },
    Attribute {
        name: "version",
        description: "Version the slot was created with",
        kind: AttributeKind::Computed,
        ty: AttributeType::String,
    },
];

/// The `multirotate_set` schema.
pub fn resource_schema() -> Schema {
    Schema {
        type_name: RESOURCE_TYPE,
        description: "A fixed-size set of objects rotated on a regular period, staggered so \
                      one is always furthest from expiring.",
        attributes: vec![
            Attribute {
                name: "rotation_period",
                description: "Rotation period as a duration string, e.g. 1h30m",
                kind: AttributeKind::Required,
                ty: AttributeType::String,
            },
            Attribute {
                name: "count",
                description: "Number of slots to rotate; fixed after creation",
                kind: AttributeKind::Optional {
                    default: DEFAULT_COUNT_TEXT,
                },
                ty: AttributeType::Int64,
            },
            Attribute {
                name: "version",
                description: "Version stamped onto newly rotated slots",
                kind: AttributeKind::Optional { default: "\"\"" },
                ty: AttributeType::String,
            },
            Attribute {
                name: "now",
                description: "Evaluation instant, RFC 3339",
                kind: AttributeKind::OptionalComputed,
                ty: AttributeType::String,
            },
            Attribute {
                name: "slots",
                description: "The rotating slots",
                kind: AttributeKind::Computed,
                ty: AttributeType::List(SLOT_ATTRIBUTES),
            },
            Attribute {
                name: "last_rotate",
                description: "Start of the most recently assigned rotation period",
                kind: AttributeKind::Computed,
                ty: AttributeType::String,
            },
            Attribute {
                name: "current_index",
                description: "Index of the slot expiring furthest out",
                kind: AttributeKind::Computed,
                ty: AttributeType::Int64,
            },
        ],
    }
}
