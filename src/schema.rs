//! Schema types: the wire shape, the form resolver and the verified tree
//!
//! A schema arrives as a [`SerdeSchema`], where every keyword is optional and
//! nothing stops a document from mixing keywords of different forms. Running
//! it through [`Schema::from_serde`] verifies it and produces a [`Schema`],
//! whose [`SchemaShape`] holds exactly one of the eight forms.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};

// =============================================================================
// Wire Shape
// =============================================================================

/// A schema as it appears on the wire.
///
/// Not every `SerdeSchema` is a correct schema. Use [`SerdeSchema::verify`]
/// to check, or [`Schema::from_serde`] to check and convert in one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerdeSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<BTreeMap<String, SerdeSchema>>,

    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,

    /// Raw type tag, kept as a string so unknown tags can be reported
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Box<SerdeSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SerdeSchema>>,

    #[serde(
        default,
        rename = "optionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub optional_properties: Option<BTreeMap<String, SerdeSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Box<SerdeSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<SerdeDiscriminator>,
}

/// The `discriminator` keyword on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerdeDiscriminator {
    #[serde(default)]
    pub tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<BTreeMap<String, SerdeSchema>>,
}

impl SerdeSchema {
    /// The type tag, if the type group is populated. An empty tag counts as absent.
    pub fn type_tag(&self) -> Option<&str> {
        self.type_.as_deref().filter(|t| !t.is_empty())
    }

    /// The discriminator mapping, if the discriminator group is populated
    pub fn discriminator_mapping(&self) -> Option<&BTreeMap<String, SerdeSchema>> {
        self.discriminator.as_ref().and_then(|d| d.mapping.as_ref())
    }

    /// Determine which form this schema takes.
    ///
    /// Groups are scanned in a fixed priority order, so a malformed schema
    /// that populates several groups still resolves to a single form.
    pub fn form(&self) -> Form {
        if self.ref_.is_some() {
            Form::Ref
        } else if self.type_tag().is_some() {
            Form::Type
        } else if self.enum_.is_some() {
            Form::Enum
        } else if self.elements.is_some() {
            Form::Elements
        } else if self.properties.is_some() || self.optional_properties.is_some() {
            Form::Properties
        } else if self.values.is_some() {
            Form::Values
        } else if self.discriminator_mapping().is_some() {
            Form::Discriminator
        } else {
            Form::Empty
        }
    }

    /// Check that this schema is correct, reporting the first problem found
    pub fn verify(&self) -> std::result::Result<(), SchemaError> {
        crate::verify::verify(self)
    }
}

// =============================================================================
// Forms and Types
// =============================================================================

/// The eight forms a correct schema can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Form {
    Empty,
    Ref,
    Type,
    Enum,
    Elements,
    Properties,
    Values,
    Discriminator,
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Form::Empty => "empty",
            Form::Ref => "ref",
            Form::Type => "type",
            Form::Enum => "enum",
            Form::Elements => "elements",
            Form::Properties => "properties",
            Form::Values => "values",
            Form::Discriminator => "discriminator",
        };
        f.write_str(name)
    }
}

/// Primitive type tags accepted by the `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Boolean,
    Number,
    Float32,
    Float64,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    String,
    Timestamp,
}

impl Type {
    pub const ALL: [Type; 14] = [
        Type::Boolean,
        Type::Number,
        Type::Float32,
        Type::Float64,
        Type::Int8,
        Type::Uint8,
        Type::Int16,
        Type::Uint16,
        Type::Int32,
        Type::Uint32,
        Type::Int64,
        Type::Uint64,
        Type::String,
        Type::Timestamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::Number => "number",
            Type::Float32 => "float32",
            Type::Float64 => "float64",
            Type::Int8 => "int8",
            Type::Uint8 => "uint8",
            Type::Int16 => "int16",
            Type::Uint16 => "uint16",
            Type::Int32 => "int32",
            Type::Uint32 => "uint32",
            Type::Int64 => "int64",
            Type::Uint64 => "uint64",
            Type::String => "string",
            Type::Timestamp => "timestamp",
        }
    }

    /// Inclusive bounds for the sized integer types
    pub fn int_range(&self) -> Option<(f64, f64)> {
        match self {
            Type::Int8 => Some((-128.0, 127.0)),
            Type::Uint8 => Some((0.0, 255.0)),
            Type::Int16 => Some((-32768.0, 32767.0)),
            Type::Uint16 => Some((0.0, 65535.0)),
            Type::Int32 => Some((-2147483648.0, 2147483647.0)),
            Type::Uint32 => Some((0.0, 4294967295.0)),
            Type::Int64 => Some((-9223372036854775808.0, 9223372036854775807.0)),
            Type::Uint64 => Some((0.0, 18446744073709551615.0)),
            _ => None,
        }
    }

    /// Whether `instance` satisfies this type
    pub fn accepts(&self, instance: &Value) -> bool {
        match self {
            Type::Boolean => instance.is_boolean(),
            Type::Number | Type::Float32 | Type::Float64 => instance.is_number(),
            Type::String => instance.is_string(),
            Type::Timestamp => instance.as_str().is_some_and(is_rfc3339),
            sized => match (sized.int_range(), instance.as_f64()) {
                (Some((min, max)), Some(n)) => n.fract() == 0.0 && n >= min && n <= max,
                _ => false,
            },
        }
    }
}

/// RFC 3339 `date-time`. chrono also takes a space between date and time,
/// which the grammar does not allow.
fn is_rfc3339(s: &str) -> bool {
    matches!(s.as_bytes().get(10), Some(b'T' | b't')) && DateTime::parse_from_rfc3339(s).is_ok()
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Type {
    type Err = SchemaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Type::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SchemaError::InvalidType(s.to_string()))
    }
}

// =============================================================================
// Verified Schema
// =============================================================================

/// A verified schema.
///
/// Every `ref` in the tree names one of the root's definitions, and every
/// node holds exactly one form.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    definitions: BTreeMap<String, Schema>,
    shape: SchemaShape,
}

/// The content of a verified schema node, one variant per form
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaShape {
    /// Accepts any instance
    Empty,
    /// Name of a root definition
    Ref(String),
    Type(Type),
    Enum(BTreeSet<String>),
    Elements(Box<Schema>),
    /// At least one of the two maps is present. Which ones are present
    /// matters for error reporting on non-object instances.
    Properties {
        required: Option<BTreeMap<String, Schema>>,
        optional: Option<BTreeMap<String, Schema>>,
    },
    Values(Box<Schema>),
    /// Every mapping value is of the properties form
    Discriminator {
        tag: String,
        mapping: BTreeMap<String, Schema>,
    },
}

impl Schema {
    /// Verify a wire schema and convert it into its typed form
    pub fn from_serde(serde: SerdeSchema) -> std::result::Result<Self, SchemaError> {
        serde.verify()?;

        let mut root = serde;
        let definitions = convert_map(root.definitions.take().unwrap_or_default())?;

        Ok(Self {
            definitions,
            shape: SchemaShape::try_from(root)?,
        })
    }

    /// Decode a schema from JSON text and verify it
    pub fn from_json(json: &str) -> Result<Self> {
        let serde: SerdeSchema = serde_json::from_str(json)?;
        Ok(Self::from_serde(serde)?)
    }

    /// Decode a schema from an already-parsed JSON value and verify it
    pub fn from_value(value: Value) -> Result<Self> {
        let serde: SerdeSchema = serde_json::from_value(value)?;
        Ok(Self::from_serde(serde)?)
    }

    fn nested(serde: SerdeSchema) -> std::result::Result<Self, SchemaError> {
        Ok(Self {
            definitions: BTreeMap::new(),
            shape: SchemaShape::try_from(serde)?,
        })
    }

    pub fn form(&self) -> Form {
        self.shape.form()
    }

    pub fn shape(&self) -> &SchemaShape {
        &self.shape
    }

    /// Root definitions. Always empty below the root.
    pub fn definitions(&self) -> &BTreeMap<String, Schema> {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }
}

impl TryFrom<SerdeSchema> for Schema {
    type Error = SchemaError;

    fn try_from(serde: SerdeSchema) -> std::result::Result<Self, Self::Error> {
        Schema::from_serde(serde)
    }
}

impl SchemaShape {
    pub fn form(&self) -> Form {
        match self {
            SchemaShape::Empty => Form::Empty,
            SchemaShape::Ref(_) => Form::Ref,
            SchemaShape::Type(_) => Form::Type,
            SchemaShape::Enum(_) => Form::Enum,
            SchemaShape::Elements(_) => Form::Elements,
            SchemaShape::Properties { .. } => Form::Properties,
            SchemaShape::Values(_) => Form::Values,
            SchemaShape::Discriminator { .. } => Form::Discriminator,
        }
    }
}

fn convert_map(
    map: BTreeMap<String, SerdeSchema>,
) -> std::result::Result<BTreeMap<String, Schema>, SchemaError> {
    map.into_iter()
        .map(|(name, schema)| Ok((name, Schema::nested(schema)?)))
        .collect()
}

/// Takes the populated group in priority order. Callers verify first, so
/// the remaining groups are always empty.
impl TryFrom<SerdeSchema> for SchemaShape {
    type Error = SchemaError;

    fn try_from(serde: SerdeSchema) -> std::result::Result<Self, Self::Error> {
        let form = serde.form();
        let SerdeSchema {
            ref_,
            type_,
            enum_,
            elements,
            properties,
            optional_properties,
            values,
            discriminator,
            ..
        } = serde;

        let shape = match form {
            Form::Empty => SchemaShape::Empty,
            Form::Ref => SchemaShape::Ref(ref_.unwrap_or_default()),
            Form::Type => SchemaShape::Type(type_.unwrap_or_default().parse()?),
            Form::Enum => SchemaShape::Enum(enum_.unwrap_or_default().into_iter().collect()),
            Form::Elements => match elements {
                Some(elements) => SchemaShape::Elements(Box::new(Schema::nested(*elements)?)),
                None => SchemaShape::Empty,
            },
            Form::Properties => SchemaShape::Properties {
                required: properties.map(convert_map).transpose()?,
                optional: optional_properties.map(convert_map).transpose()?,
            },
            Form::Values => match values {
                Some(values) => SchemaShape::Values(Box::new(Schema::nested(*values)?)),
                None => SchemaShape::Empty,
            },
            Form::Discriminator => {
                let SerdeDiscriminator { tag, mapping } = discriminator.unwrap_or_default();
                SchemaShape::Discriminator {
                    tag,
                    mapping: convert_map(mapping.unwrap_or_default())?,
                }
            }
        };

        Ok(shape)
    }
}

impl From<Schema> for SerdeSchema {
    fn from(schema: Schema) -> Self {
        let mut serde = SerdeSchema::from(schema.shape);
        if !schema.definitions.is_empty() {
            serde.definitions = Some(
                schema
                    .definitions
                    .into_iter()
                    .map(|(name, def)| (name, def.into()))
                    .collect(),
            );
        }
        serde
    }
}

impl From<SchemaShape> for SerdeSchema {
    fn from(shape: SchemaShape) -> Self {
        fn back(map: BTreeMap<String, Schema>) -> BTreeMap<String, SerdeSchema> {
            map.into_iter().map(|(k, v)| (k, v.into())).collect()
        }

        match shape {
            SchemaShape::Empty => SerdeSchema::default(),
            SchemaShape::Ref(name) => SerdeSchema {
                ref_: Some(name),
                ..Default::default()
            },
            SchemaShape::Type(ty) => SerdeSchema {
                type_: Some(ty.to_string()),
                ..Default::default()
            },
            SchemaShape::Enum(values) => SerdeSchema {
                enum_: Some(values.into_iter().collect()),
                ..Default::default()
            },
            SchemaShape::Elements(elements) => SerdeSchema {
                elements: Some(Box::new((*elements).into())),
                ..Default::default()
            },
            SchemaShape::Properties { required, optional } => SerdeSchema {
                properties: required.map(back),
                optional_properties: optional.map(back),
                ..Default::default()
            },
            SchemaShape::Values(values) => SerdeSchema {
                values: Some(Box::new((*values).into())),
                ..Default::default()
            },
            SchemaShape::Discriminator { tag, mapping } => SerdeSchema {
                discriminator: Some(SerdeDiscriminator {
                    tag,
                    mapping: Some(back(mapping)),
                }),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(value: Value) -> SerdeSchema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_form_priority() {
        assert_eq!(wire(json!({})).form(), Form::Empty);
        assert_eq!(wire(json!({"ref": "a", "type": "boolean"})).form(), Form::Ref);
        assert_eq!(wire(json!({"type": "boolean", "enum": []})).form(), Form::Type);
        assert_eq!(wire(json!({"enum": [], "elements": {}})).form(), Form::Enum);
        assert_eq!(wire(json!({"elements": {}, "values": {}})).form(), Form::Elements);
        assert_eq!(wire(json!({"optionalProperties": {}, "values": {}})).form(), Form::Properties);
        assert_eq!(
            wire(json!({"values": {}, "discriminator": {"mapping": {}}})).form(),
            Form::Values
        );
        assert_eq!(wire(json!({"discriminator": {"mapping": {}}})).form(), Form::Discriminator);
    }

    #[test]
    fn test_empty_type_and_bare_discriminator_are_absent() {
        assert_eq!(wire(json!({"type": ""})).form(), Form::Empty);
        assert_eq!(wire(json!({"discriminator": {"tag": "t"}})).form(), Form::Empty);
    }

    #[test]
    fn test_type_parsing() {
        for ty in Type::ALL {
            assert_eq!(ty.as_str().parse::<Type>(), Ok(ty));
        }
        assert_eq!(
            "nonsense".parse::<Type>(),
            Err(SchemaError::InvalidType("nonsense".to_string()))
        );
    }

    #[test]
    fn test_sized_integer_acceptance() {
        assert!(Type::Int8.accepts(&json!(-128)));
        assert!(Type::Int8.accepts(&json!(127)));
        assert!(!Type::Int8.accepts(&json!(128)));
        assert!(Type::Uint8.accepts(&json!(1.0)));
        assert!(!Type::Uint8.accepts(&json!(1.5)));
        assert!(!Type::Uint8.accepts(&json!(-1)));
        assert!(Type::Uint64.accepts(&json!(18446744073709551615u64)));
        assert!(!Type::Int32.accepts(&json!("1")));
    }

    #[test]
    fn test_timestamp_acceptance() {
        assert!(Type::Timestamp.accepts(&json!("1985-04-12T23:20:50.52Z")));
        assert!(Type::Timestamp.accepts(&json!("1996-12-19T16:39:57-08:00")));
        assert!(Type::Timestamp.accepts(&json!("1990-12-31T23:59:60Z")));
        assert!(Type::Timestamp.accepts(&json!("1985-04-12t23:20:50Z")));
        assert!(!Type::Timestamp.accepts(&json!("1985-04-12 23:20:50Z")));
        assert!(!Type::Timestamp.accepts(&json!("1985-04-12")));
        assert!(!Type::Timestamp.accepts(&json!(0)));
    }

    #[test]
    fn test_from_serde_keeps_root_definitions_only() {
        let schema = Schema::from_value(json!({
            "definitions": {"a": {"type": "string"}},
            "elements": {"ref": "a"}
        }))
        .unwrap();

        assert_eq!(schema.form(), Form::Elements);
        assert_eq!(schema.definition("a").map(Schema::form), Some(Form::Type));
        match schema.shape() {
            SchemaShape::Elements(inner) => {
                assert!(inner.definitions().is_empty());
                assert_eq!(inner.shape(), &SchemaShape::Ref("a".to_string()));
            }
            other => panic!("Expected Elements, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_back_to_wire() {
        let original = wire(json!({
            "definitions": {"node": {"properties": {"next": {"ref": "node"}}}},
            "discriminator": {
                "tag": "kind",
                "mapping": {"a": {"optionalProperties": {"n": {"type": "uint8"}}}}
            }
        }));
        let schema = Schema::from_serde(original.clone()).unwrap();
        assert_eq!(SerdeSchema::from(schema), original);
    }
}
