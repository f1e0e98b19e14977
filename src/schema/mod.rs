// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the in-memory model of a binary schema description, i.e. the named, ordered field
//! lists that drive the structure codec. Parsing the external XML form of a schema is out of
//! scope; a schema arrives here already parsed, e.g. deserialized with serde or built in code.

use std::fmt;

/// The OPC UA namespace. Types qualified with this namespace are built-ins.
pub const OPC_UA_NAMESPACE: &str = "http://opcfoundation.org/UA/";

/// The binary schema namespace. Types qualified with this namespace are also built-ins.
pub const OPC_BINARY_SCHEMA_NAMESPACE: &str = "http://opcfoundation.org/BinarySchema/";

/// A type name qualified by the URI of the namespace that defines it.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Serialize, Deserialize)]
pub struct QualifiedTypeName {
    pub namespace_uri: String,
    pub name: String,
}

impl fmt::Display for QualifiedTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace_uri, self.name)
    }
}

impl QualifiedTypeName {
    pub fn new<S, T>(namespace_uri: S, name: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        QualifiedTypeName {
            namespace_uri: namespace_uri.into(),
            name: name.into(),
        }
    }

    /// Tests if the name is qualified with one of the well known namespaces whose types
    /// are built-ins rather than dictionary entries.
    pub fn is_builtin_namespace(&self) -> bool {
        self.namespace_uri == OPC_UA_NAMESPACE || self.namespace_uri == OPC_BINARY_SCHEMA_NAMESPACE
    }
}

/// The comparison operator applied between a switch field's value and a field's switch value
/// to decide whether the field is present on the wire.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SwitchOperand {
    Equals,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl SwitchOperand {
    /// Applies the comparison. Both operands are widened to signed 64-bit before any
    /// switch comparison regardless of the declared width of the switch field.
    pub fn compare(&self, switch_field_value: i64, switch_value: i64) -> bool {
        match self {
            SwitchOperand::Equals => switch_field_value == switch_value,
            SwitchOperand::NotEqual => switch_field_value != switch_value,
            SwitchOperand::GreaterThan => switch_field_value > switch_value,
            SwitchOperand::GreaterThanOrEqual => switch_field_value >= switch_value,
            SwitchOperand::LessThan => switch_field_value < switch_value,
            SwitchOperand::LessThanOrEqual => switch_field_value <= switch_value,
        }
    }
}

/// A single field of a structured type.
///
/// A field is a scalar unless `length` or `length_field` is set, in which case it is an
/// array with either a literal element count or a count held by the named sibling field.
/// A field with a `switch_field` is optional; it is only on the wire when the named
/// sibling's value satisfies the switch comparison.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FieldType {
    /// Field name, unique within its structured type.
    pub name: String,
    /// The qualified name of the field's data type.
    pub type_name: QualifiedTypeName,
    /// Literal array length.
    pub length: Option<u32>,
    /// Name of the sibling field holding the array length at runtime.
    pub length_field: Option<String>,
    /// Length is a byte count rather than an element count. Not supported, always an error.
    pub is_length_in_bytes: bool,
    /// Name of the sibling field that gates this field's presence.
    pub switch_field: Option<String>,
    /// Value the switch field is compared against. Defaults to 1.
    pub switch_value: Option<i64>,
    /// Comparison operator for the switch. Defaults to equals.
    pub switch_operand: Option<SwitchOperand>,
}

impl FieldType {
    /// A scalar field of the nominated type.
    pub fn scalar<S: Into<String>>(name: S, type_name: QualifiedTypeName) -> Self {
        FieldType {
            name: name.into(),
            type_name,
            length: None,
            length_field: None,
            is_length_in_bytes: false,
            switch_field: None,
            switch_value: None,
            switch_operand: None,
        }
    }

    /// An array field with a literal element count.
    pub fn array<S: Into<String>>(name: S, type_name: QualifiedTypeName, length: u32) -> Self {
        FieldType {
            length: Some(length),
            ..Self::scalar(name, type_name)
        }
    }

    /// An array field whose element count is held by the named sibling field.
    pub fn array_with_length_field<S: Into<String>, L: Into<String>>(
        name: S,
        type_name: QualifiedTypeName,
        length_field: L,
    ) -> Self {
        FieldType {
            length_field: Some(length_field.into()),
            ..Self::scalar(name, type_name)
        }
    }

    /// Makes the field optional, present only when the sibling named by `switch_field`
    /// satisfies the comparison. A switch value of `None` defaults to 1 and an operand
    /// of `None` defaults to equals.
    pub fn with_switch<S: Into<String>>(
        mut self,
        switch_field: S,
        switch_value: Option<i64>,
        switch_operand: Option<SwitchOperand>,
    ) -> Self {
        self.switch_field = Some(switch_field.into());
        self.switch_value = switch_value;
        self.switch_operand = switch_operand;
        self
    }

    /// Tests if this is an array field, i.e. carries either form of length.
    pub fn is_array(&self) -> bool {
        self.length.is_some() || self.length_field.is_some()
    }
}

/// A named, ordered sequence of fields describing a structured type's wire layout.
///
/// Order is load-bearing. It is both the binary layout order and the evaluation order; any
/// field referenced by another field's `length_field` or `switch_field` must precede the
/// referencing field. The codec trusts declaration order and does not sort or validate it.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StructuredType {
    pub name: String,
    pub fields: Vec<FieldType>,
}

impl StructuredType {
    pub fn new<S: Into<String>>(name: S, fields: Vec<FieldType>) -> Self {
        StructuredType {
            name: name.into(),
            fields,
        }
    }
}

/// An enumerated type, backed by a plain integer on the wire.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EnumeratedType {
    pub name: String,
    /// Width of the integer encoding in bits.
    pub length_in_bits: u32,
}

impl EnumeratedType {
    pub fn new<S: Into<String>>(name: S, length_in_bits: u32) -> Self {
        EnumeratedType {
            name: name.into(),
            length_in_bits,
        }
    }
}

/// A type description registered in a type dictionary.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum TypeDescription {
    Structured(StructuredType),
    Enumerated(EnumeratedType),
}

impl TypeDescription {
    pub fn name(&self) -> &str {
        match self {
            TypeDescription::Structured(s) => &s.name,
            TypeDescription::Enumerated(e) => &e.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_operand_comparisons() {
        assert!(SwitchOperand::Equals.compare(2, 2));
        assert!(!SwitchOperand::Equals.compare(3, 2));
        assert!(SwitchOperand::NotEqual.compare(3, 2));
        assert!(SwitchOperand::GreaterThan.compare(3, 2));
        assert!(!SwitchOperand::GreaterThan.compare(2, 2));
        assert!(SwitchOperand::GreaterThanOrEqual.compare(2, 2));
        assert!(SwitchOperand::LessThan.compare(-1, 0));
        assert!(SwitchOperand::LessThanOrEqual.compare(0, 0));
    }

    #[test]
    fn builtin_namespace() {
        assert!(QualifiedTypeName::new(OPC_UA_NAMESPACE, "Int32").is_builtin_namespace());
        assert!(QualifiedTypeName::new(OPC_BINARY_SCHEMA_NAMESPACE, "Bit").is_builtin_namespace());
        assert!(!QualifiedTypeName::new("urn:test", "Custom").is_builtin_namespace());
    }

    #[test]
    fn field_kinds() {
        let int32 = QualifiedTypeName::new(OPC_UA_NAMESPACE, "Int32");
        assert!(!FieldType::scalar("a", int32.clone()).is_array());
        assert!(FieldType::array("b", int32.clone(), 4).is_array());
        assert!(FieldType::array_with_length_field("c", int32, "n").is_array());
    }

    #[test]
    fn schema_model_serde() {
        let schema = StructuredType::new(
            "Sample",
            vec![
                FieldType::scalar(
                    "Selector",
                    QualifiedTypeName::new(OPC_UA_NAMESPACE, "Int32"),
                ),
                FieldType::scalar(
                    "Detail",
                    QualifiedTypeName::new(OPC_UA_NAMESPACE, "String"),
                )
                .with_switch("Selector", Some(2), None),
            ],
        );
        let s = serde_json::to_string(&schema).unwrap();
        let schema2: StructuredType = serde_json::from_str(&s).unwrap();
        assert_eq!(schema, schema2);
    }
}
