// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains `FieldValue`, the wire-level value currency of the structure codec, and
//! `Struct`, the dynamic name/value structure representation used by the default adapter.

use crate::types::{
    byte_string::ByteString, data_value::DataValue, date_time::DateTime,
    diagnostic_info::DiagnosticInfo, expanded_node_id::ExpandedNodeId,
    extension_object::ExtensionObject, guid::Guid, localized_text::LocalizedText,
    node_id::NodeId, qualified_name::QualifiedName, status_code::StatusCode,
    string::{UAString, XmlElement},
    variant::Variant,
};

/// A value as it crosses the wire boundary of the structure codec. One variant per
/// built-in wire kind, plus the integer backing of an enumerated type, a decoded nested
/// structure in the host representation `S`, and a single dimension array of itself
/// where `None` is the protocol's null array (length -1 on the wire).
#[derive(PartialEq, Debug, Clone)]
pub enum FieldValue<S> {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(UAString),
    DateTime(DateTime),
    Guid(Guid),
    ByteString(ByteString),
    XmlElement(XmlElement),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(StatusCode),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    ExtensionObject(ExtensionObject),
    DataValue(DataValue),
    Variant(Variant),
    DiagnosticInfo(DiagnosticInfo),
    /// The integer backing of an enumerated described type.
    Enumeration(i32),
    /// A decoded nested structure of the host representation.
    Structure(S),
    /// A single dimension array. `None` is a null array, distinct from an empty one.
    Array(Option<Vec<FieldValue<S>>>),
}

impl<S> FieldValue<S> {
    /// The value widened to a signed 64-bit integer, if this is an integer-valued
    /// variant. Switch and length field evaluation always happens in signed 64-bit
    /// space regardless of the field's declared width.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::SByte(v) => Some(i64::from(*v)),
            FieldValue::Byte(v) => Some(i64::from(*v)),
            FieldValue::Int16(v) => Some(i64::from(*v)),
            FieldValue::UInt16(v) => Some(i64::from(*v)),
            FieldValue::Int32(v) => Some(i64::from(*v)),
            FieldValue::UInt32(v) => Some(i64::from(*v)),
            FieldValue::Int64(v) => Some(*v),
            FieldValue::UInt64(v) => Some(*v as i64),
            FieldValue::Enumeration(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

/// A dynamically shaped structure, i.e. a type name and an ordered list of named members.
/// This is the decoded form produced by the default adapter when no concrete host struct
/// exists for a schema.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Struct {
    /// The name of the structured type this value conforms to.
    pub type_name: String,
    members: Vec<(String, Value)>,
}

/// The wire value currency of the dynamic representation.
pub type Value = FieldValue<Struct>;

impl Struct {
    pub fn new<S: Into<String>>(type_name: S) -> Self {
        Struct {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_members<S: Into<String>>(type_name: S, members: Vec<(String, Value)>) -> Self {
        Struct {
            type_name: type_name.into(),
            members,
        }
    }

    /// Fetches a member by name.
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Inserts a member, replacing in place any member with the same name so that the
    /// declaration order of the remaining members is preserved.
    pub fn insert<S: Into<String>>(&mut self, name: S, value: Value) -> &mut Self {
        let name = name.into();
        if let Some(entry) = self.members.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.members.push((name, value));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &(String, Value)> {
        self.members.iter()
    }

    pub fn into_members(self) -> Vec<(String, Value)> {
        self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_i64_widens_integers() {
        let v: Value = FieldValue::Byte(0xff);
        assert_eq!(v.as_i64(), Some(255));
        let v: Value = FieldValue::Int16(-2);
        assert_eq!(v.as_i64(), Some(-2));
        let v: Value = FieldValue::UInt32(u32::MAX);
        assert_eq!(v.as_i64(), Some(4294967295));
        let v: Value = FieldValue::Enumeration(3);
        assert_eq!(v.as_i64(), Some(3));
        let v: Value = FieldValue::String(UAString::from("nope"));
        assert_eq!(v.as_i64(), None);
    }

    #[test]
    fn struct_insert_preserves_order() {
        let mut s = Struct::new("Test");
        s.insert("a", FieldValue::Int32(1));
        s.insert("b", FieldValue::Int32(2));
        s.insert("a", FieldValue::Int32(3));
        let names: Vec<_> = s.members().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(s.member("a"), Some(&FieldValue::Int32(3)));
    }
}
