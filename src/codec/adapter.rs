// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the host value adapter, the seam that keeps the structure codec agnostic of
//! the in-memory representation structures decode into and encode from.

use crate::codec::value::{FieldValue, Struct, Value};
use crate::types::{encoding::EncodingResult, status_code::StatusCode};

/// Converts between wire values and a host structure representation.
///
/// The codec algorithm never touches a host structure directly. Decoded wire values pass
/// through `scalar_from_wire` / `array_from_wire` into host members and a finished member
/// list through `structure`; on encode, `members` takes the structure apart and
/// `scalar_to_wire` / `array_to_wire` turn each member back into wire values.
///
/// The wire-to-host hooks are total: every wire value the codec can produce for a schema
/// must convert. The host-to-wire hooks may fail, a malformed host member is an encoding
/// error rather than a panic.
pub trait StructureAdapter {
    /// The host representation of a decoded structure.
    type Structure;
    /// The host representation of one structure member.
    type Member;

    /// Assembles a host structure from the decoded members, in schema order with any
    /// length-carrier members already removed.
    fn structure(&self, name: &str, members: Vec<(String, Self::Member)>) -> Self::Structure;

    /// Takes a host structure apart into its named members for encoding.
    fn members(&self, value: &Self::Structure) -> Vec<(String, Self::Member)>;

    /// Converts a decoded scalar wire value into a host member.
    fn scalar_from_wire(
        &self,
        name: &str,
        value: FieldValue<Self::Structure>,
        type_name: &str,
    ) -> Self::Member;

    /// Converts a decoded element sequence into a host member. `None` is a null array.
    fn array_from_wire(
        &self,
        name: &str,
        values: Option<Vec<FieldValue<Self::Structure>>>,
        type_name: &str,
    ) -> Self::Member;

    /// Converts a host member back into a scalar wire value.
    fn scalar_to_wire(
        &self,
        member: &Self::Member,
        type_name: &str,
    ) -> EncodingResult<FieldValue<Self::Structure>>;

    /// Converts a host member back into an element sequence, `None` for a null array.
    fn array_to_wire(
        &self,
        member: &Self::Member,
        type_name: &str,
    ) -> EncodingResult<Option<Vec<FieldValue<Self::Structure>>>>;
}

/// The identity adapter. Structures stay in the dynamic `Struct` representation and
/// members stay as wire values, so any schema can be decoded without a concrete host
/// type existing for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicAdapter;

impl StructureAdapter for DynamicAdapter {
    type Structure = Struct;
    type Member = Value;

    fn structure(&self, name: &str, members: Vec<(String, Value)>) -> Struct {
        Struct::with_members(name, members)
    }

    fn members(&self, value: &Struct) -> Vec<(String, Value)> {
        value.members().cloned().collect()
    }

    fn scalar_from_wire(&self, _name: &str, value: Value, _type_name: &str) -> Value {
        value
    }

    fn array_from_wire(&self, _name: &str, values: Option<Vec<Value>>, _type_name: &str) -> Value {
        FieldValue::Array(values)
    }

    fn scalar_to_wire(&self, member: &Value, _type_name: &str) -> EncodingResult<Value> {
        Ok(member.clone())
    }

    fn array_to_wire(&self, member: &Value, type_name: &str) -> EncodingResult<Option<Vec<Value>>> {
        match member {
            FieldValue::Array(values) => Ok(values.clone()),
            _ => {
                error!("Member is not an array of {}, cannot encode", type_name);
                Err(StatusCode::BadEncodingError)
            }
        }
    }
}
