// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the schema-driven structure codec. The codec walks a structured type's
//! ordered field list and a binary stream in lockstep, resolving inter-field
//! dependencies (array lengths held by sibling fields, optional fields gated by sibling
//! switch fields, packed bit fields) and dispatching each field either to a built-in
//! wire routine or, through the type dictionary, to the codec of another registered
//! type.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::codec::{
    adapter::StructureAdapter,
    builtin::BuiltinType,
    dictionary::EncodingContext,
    stream::{BitReader, BitWriter},
    value::FieldValue,
};
use crate::schema::{FieldType, StructuredType, SwitchOperand, TypeDescription};
use crate::types::{
    encoding::{BinaryEncoder, EncodingResult},
    status_code::StatusCode,
};

/// How a field's type is reached, resolved once at codec construction so no string
/// branching happens per call.
#[derive(Debug, Clone, PartialEq)]
enum FieldDispatch {
    /// The type is a built-in wire kind.
    Builtin(BuiltinType),
    /// The type must be resolved through the type dictionary of its namespace.
    Described { namespace_uri: String, name: String },
}

/// Encodes and decodes values of one structured type, driven by its schema.
///
/// A codec is constructed once per schema and is immutable afterwards; a single
/// instance may be used concurrently on distinct streams. The adapter converts between
/// wire values and whatever in-memory representation the host uses for structures.
pub struct StructureCodec<A: StructureAdapter> {
    schema: StructuredType,
    adapter: A,
    /// Parallel to `schema.fields`.
    dispatch: Vec<FieldDispatch>,
    /// Field name to index in `schema.fields`.
    field_index: HashMap<String, usize>,
    /// Length field name to the index of the array field that declares it. Members named
    /// here are synthetic, hidden on decode and synthesized on encode.
    length_fields: HashMap<String, usize>,
}

impl<A: StructureAdapter> StructureCodec<A> {
    pub fn new(schema: StructuredType, adapter: A) -> Self {
        let dispatch = schema
            .fields
            .iter()
            .map(|field| {
                match BuiltinType::from_name(&field.type_name.name) {
                    Some(builtin) if field.type_name.is_builtin_namespace() => {
                        FieldDispatch::Builtin(builtin)
                    }
                    _ => FieldDispatch::Described {
                        namespace_uri: field.type_name.namespace_uri.clone(),
                        name: field.type_name.name.clone(),
                    },
                }
            })
            .collect();
        let field_index = schema
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.name.clone(), idx))
            .collect();
        let length_fields = schema
            .fields
            .iter()
            .enumerate()
            .filter_map(|(idx, field)| {
                field.length_field.as_ref().map(|name| (name.clone(), idx))
            })
            .collect();
        StructureCodec {
            schema,
            adapter,
            dispatch,
            field_index,
            length_fields,
        }
    }

    pub fn schema(&self) -> &StructuredType {
        &self.schema
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Decodes one value of this type from the stream.
    pub fn decode(
        &self,
        ctx: &EncodingContext<'_, A>,
        stream: &mut dyn Read,
    ) -> EncodingResult<A::Structure> {
        let mut reader = BitReader::new(stream);
        let mut members: Vec<(String, A::Member)> = Vec::with_capacity(self.schema.fields.len());

        for (idx, field) in self.schema.fields.iter().enumerate() {
            if !self.switch_satisfied(field, &members, StatusCode::BadDecodingError)? {
                // The field contributes no bytes and no member
                continue;
            }
            let dispatch = &self.dispatch[idx];
            let type_name = field.type_name.name.as_str();
            if !field.is_array() {
                let value = self.decode_scalar(ctx, &mut reader, field, dispatch)?;
                let member = self.adapter.scalar_from_wire(&field.name, value, type_name);
                members.push((field.name.clone(), member));
            } else {
                if field.is_length_in_bytes {
                    error!(
                        "Field {} of {} declares its length in bytes, which is not supported",
                        field.name, self.schema.name
                    );
                    return Err(StatusCode::BadDecodingError);
                }
                let count =
                    self.element_count(field, &members, StatusCode::BadDecodingError)?;
                let member = if *dispatch == FieldDispatch::Builtin(BuiltinType::Bit) {
                    if count > ctx.options().max_array_length as i64 {
                        error!(
                            "Field {} of {} has a bit count {} that exceeds the decoding limit {}",
                            field.name,
                            self.schema.name,
                            count,
                            ctx.options().max_array_length
                        );
                        return Err(StatusCode::BadEncodingLimitsExceeded);
                    }
                    // Bits accumulate into one integer member, LSB first. Bits past the
                    // accumulator width are consumed but not representable
                    let mut accumulator = 0i64;
                    for i in 0..count {
                        let bit = i64::from(reader.read_bit()?);
                        if i < 64 {
                            accumulator |= bit << i;
                        }
                    }
                    self.adapter.scalar_from_wire(
                        &field.name,
                        FieldValue::Int32(accumulator as i32),
                        type_name,
                    )
                } else if count < 0 {
                    // A negative length is a null array, distinct from an empty one
                    self.adapter.array_from_wire(&field.name, None, type_name)
                } else {
                    if count as usize > ctx.options().max_array_length {
                        error!(
                            "Field {} of {} has an array length {} that exceeds the decoding limit {}",
                            field.name,
                            self.schema.name,
                            count,
                            ctx.options().max_array_length
                        );
                        return Err(StatusCode::BadEncodingLimitsExceeded);
                    }
                    let mut values = Vec::with_capacity(count as usize);
                    for _ in 0..count {
                        values.push(self.decode_scalar(ctx, &mut reader, field, dispatch)?);
                    }
                    self.adapter
                        .array_from_wire(&field.name, Some(values), type_name)
                };
                members.push((field.name.clone(), member));
            }
        }

        // Length carriers are synthetic. The array's length is implicit in its element
        // count and must not appear in the host structure.
        members.retain(|(name, _)| !self.length_fields.contains_key(name));

        Ok(self.adapter.structure(&self.schema.name, members))
    }

    /// Encodes one value of this type to the stream, returning the number of bytes
    /// written.
    pub fn encode(
        &self,
        ctx: &EncodingContext<'_, A>,
        stream: &mut dyn Write,
        value: &A::Structure,
    ) -> EncodingResult<usize> {
        let mut writer = BitWriter::new(stream);
        let mut members = self.adapter.members(value);
        let mut size = 0;

        for (idx, field) in self.schema.fields.iter().enumerate() {
            // A field gated off by its switch contributes no bytes, even when the member
            // map holds a value for it
            if !self.switch_satisfied(field, &members, StatusCode::BadEncodingError)? {
                continue;
            }
            // A length carrier is written by the array field that owns it
            if self.length_fields.contains_key(&field.name) {
                continue;
            }
            size += self.encode_field(ctx, &mut writer, idx, &mut members)?;
        }

        size += writer.flush_bits()?;
        Ok(size)
    }

    fn encode_field(
        &self,
        ctx: &EncodingContext<'_, A>,
        writer: &mut BitWriter<'_>,
        idx: usize,
        members: &mut Vec<(String, A::Member)>,
    ) -> EncodingResult<usize> {
        let field = &self.schema.fields[idx];
        let dispatch = &self.dispatch[idx];
        let type_name = field.type_name.name.as_str();
        let mut size = 0;

        if !field.is_array() {
            let member = self.find_member(members, &field.name)?;
            let wire = self.adapter.scalar_to_wire(member, type_name)?;
            size += self.encode_wire_value(ctx, writer, field, dispatch, &wire)?;
        } else {
            if field.is_length_in_bytes {
                error!(
                    "Field {} of {} declares its length in bytes, which is not supported",
                    field.name, self.schema.name
                );
                return Err(StatusCode::BadEncodingError);
            }
            if *dispatch == FieldDispatch::Builtin(BuiltinType::Bit) {
                let count =
                    self.element_count(field, members, StatusCode::BadEncodingError)?;
                let member = self.find_member(members, &field.name)?;
                let wire = self.adapter.scalar_to_wire(member, type_name)?;
                let accumulator = wire.as_i64().ok_or_else(|| {
                    error!(
                        "Member {} of {} does not hold an integer to pack into bits",
                        field.name, self.schema.name
                    );
                    StatusCode::BadEncodingError
                })?;
                for i in 0..count {
                    // Past the accumulator width the sign bit repeats
                    size += writer.write_bit((accumulator >> i.min(63)) & 0x1 == 0x1)?;
                }
            } else {
                let member = self.find_member(members, &field.name)?;
                let elements = self.adapter.array_to_wire(member, type_name)?;
                if let Some(length_field_name) = &field.length_field {
                    // Synthesize the length carrier (-1 for a null array) into the
                    // working member map and write it ahead of the elements
                    let count = elements.as_ref().map(|e| e.len() as i32).unwrap_or(-1);
                    let lf_idx = *self.field_index.get(length_field_name).ok_or_else(|| {
                        error!(
                            "Field {} of {} names length field {} which is not declared",
                            field.name, self.schema.name, length_field_name
                        );
                        StatusCode::BadEncodingError
                    })?;
                    let length_field = &self.schema.fields[lf_idx];
                    let length_member = self.adapter.scalar_from_wire(
                        &length_field.name,
                        FieldValue::Int32(count),
                        &length_field.type_name.name,
                    );
                    upsert_member(members, &length_field.name, length_member);
                    size += self.encode_field(ctx, writer, lf_idx, members)?;
                }
                match elements {
                    Some(elements) => {
                        for element in &elements {
                            size +=
                                self.encode_wire_value(ctx, writer, field, dispatch, element)?;
                        }
                    }
                    None if field.length_field.is_some() => {
                        // Null array, the -1 length carrier above is its entire encoding
                    }
                    None => {
                        error!(
                            "Member {} of {} is a null array but the field has no length field to carry that",
                            field.name, self.schema.name
                        );
                        return Err(StatusCode::BadEncodingError);
                    }
                }
            }
        }
        Ok(size)
    }

    /// Scalar dispatch for one wire value on decode, either a built-in read or a
    /// recursive hand-off to the codec of a described type.
    fn decode_scalar(
        &self,
        ctx: &EncodingContext<'_, A>,
        reader: &mut BitReader<'_>,
        field: &FieldType,
        dispatch: &FieldDispatch,
    ) -> EncodingResult<FieldValue<A::Structure>> {
        match dispatch {
            FieldDispatch::Builtin(builtin) => builtin.read_value(reader, ctx.options()),
            FieldDispatch::Described {
                namespace_uri,
                name,
            } => {
                let dictionary = ctx.manager().dictionary(namespace_uri).ok_or_else(|| {
                    error!(
                        "No type dictionary is registered for namespace {} needed by field {} of {}",
                        namespace_uri, field.name, self.schema.name
                    );
                    StatusCode::BadDecodingError
                })?;
                match dictionary.description(name) {
                    Some(TypeDescription::Structured(_)) => {
                        let codec = dictionary.codec(name).ok_or_else(|| {
                            no_codec_registered(namespace_uri, name);
                            StatusCode::BadDecodingError
                        })?;
                        // Nested structures recurse, bounded by the depth gauge
                        let _depth_lock = ctx.options().depth_lock()?;
                        Ok(FieldValue::Structure(codec.decode(ctx, reader)?))
                    }
                    Some(TypeDescription::Enumerated(_)) => Ok(FieldValue::Enumeration(
                        i32::decode(reader, ctx.options())?,
                    )),
                    None => {
                        no_codec_registered(namespace_uri, name);
                        Err(StatusCode::BadDecodingError)
                    }
                }
            }
        }
    }

    /// Scalar dispatch for one wire value on encode.
    fn encode_wire_value(
        &self,
        ctx: &EncodingContext<'_, A>,
        writer: &mut BitWriter<'_>,
        field: &FieldType,
        dispatch: &FieldDispatch,
        value: &FieldValue<A::Structure>,
    ) -> EncodingResult<usize> {
        match dispatch {
            FieldDispatch::Builtin(builtin) => builtin.write_value(writer, value),
            FieldDispatch::Described {
                namespace_uri,
                name,
            } => {
                let dictionary = ctx.manager().dictionary(namespace_uri).ok_or_else(|| {
                    error!(
                        "No type dictionary is registered for namespace {} needed by field {} of {}",
                        namespace_uri, field.name, self.schema.name
                    );
                    StatusCode::BadEncodingError
                })?;
                match dictionary.description(name) {
                    Some(TypeDescription::Structured(_)) => {
                        let codec = dictionary.codec(name).ok_or_else(|| {
                            no_codec_registered(namespace_uri, name);
                            StatusCode::BadEncodingError
                        })?;
                        match value {
                            FieldValue::Structure(nested) => {
                                let mut size = writer.flush_bits()?;
                                size += codec.encode(ctx, writer, nested)?;
                                Ok(size)
                            }
                            _ => {
                                error!(
                                    "Member {} of {} is not a structure of type {}",
                                    field.name, self.schema.name, name
                                );
                                Err(StatusCode::BadEncodingError)
                            }
                        }
                    }
                    Some(TypeDescription::Enumerated(_)) => {
                        let v = value.as_i64().ok_or_else(|| {
                            error!(
                                "Member {} of {} does not hold the integer backing of enumeration {}",
                                field.name, self.schema.name, name
                            );
                            StatusCode::BadEncodingError
                        })?;
                        let mut size = writer.flush_bits()?;
                        size += (v as i32).encode(writer)?;
                        Ok(size)
                    }
                    None => {
                        no_codec_registered(namespace_uri, name);
                        Err(StatusCode::BadEncodingError)
                    }
                }
            }
        }
    }

    /// Evaluates a field's switch condition against the sibling members available so
    /// far. A field without a switch field is always present. The comparison happens in
    /// signed 64-bit space with the defaults switch value 1 and operand equals.
    fn switch_satisfied(
        &self,
        field: &FieldType,
        members: &[(String, A::Member)],
        err: StatusCode,
    ) -> EncodingResult<bool> {
        let switch_field = match &field.switch_field {
            Some(switch_field) => switch_field,
            None => return Ok(true),
        };
        let switch_value = field.switch_value.unwrap_or(1);
        let operand = field.switch_operand.unwrap_or(SwitchOperand::Equals);
        let actual = self.member_as_i64(members, switch_field, &field.name, err)?;
        Ok(operand.compare(actual, switch_value))
    }

    /// Computes an array field's element count, i.e. a literal length, or the value of
    /// the sibling named by the length field, or 1 when neither is set.
    fn element_count(
        &self,
        field: &FieldType,
        members: &[(String, A::Member)],
        err: StatusCode,
    ) -> EncodingResult<i64> {
        if let Some(length) = field.length {
            Ok(i64::from(length))
        } else if let Some(length_field) = &field.length_field {
            self.member_as_i64(members, length_field, &field.name, err)
        } else {
            Ok(1)
        }
    }

    /// Reads the sibling member named by a switch or length reference as a signed
    /// 64-bit integer, going through the adapter's host-to-wire hook. The sibling's
    /// declared type is used for the conversion, Int32 when it cannot be determined.
    fn member_as_i64(
        &self,
        members: &[(String, A::Member)],
        name: &str,
        referenced_by: &str,
        err: StatusCode,
    ) -> EncodingResult<i64> {
        let member = members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| {
                error!(
                    "Field {} of {} refers to sibling {} which has no value",
                    referenced_by, self.schema.name, name
                );
                err
            })?;
        let type_name = self
            .field_index
            .get(name)
            .map(|idx| self.schema.fields[*idx].type_name.name.as_str())
            .unwrap_or("Int32");
        let wire = self.adapter.scalar_to_wire(member, type_name)?;
        wire.as_i64().ok_or_else(|| {
            error!(
                "Sibling {} referenced by field {} of {} does not hold an integer",
                name, referenced_by, self.schema.name
            );
            err
        })
    }

    fn find_member<'m>(
        &self,
        members: &'m [(String, A::Member)],
        name: &str,
    ) -> EncodingResult<&'m A::Member> {
        members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| {
                error!(
                    "Value of type {} has no member {} to encode",
                    self.schema.name, name
                );
                StatusCode::BadEncodingError
            })
    }
}

fn no_codec_registered(namespace_uri: &str, name: &str) {
    error!(
        "No codec is registered for type {} in namespace {}",
        name, namespace_uri
    );
}

fn upsert_member<M>(members: &mut Vec<(String, M)>, name: &str, member: M) {
    if let Some(entry) = members.iter_mut().find(|(n, _)| n == name) {
        entry.1 = member;
    } else {
        members.push((name.to_string(), member));
    }
}
