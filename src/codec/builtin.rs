// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains `BuiltinType`, the closed set of built-in wire kinds the structure codec can
//! dispatch to directly. A type name not in this set is not a built-in and is resolved
//! through the type dictionary instead.

use crate::codec::{
    stream::{BitReader, BitWriter},
    value::FieldValue,
};
use crate::types::{
    byte_string::ByteString, data_value::DataValue, date_time::DateTime,
    diagnostic_info::DiagnosticInfo,
    encoding::{BinaryEncoder, DecodingOptions, EncodingResult},
    expanded_node_id::ExpandedNodeId,
    extension_object::ExtensionObject,
    guid::Guid,
    localized_text::LocalizedText,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    string::{UAString, XmlElement},
    variant::Variant,
};

/// Every built-in wire kind the codec knows, including the sub-byte `Bit` kind.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BuiltinType {
    Bit,
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
    Guid,
    ByteString,
    XmlElement,
    NodeId,
    ExpandedNodeId,
    StatusCode,
    QualifiedName,
    LocalizedText,
    ExtensionObject,
    DataValue,
    Variant,
    DiagnosticInfo,
}

impl BuiltinType {
    /// Looks a built-in up by its schema type name. `None` means the name is not a
    /// built-in and the caller should try the type dictionary.
    pub fn from_name(name: &str) -> Option<BuiltinType> {
        let t = match name {
            "Bit" => BuiltinType::Bit,
            "Boolean" => BuiltinType::Boolean,
            "SByte" => BuiltinType::SByte,
            "Byte" => BuiltinType::Byte,
            "Int16" => BuiltinType::Int16,
            "UInt16" => BuiltinType::UInt16,
            "Int32" => BuiltinType::Int32,
            "UInt32" => BuiltinType::UInt32,
            "Int64" => BuiltinType::Int64,
            "UInt64" => BuiltinType::UInt64,
            "Float" => BuiltinType::Float,
            "Double" => BuiltinType::Double,
            "String" | "CharArray" => BuiltinType::String,
            "DateTime" => BuiltinType::DateTime,
            "Guid" => BuiltinType::Guid,
            "ByteString" => BuiltinType::ByteString,
            "XmlElement" => BuiltinType::XmlElement,
            "NodeId" => BuiltinType::NodeId,
            "ExpandedNodeId" => BuiltinType::ExpandedNodeId,
            "StatusCode" => BuiltinType::StatusCode,
            "QualifiedName" => BuiltinType::QualifiedName,
            "LocalizedText" => BuiltinType::LocalizedText,
            "ExtensionObject" => BuiltinType::ExtensionObject,
            "DataValue" => BuiltinType::DataValue,
            "Variant" => BuiltinType::Variant,
            "DiagnosticInfo" => BuiltinType::DiagnosticInfo,
            _ => return None,
        };
        Some(t)
    }

    /// Reads one value of this kind from the stream. A `Bit` is served from the bit
    /// cursor; everything else realigns to the next byte and uses the byte routines.
    pub fn read_value<T>(
        &self,
        stream: &mut BitReader<'_>,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<FieldValue<T>> {
        let value = match self {
            BuiltinType::Bit => FieldValue::Byte(stream.read_bit()?),
            BuiltinType::Boolean => FieldValue::Boolean(bool::decode(stream, decoding_options)?),
            BuiltinType::SByte => FieldValue::SByte(i8::decode(stream, decoding_options)?),
            BuiltinType::Byte => FieldValue::Byte(u8::decode(stream, decoding_options)?),
            BuiltinType::Int16 => FieldValue::Int16(i16::decode(stream, decoding_options)?),
            BuiltinType::UInt16 => FieldValue::UInt16(u16::decode(stream, decoding_options)?),
            BuiltinType::Int32 => FieldValue::Int32(i32::decode(stream, decoding_options)?),
            BuiltinType::UInt32 => FieldValue::UInt32(u32::decode(stream, decoding_options)?),
            BuiltinType::Int64 => FieldValue::Int64(i64::decode(stream, decoding_options)?),
            BuiltinType::UInt64 => FieldValue::UInt64(u64::decode(stream, decoding_options)?),
            BuiltinType::Float => FieldValue::Float(f32::decode(stream, decoding_options)?),
            BuiltinType::Double => FieldValue::Double(f64::decode(stream, decoding_options)?),
            BuiltinType::String => FieldValue::String(UAString::decode(stream, decoding_options)?),
            BuiltinType::DateTime => {
                FieldValue::DateTime(DateTime::decode(stream, decoding_options)?)
            }
            BuiltinType::Guid => FieldValue::Guid(Guid::decode(stream, decoding_options)?),
            BuiltinType::ByteString => {
                FieldValue::ByteString(ByteString::decode(stream, decoding_options)?)
            }
            BuiltinType::XmlElement => {
                FieldValue::XmlElement(XmlElement::decode(stream, decoding_options)?)
            }
            BuiltinType::NodeId => FieldValue::NodeId(NodeId::decode(stream, decoding_options)?),
            BuiltinType::ExpandedNodeId => {
                FieldValue::ExpandedNodeId(ExpandedNodeId::decode(stream, decoding_options)?)
            }
            BuiltinType::StatusCode => {
                FieldValue::StatusCode(StatusCode::decode(stream, decoding_options)?)
            }
            BuiltinType::QualifiedName => {
                FieldValue::QualifiedName(QualifiedName::decode(stream, decoding_options)?)
            }
            BuiltinType::LocalizedText => {
                FieldValue::LocalizedText(LocalizedText::decode(stream, decoding_options)?)
            }
            BuiltinType::ExtensionObject => {
                FieldValue::ExtensionObject(ExtensionObject::decode(stream, decoding_options)?)
            }
            BuiltinType::DataValue => {
                FieldValue::DataValue(DataValue::decode(stream, decoding_options)?)
            }
            BuiltinType::Variant => FieldValue::Variant(Variant::decode(stream, decoding_options)?),
            BuiltinType::DiagnosticInfo => {
                FieldValue::DiagnosticInfo(DiagnosticInfo::decode(stream, decoding_options)?)
            }
        };
        Ok(value)
    }

    /// Writes one value of this kind to the stream, returning the number of bytes put on
    /// the wire. A `Bit` goes to the bit cursor; everything else first flushes any
    /// pending bits (counted in the returned size) and then uses the byte routines.
    ///
    /// Integer kinds accept any integer-valued `FieldValue` and narrow it, since a
    /// synthesized array length arrives as an Int32 regardless of the length field's
    /// declared width. Every other kind requires the matching variant.
    pub fn write_value<T>(
        &self,
        stream: &mut BitWriter<'_>,
        value: &FieldValue<T>,
    ) -> EncodingResult<usize> {
        if *self == BuiltinType::Bit {
            let v = value.as_i64().ok_or_else(|| self.mismatch())?;
            return stream.write_bit(v & 0x1 == 0x1);
        }
        let mut size = stream.flush_bits()?;
        size += match self {
            BuiltinType::Bit => unreachable!(),
            BuiltinType::Boolean => match value {
                FieldValue::Boolean(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::SByte => {
                let v = value.as_i64().ok_or_else(|| self.mismatch())?;
                (v as i8).encode(stream)?
            }
            BuiltinType::Byte => {
                let v = value.as_i64().ok_or_else(|| self.mismatch())?;
                (v as u8).encode(stream)?
            }
            BuiltinType::Int16 => {
                let v = value.as_i64().ok_or_else(|| self.mismatch())?;
                (v as i16).encode(stream)?
            }
            BuiltinType::UInt16 => {
                let v = value.as_i64().ok_or_else(|| self.mismatch())?;
                (v as u16).encode(stream)?
            }
            BuiltinType::Int32 => {
                let v = value.as_i64().ok_or_else(|| self.mismatch())?;
                (v as i32).encode(stream)?
            }
            BuiltinType::UInt32 => {
                let v = value.as_i64().ok_or_else(|| self.mismatch())?;
                (v as u32).encode(stream)?
            }
            BuiltinType::Int64 => {
                let v = value.as_i64().ok_or_else(|| self.mismatch())?;
                v.encode(stream)?
            }
            BuiltinType::UInt64 => {
                let v = value.as_i64().ok_or_else(|| self.mismatch())?;
                (v as u64).encode(stream)?
            }
            BuiltinType::Float => match value {
                FieldValue::Float(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::Double => match value {
                FieldValue::Double(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::String => match value {
                FieldValue::String(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::DateTime => match value {
                FieldValue::DateTime(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::Guid => match value {
                FieldValue::Guid(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::ByteString => match value {
                FieldValue::ByteString(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::XmlElement => match value {
                FieldValue::XmlElement(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::NodeId => match value {
                FieldValue::NodeId(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::ExpandedNodeId => match value {
                FieldValue::ExpandedNodeId(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::StatusCode => match value {
                FieldValue::StatusCode(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::QualifiedName => match value {
                FieldValue::QualifiedName(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::LocalizedText => match value {
                FieldValue::LocalizedText(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::ExtensionObject => match value {
                FieldValue::ExtensionObject(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::DataValue => match value {
                FieldValue::DataValue(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::Variant => match value {
                FieldValue::Variant(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
            BuiltinType::DiagnosticInfo => match value {
                FieldValue::DiagnosticInfo(v) => v.encode(stream)?,
                _ => return Err(self.mismatch()),
            },
        };
        Ok(size)
    }

    fn mismatch(&self) -> StatusCode {
        error!(
            "Value of the wrong kind supplied where a {:?} was expected, cannot encode",
            self
        );
        StatusCode::BadEncodingError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::value::Value;
    use std::io::Cursor;

    #[test]
    fn lookup_by_name() {
        assert_eq!(BuiltinType::from_name("Int32"), Some(BuiltinType::Int32));
        assert_eq!(BuiltinType::from_name("Bit"), Some(BuiltinType::Bit));
        assert_eq!(
            BuiltinType::from_name("CharArray"),
            Some(BuiltinType::String)
        );
        assert_eq!(BuiltinType::from_name("NoSuchType"), None);
    }

    #[test]
    fn integer_kinds_narrow() {
        let mut out = Vec::new();
        {
            let mut writer = BitWriter::new(&mut out);
            // A synthesized Int32 written through a UInt16 length field
            let value: Value = FieldValue::Int32(513);
            let size = BuiltinType::UInt16.write_value(&mut writer, &value).unwrap();
            assert_eq!(size, 2);
        }
        assert_eq!(out, vec![0x01, 0x02]);
    }

    #[test]
    fn kind_mismatch_is_an_encoding_error() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        let value: Value = FieldValue::Int32(1);
        assert_eq!(
            BuiltinType::String
                .write_value(&mut writer, &value)
                .unwrap_err(),
            StatusCode::BadEncodingError
        );
    }

    #[test]
    fn pending_bits_flushed_before_byte_value() {
        let mut out = Vec::new();
        {
            let mut writer = BitWriter::new(&mut out);
            let bit: Value = FieldValue::Byte(1);
            let mut size = BuiltinType::Bit.write_value(&mut writer, &bit).unwrap();
            assert_eq!(size, 0);
            let value: Value = FieldValue::Byte(0x42);
            size += BuiltinType::Byte.write_value(&mut writer, &value).unwrap();
            // Padding byte plus the value byte
            assert_eq!(size, 2);
        }
        assert_eq!(out, vec![0x01, 0x42]);
    }

    #[test]
    fn read_realigns_after_bits() {
        let mut stream = Cursor::new(vec![0x01, 0x42]);
        let mut reader = BitReader::new(&mut stream);
        let options = DecodingOptions::test();
        let bit: Value = BuiltinType::Bit.read_value(&mut reader, &options).unwrap();
        assert_eq!(bit, FieldValue::Byte(1));
        let byte: Value = BuiltinType::Byte.read_value(&mut reader, &options).unwrap();
        assert_eq!(byte, FieldValue::Byte(0x42));
    }
}
