// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `Variant`, the typed value container.

use std::io::{Read, Write};

use crate::types::{
    byte_string::ByteString,
    data_value::DataValue,
    date_time::DateTime,
    diagnostic_info::DiagnosticInfo,
    encoding::*,
    expanded_node_id::ExpandedNodeId,
    extension_object::ExtensionObject,
    guid::Guid,
    localized_text::LocalizedText,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    string::{UAString, XmlElement},
};

mod encoding_mask {
    // These are the kinds of values stored in a Variant, expressed as the data type id
    // component of the encoding mask
    pub const BOOLEAN: u8 = 1;
    pub const SBYTE: u8 = 2;
    pub const BYTE: u8 = 3;
    pub const INT16: u8 = 4;
    pub const UINT16: u8 = 5;
    pub const INT32: u8 = 6;
    pub const UINT32: u8 = 7;
    pub const INT64: u8 = 8;
    pub const UINT64: u8 = 9;
    pub const FLOAT: u8 = 10;
    pub const DOUBLE: u8 = 11;
    pub const STRING: u8 = 12;
    pub const DATE_TIME: u8 = 13;
    pub const GUID: u8 = 14;
    pub const BYTE_STRING: u8 = 15;
    pub const XML_ELEMENT: u8 = 16;
    pub const NODE_ID: u8 = 17;
    pub const EXPANDED_NODE_ID: u8 = 18;
    pub const STATUS_CODE: u8 = 19;
    pub const QUALIFIED_NAME: u8 = 20;
    pub const LOCALIZED_TEXT: u8 = 21;
    pub const EXTENSION_OBJECT: u8 = 22;
    pub const DATA_VALUE: u8 = 23;
    pub const VARIANT: u8 = 24;
    pub const DIAGNOSTIC_INFO: u8 = 25;

    /// Bit indicating an array of values follows an Int32 length
    pub const ARRAY_VALUES_BIT: u8 = 1 << 7;
    /// Bit indicating array dimensions follow the values. Not supported by this crate.
    pub const ARRAY_DIMENSIONS_BIT: u8 = 1 << 6;
    pub const ARRAY_MASK: u8 = ARRAY_VALUES_BIT | ARRAY_DIMENSIONS_BIT;
}

/// A single dimension array of variants, all of the same type id.
#[derive(PartialEq, Debug, Clone)]
pub struct VariantArray {
    /// The data type id of every element
    pub value_type: u8,
    pub values: Vec<Variant>,
}

/// A `Variant` holds built-in OPC UA data types, including its own nested form and single
/// dimension arrays of itself. Multi-dimensional arrays are not supported.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum Variant {
    /// Empty type has no value
    #[default]
    Empty,
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
    DateTime(Box<DateTime>),
    Guid(Box<Guid>),
    ByteString(ByteString),
    XmlElement(XmlElement),
    NodeId(Box<NodeId>),
    ExpandedNodeId(Box<ExpandedNodeId>),
    StatusCode(StatusCode),
    QualifiedName(Box<QualifiedName>),
    LocalizedText(Box<LocalizedText>),
    ExtensionObject(Box<ExtensionObject>),
    DataValue(Box<DataValue>),
    Variant(Box<Variant>),
    DiagnosticInfo(Box<DiagnosticInfo>),
    Array(Box<VariantArray>),
}

macro_rules! from_variant {
    ($tf: ty, $vt: ident) => {
        impl From<$tf> for Variant {
            fn from(v: $tf) -> Self {
                Variant::$vt(v)
            }
        }
    };
}

macro_rules! from_variant_boxed {
    ($tf: ty, $vt: ident) => {
        impl From<$tf> for Variant {
            fn from(v: $tf) -> Self {
                Variant::$vt(Box::new(v))
            }
        }
    };
}

from_variant!(bool, Boolean);
from_variant!(i8, SByte);
from_variant!(u8, Byte);
from_variant!(i16, Int16);
from_variant!(u16, UInt16);
from_variant!(i32, Int32);
from_variant!(u32, UInt32);
from_variant!(i64, Int64);
from_variant!(u64, UInt64);
from_variant!(f32, Float);
from_variant!(f64, Double);
from_variant!(UAString, String);
from_variant!(ByteString, ByteString);
from_variant!(StatusCode, StatusCode);
from_variant_boxed!(DateTime, DateTime);
from_variant_boxed!(Guid, Guid);
from_variant_boxed!(NodeId, NodeId);
from_variant_boxed!(ExpandedNodeId, ExpandedNodeId);
from_variant_boxed!(QualifiedName, QualifiedName);
from_variant_boxed!(LocalizedText, LocalizedText);
from_variant_boxed!(ExtensionObject, ExtensionObject);
from_variant_boxed!(DataValue, DataValue);
from_variant_boxed!(DiagnosticInfo, DiagnosticInfo);

impl<'a> From<&'a str> for Variant {
    fn from(v: &'a str) -> Self {
        Variant::String(UAString::from(v))
    }
}

impl BinaryEncoder<Variant> for Variant {
    fn byte_len(&self) -> usize {
        // Encoding mask
        let mut size = 1;
        size += match self {
            Variant::Empty => 0,
            Variant::Array(array) => {
                4 + array.values.iter().map(Self::value_byte_len).sum::<usize>()
            }
            value => Self::value_byte_len(value),
        };
        size
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        let mut size: usize = 0;
        // Encoding mask includes the array bit if applicable for the type
        size += write_u8(stream, self.encoding_mask())?;
        size += match self {
            Variant::Empty => 0,
            Variant::Array(array) => {
                let mut size = write_i32(stream, array.values.len() as i32)?;
                for value in array.values.iter() {
                    size += Self::encode_value(stream, value)?;
                }
                size
            }
            value => Self::encode_value(stream, value)?,
        };
        assert_eq!(size, self.byte_len());
        Ok(size)
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        let mask = u8::decode(stream, decoding_options)?;
        if mask & encoding_mask::ARRAY_DIMENSIONS_BIT != 0 {
            error!("Multi dimension arrays are not supported");
            return Err(StatusCode::BadDecodingError);
        }
        let value_type = mask & !encoding_mask::ARRAY_MASK;
        if mask & encoding_mask::ARRAY_VALUES_BIT != 0 {
            let len = i32::decode(stream, decoding_options)?;
            if len == -1 {
                return Ok(Variant::Array(Box::new(VariantArray {
                    value_type,
                    values: Vec::new(),
                })));
            }
            if len < -1 {
                error!("Invalid variant array length {}", len);
                return Err(StatusCode::BadDecodingError);
            }
            if len as usize > decoding_options.max_array_length {
                error!(
                    "Variant array length {} exceeds decoding limit {}",
                    len, decoding_options.max_array_length
                );
                return Err(StatusCode::BadEncodingLimitsExceeded);
            }
            let mut values = Vec::with_capacity(len as usize);
            for _ in 0..len {
                values.push(Self::decode_value(stream, value_type, decoding_options)?);
            }
            Ok(Variant::Array(Box::new(VariantArray {
                value_type,
                values,
            })))
        } else {
            Self::decode_value(stream, value_type, decoding_options)
        }
    }
}

impl Variant {
    /// Test if the variant holds nothing at all
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// The data type id component of the encoding mask for this value
    fn value_type_id(value: &Variant) -> u8 {
        match value {
            Variant::Empty => 0,
            Variant::Boolean(_) => encoding_mask::BOOLEAN,
            Variant::SByte(_) => encoding_mask::SBYTE,
            Variant::Byte(_) => encoding_mask::BYTE,
            Variant::Int16(_) => encoding_mask::INT16,
            Variant::UInt16(_) => encoding_mask::UINT16,
            Variant::Int32(_) => encoding_mask::INT32,
            Variant::UInt32(_) => encoding_mask::UINT32,
            Variant::Int64(_) => encoding_mask::INT64,
            Variant::UInt64(_) => encoding_mask::UINT64,
            Variant::Float(_) => encoding_mask::FLOAT,
            Variant::Double(_) => encoding_mask::DOUBLE,
            Variant::String(_) => encoding_mask::STRING,
            Variant::DateTime(_) => encoding_mask::DATE_TIME,
            Variant::Guid(_) => encoding_mask::GUID,
            Variant::ByteString(_) => encoding_mask::BYTE_STRING,
            Variant::XmlElement(_) => encoding_mask::XML_ELEMENT,
            Variant::NodeId(_) => encoding_mask::NODE_ID,
            Variant::ExpandedNodeId(_) => encoding_mask::EXPANDED_NODE_ID,
            Variant::StatusCode(_) => encoding_mask::STATUS_CODE,
            Variant::QualifiedName(_) => encoding_mask::QUALIFIED_NAME,
            Variant::LocalizedText(_) => encoding_mask::LOCALIZED_TEXT,
            Variant::ExtensionObject(_) => encoding_mask::EXTENSION_OBJECT,
            Variant::DataValue(_) => encoding_mask::DATA_VALUE,
            Variant::Variant(_) => encoding_mask::VARIANT,
            Variant::DiagnosticInfo(_) => encoding_mask::DIAGNOSTIC_INFO,
            Variant::Array(array) => array.value_type,
        }
    }

    fn encoding_mask(&self) -> u8 {
        match self {
            Variant::Array(array) => array.value_type | encoding_mask::ARRAY_VALUES_BIT,
            value => Self::value_type_id(value),
        }
    }

    fn value_byte_len(value: &Variant) -> usize {
        match value {
            Variant::Empty => 0,
            Variant::Boolean(v) => v.byte_len(),
            Variant::SByte(v) => v.byte_len(),
            Variant::Byte(v) => v.byte_len(),
            Variant::Int16(v) => v.byte_len(),
            Variant::UInt16(v) => v.byte_len(),
            Variant::Int32(v) => v.byte_len(),
            Variant::UInt32(v) => v.byte_len(),
            Variant::Int64(v) => v.byte_len(),
            Variant::UInt64(v) => v.byte_len(),
            Variant::Float(v) => v.byte_len(),
            Variant::Double(v) => v.byte_len(),
            Variant::String(v) => v.byte_len(),
            Variant::DateTime(v) => v.byte_len(),
            Variant::Guid(v) => v.byte_len(),
            Variant::ByteString(v) => v.byte_len(),
            Variant::XmlElement(v) => v.byte_len(),
            Variant::NodeId(v) => v.byte_len(),
            Variant::ExpandedNodeId(v) => v.byte_len(),
            Variant::StatusCode(v) => v.byte_len(),
            Variant::QualifiedName(v) => v.byte_len(),
            Variant::LocalizedText(v) => v.byte_len(),
            Variant::ExtensionObject(v) => v.byte_len(),
            Variant::DataValue(v) => v.byte_len(),
            Variant::Variant(v) => v.byte_len(),
            Variant::DiagnosticInfo(v) => v.byte_len(),
            Variant::Array(_) => 0,
        }
    }

    /// Encodes the value without an encoding mask, e.g. an array element
    fn encode_value<S: Write>(stream: &mut S, value: &Variant) -> EncodingResult<usize> {
        match value {
            Variant::Empty => Ok(0),
            Variant::Boolean(v) => v.encode(stream),
            Variant::SByte(v) => v.encode(stream),
            Variant::Byte(v) => v.encode(stream),
            Variant::Int16(v) => v.encode(stream),
            Variant::UInt16(v) => v.encode(stream),
            Variant::Int32(v) => v.encode(stream),
            Variant::UInt32(v) => v.encode(stream),
            Variant::Int64(v) => v.encode(stream),
            Variant::UInt64(v) => v.encode(stream),
            Variant::Float(v) => v.encode(stream),
            Variant::Double(v) => v.encode(stream),
            Variant::String(v) => v.encode(stream),
            Variant::DateTime(v) => v.encode(stream),
            Variant::Guid(v) => v.encode(stream),
            Variant::ByteString(v) => v.encode(stream),
            Variant::XmlElement(v) => v.encode(stream),
            Variant::NodeId(v) => v.encode(stream),
            Variant::ExpandedNodeId(v) => v.encode(stream),
            Variant::StatusCode(v) => v.encode(stream),
            Variant::QualifiedName(v) => v.encode(stream),
            Variant::LocalizedText(v) => v.encode(stream),
            Variant::ExtensionObject(v) => v.encode(stream),
            Variant::DataValue(v) => v.encode(stream),
            Variant::Variant(v) => v.encode(stream),
            Variant::DiagnosticInfo(v) => v.encode(stream),
            Variant::Array(_) => {
                error!("Cannot encode an array within an array");
                Err(StatusCode::BadEncodingError)
            }
        }
    }

    /// Decodes a value of the nominated type without an encoding mask
    fn decode_value<S: Read>(
        stream: &mut S,
        value_type: u8,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Variant> {
        let value = match value_type {
            0 => Variant::Empty,
            encoding_mask::BOOLEAN => bool::decode(stream, decoding_options)?.into(),
            encoding_mask::SBYTE => i8::decode(stream, decoding_options)?.into(),
            encoding_mask::BYTE => u8::decode(stream, decoding_options)?.into(),
            encoding_mask::INT16 => i16::decode(stream, decoding_options)?.into(),
            encoding_mask::UINT16 => u16::decode(stream, decoding_options)?.into(),
            encoding_mask::INT32 => i32::decode(stream, decoding_options)?.into(),
            encoding_mask::UINT32 => u32::decode(stream, decoding_options)?.into(),
            encoding_mask::INT64 => i64::decode(stream, decoding_options)?.into(),
            encoding_mask::UINT64 => u64::decode(stream, decoding_options)?.into(),
            encoding_mask::FLOAT => f32::decode(stream, decoding_options)?.into(),
            encoding_mask::DOUBLE => f64::decode(stream, decoding_options)?.into(),
            encoding_mask::STRING => UAString::decode(stream, decoding_options)?.into(),
            encoding_mask::DATE_TIME => DateTime::decode(stream, decoding_options)?.into(),
            encoding_mask::GUID => Guid::decode(stream, decoding_options)?.into(),
            encoding_mask::BYTE_STRING => ByteString::decode(stream, decoding_options)?.into(),
            encoding_mask::XML_ELEMENT => {
                Variant::XmlElement(XmlElement::decode(stream, decoding_options)?)
            }
            encoding_mask::NODE_ID => NodeId::decode(stream, decoding_options)?.into(),
            encoding_mask::EXPANDED_NODE_ID => {
                ExpandedNodeId::decode(stream, decoding_options)?.into()
            }
            encoding_mask::STATUS_CODE => StatusCode::decode(stream, decoding_options)?.into(),
            encoding_mask::QUALIFIED_NAME => {
                QualifiedName::decode(stream, decoding_options)?.into()
            }
            encoding_mask::LOCALIZED_TEXT => {
                LocalizedText::decode(stream, decoding_options)?.into()
            }
            encoding_mask::EXTENSION_OBJECT => {
                // Extension object internals can be recursive, so the depth gauge protects
                // against a malicious nesting of objects
                let _depth_lock = decoding_options.depth_lock()?;
                ExtensionObject::decode(stream, decoding_options)?.into()
            }
            encoding_mask::DATA_VALUE => {
                let _depth_lock = decoding_options.depth_lock()?;
                DataValue::decode(stream, decoding_options)?.into()
            }
            encoding_mask::VARIANT => {
                let _depth_lock = decoding_options.depth_lock()?;
                Variant::Variant(Box::new(Variant::decode(stream, decoding_options)?))
            }
            encoding_mask::DIAGNOSTIC_INFO => {
                let _depth_lock = decoding_options.depth_lock()?;
                DiagnosticInfo::decode(stream, decoding_options)?.into()
            }
            _ => {
                error!("Unrecognized variant type {}", value_type);
                return Err(StatusCode::BadDecodingError);
            }
        };
        Ok(value)
    }
}
