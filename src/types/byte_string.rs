// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `ByteString`.

use std::{
    fmt,
    io::{Read, Write},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{
    encoding::{
        process_decode_io_result, process_encode_io_result, write_i32, BinaryEncoder,
        DecodingOptions, EncodingResult,
    },
    status_code::StatusCode,
};

/// A sequence of octets. A null byte string is distinct from an empty one.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct ByteString {
    pub value: Option<Vec<u8>>,
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

impl Serialize for ByteString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.value.is_some() {
            serializer.serialize_str(&self.as_base64())
        } else {
            serializer.serialize_none()
        }
    }
}

struct ByteStringVisitor;

impl<'de> de::Visitor<'de> for ByteStringVisitor {
    type Value = ByteString;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a base64 encoded string value or null")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Self::Value::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Self::Value::from_base64(v)
            .ok_or_else(|| de::Error::custom("Cannot decode base64 bytestring"))
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D>(deserializer: D) -> Result<ByteString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(ByteStringVisitor)
    }
}

impl BinaryEncoder<ByteString> for ByteString {
    fn byte_len(&self) -> usize {
        // Length prefix plus the actual length of bytes (if not null)
        4 + self.value.as_ref().map_or(0, |v| v.len())
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        // Byte strings are encoded as bytes preceded by an Int32 length. A -1 indicates null
        if let Some(ref value) = self.value {
            let mut size: usize = 0;
            size += write_i32(stream, value.len() as i32)?;
            size += process_encode_io_result(stream.write(value))?;
            assert_eq!(size, self.byte_len());
            Ok(size)
        } else {
            write_i32(stream, -1)
        }
    }

    fn decode<S: Read>(stream: &mut S, decoding_options: &DecodingOptions) -> EncodingResult<Self> {
        let len = i32::decode(stream, decoding_options)?;
        // Null bytestring?
        if len == -1 {
            Ok(ByteString::null())
        } else if len < -1 {
            error!("ByteString buf length is a negative number {}", len);
            Err(StatusCode::BadDecodingError)
        } else if len as usize > decoding_options.max_byte_string_length {
            error!(
                "ByteString length {} exceeds decoding limit {}",
                len, decoding_options.max_byte_string_length
            );
            Err(StatusCode::BadDecodingError)
        } else {
            let mut buf: Vec<u8> = vec![0u8; len as usize];
            process_decode_io_result(stream.read_exact(&mut buf))?;
            Ok(ByteString { value: Some(buf) })
        }
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        ByteString { value: Some(value) }
    }
}

impl<'a, T> From<&'a T> for ByteString
where
    T: AsRef<[u8]> + ?Sized,
{
    fn from(value: &'a T) -> Self {
        ByteString::from(value.as_ref().to_vec())
    }
}

impl ByteString {
    /// Create a null byte string (not the same as an empty byte string).
    pub fn null() -> ByteString {
        ByteString { value: None }
    }

    /// Test if the byte string is null.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Test if the byte string is null or empty.
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map_or(true, |v| v.is_empty())
    }

    /// Creates a byte string from a base64 encoded string
    pub fn from_base64(data: &str) -> Option<ByteString> {
        STANDARD.decode(data).map(|v| ByteString::from(v)).ok()
    }

    /// Encodes the byte string as a base64 encoded string
    pub fn as_base64(&self) -> String {
        self.value
            .as_ref()
            .map_or_else(|| STANDARD.encode(""), |v| STANDARD.encode(v))
    }
}

#[test]
fn bytestring_from_byte_slices() {
    // All the byte slice flavours convert, including fixed size array references
    let v = ByteString::from(b"abcd");
    assert_eq!(v, ByteString::from(&[0x61u8, 0x62, 0x63, 0x64][..]));
    assert_eq!(v, ByteString::from(vec![0x61, 0x62, 0x63, 0x64]));
}

#[test]
fn bytestring_null() {
    let v = ByteString::null();
    assert!(v.is_null());
    assert!(v.is_empty());
}

#[test]
fn bytestring_base64() {
    let v = ByteString::from(vec![0x1, 0x2, 0x3, 0x4]);
    let b = v.as_base64();
    assert_eq!(ByteString::from_base64(&b).unwrap(), v);
}
