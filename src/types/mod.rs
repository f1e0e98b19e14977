// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the built-in data types of OPC UA and the facilities for encoding and decoding them
//! to and from the binary transport encoding.

pub mod basic_types;
pub mod byte_string;
pub mod data_value;
pub mod date_time;
pub mod diagnostic_info;
pub mod encoding;
pub mod expanded_node_id;
pub mod extension_object;
pub mod guid;
pub mod localized_text;
pub mod node_id;
pub mod qualified_name;
pub mod status_code;
pub mod string;
pub mod variant;

#[cfg(test)]
mod tests;

pub use crate::types::{
    byte_string::ByteString,
    data_value::DataValue,
    date_time::DateTime,
    diagnostic_info::DiagnosticInfo,
    encoding::{
        BinaryEncoder, DecodingOptions, DepthGauge, DepthLock, EncodingResult,
        MAX_ARRAY_LENGTH, MAX_BYTE_STRING_LENGTH, MAX_DECODING_DEPTH, MAX_STRING_LENGTH,
    },
    expanded_node_id::ExpandedNodeId,
    extension_object::{ExtensionObject, ExtensionObjectEncoding},
    guid::Guid,
    localized_text::LocalizedText,
    node_id::{Identifier, NodeId},
    qualified_name::QualifiedName,
    status_code::StatusCode,
    string::{UAString, XmlElement},
    variant::{Variant, VariantArray},
};
