// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the schema-driven structure codec and its collaborators, i.e. the bit-aware
//! stream cursors, the built-in dispatch table, the wire value currency, the host value
//! adapter, and the per-namespace type dictionaries.

pub mod adapter;
pub mod builtin;
pub mod dictionary;
pub mod stream;
pub mod structure;
pub mod value;

#[cfg(test)]
mod tests;

pub use adapter::{DynamicAdapter, StructureAdapter};
pub use builtin::BuiltinType;
pub use dictionary::{DataTypeManager, EncodingContext, TypeDictionary};
pub use stream::{BitReader, BitWriter};
pub use structure::StructureCodec;
pub use value::{FieldValue, Struct, Value};
