// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the namespace-scoped type dictionary and the manager that holds one
//! dictionary per namespace URI. Dictionaries are populated during startup and must be
//! published (typically behind an `Arc`) before any concurrent use; registration and
//! resolution do not interleave.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{adapter::StructureAdapter, structure::StructureCodec};
use crate::schema::{EnumeratedType, TypeDescription};
use crate::types::encoding::DecodingOptions;

/// The type descriptions and codecs registered for one namespace URI.
pub struct TypeDictionary<A: StructureAdapter> {
    namespace_uri: String,
    descriptions: HashMap<String, TypeDescription>,
    codecs: HashMap<String, Arc<StructureCodec<A>>>,
}

impl<A: StructureAdapter> TypeDictionary<A> {
    pub fn new<S: Into<String>>(namespace_uri: S) -> Self {
        TypeDictionary {
            namespace_uri: namespace_uri.into(),
            descriptions: HashMap::new(),
            codecs: HashMap::new(),
        }
    }

    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    /// Registers a structured type with the codec built for it. The codec carries its
    /// own schema, which becomes the registered description. A duplicate name replaces
    /// the earlier entry, last write wins.
    pub fn register_structured(&mut self, codec: Arc<StructureCodec<A>>) {
        let schema = codec.schema().clone();
        self.descriptions.insert(
            schema.name.clone(),
            TypeDescription::Structured(schema),
        );
        self.codecs.insert(codec.schema().name.clone(), codec);
    }

    /// Registers an enumerated type. No codec exists for these, the integer backing is
    /// read and written generically.
    pub fn register_enumerated(&mut self, enumerated: EnumeratedType) {
        self.descriptions.insert(
            enumerated.name.clone(),
            TypeDescription::Enumerated(enumerated),
        );
    }

    /// Resolves a description by name.
    pub fn description(&self, name: &str) -> Option<&TypeDescription> {
        self.descriptions.get(name)
    }

    /// Resolves the codec for a structured type by name.
    pub fn codec(&self, name: &str) -> Option<&Arc<StructureCodec<A>>> {
        self.codecs.get(name)
    }
}

/// Holds the type dictionary of every namespace known to the host. Built during startup
/// and immutable afterwards.
pub struct DataTypeManager<A: StructureAdapter> {
    dictionaries: HashMap<String, TypeDictionary<A>>,
}

impl<A: StructureAdapter> Default for DataTypeManager<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: StructureAdapter> DataTypeManager<A> {
    pub fn new() -> Self {
        DataTypeManager {
            dictionaries: HashMap::new(),
        }
    }

    /// Adds a dictionary, keyed by its namespace URI. Last write wins on a duplicate.
    pub fn add_dictionary(&mut self, dictionary: TypeDictionary<A>) {
        self.dictionaries
            .insert(dictionary.namespace_uri().to_string(), dictionary);
    }

    pub fn dictionary(&self, namespace_uri: &str) -> Option<&TypeDictionary<A>> {
        self.dictionaries.get(namespace_uri)
    }

    /// Resolves a `(namespace URI, name)` pair to its description.
    pub fn resolve(&self, namespace_uri: &str, name: &str) -> Option<&TypeDescription> {
        self.dictionary(namespace_uri)
            .and_then(|dict| dict.description(name))
    }
}

/// Threads the dictionaries and the decoding limits through every codec call so nested
/// and foreign-namespace types resolve during recursion.
pub struct EncodingContext<'a, A: StructureAdapter> {
    manager: &'a DataTypeManager<A>,
    options: &'a DecodingOptions,
}

impl<'a, A: StructureAdapter> EncodingContext<'a, A> {
    pub fn new(manager: &'a DataTypeManager<A>, options: &'a DecodingOptions) -> Self {
        EncodingContext { manager, options }
    }

    pub fn manager(&self) -> &DataTypeManager<A> {
        self.manager
    }

    pub fn options(&self) -> &DecodingOptions {
        self.options
    }
}
