// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Schema-driven binary serialization for OPC UA structured types.
//!
//! A structured type's wire layout is not fixed at compile time; it is supplied
//! as a data-driven schema (a binary schema description). This crate walks such
//! a schema and a binary stream in lockstep, resolving inter-field dependencies
//! (array lengths held by sibling fields, optional fields gated by sibling
//! switch fields, packed sub-byte bit fields) and dispatching each field either
//! to a built-in wire routine or, recursively, to the codec of another
//! registered type.
//!
//! The crate is split into three modules:
//!
//! * [`types`] - the built-in OPC UA wire types and the stream primitives they
//!   encode and decode with.
//! * [`schema`] - the in-memory model of a binary schema description.
//! * [`codec`] - the schema-driven structure codec, the per-namespace type
//!   dictionary and the host value adapter.

#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::float_cmp)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate serde_derive;

/// Tracing macro for obtaining a lock on a `Mutex`. Sometimes deadlocks can happen in code,
/// and if they do, this macro is useful for finding out where they happened.
#[macro_export]
macro_rules! trace_lock {
    ( $x:expr ) => {{
        let v = $x.lock();
        v
    }};
}

pub mod codec;
pub mod schema;
pub mod types;
