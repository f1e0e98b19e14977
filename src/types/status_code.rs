// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `StatusCode`, which doubles as the error type of every
//! encoding and decoding operation in this crate.

#![allow(non_upper_case_globals)]

use std::{
    error::Error,
    fmt,
    fmt::Formatter,
    io::{Read, Write},
};

use crate::types::encoding::*;

bitflags! {
    /// An OPC UA status code. The upper 16 bits hold the status, the lower 16 bits hold
    /// modifier flags. Only the codes this crate can raise itself are enumerated here.
    pub struct StatusCode: u32 {
        const Good = 0x0000_0000;
        const BadUnexpectedError = 0x8001_0000;
        const BadInternalError = 0x8002_0000;
        const BadOutOfMemory = 0x8003_0000;
        const BadEncodingError = 0x8006_0000;
        const BadDecodingError = 0x8007_0000;
        const BadEncodingLimitsExceeded = 0x8008_0000;
        const BadDataEncodingInvalid = 0x8039_0000;
        const BadOutOfRange = 0x803C_0000;
        const BadNotSupported = 0x803D_0000;

        // Severity / modifier masks
        const IS_ERROR = 0x8000_0000;
        const IS_UNCERTAIN = 0x4000_0000;
        const STATUS_MASK = 0xffff_0000;
        const BIT_MASK = 0x0000_ffff;
    }
}

// The bitflags! macro implements Debug for StatusCode but it fouls the display because status
// codes are a combination of bits and unique values.

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        // Displays the StatusCode as its name, or its name+bitflags
        let bits = self.bitflags();
        if bits.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}+{:?}", self.name(), bits)
        }
    }
}

impl BinaryEncoder<StatusCode> for StatusCode {
    fn byte_len(&self) -> usize {
        4
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_u32(stream, self.bits())
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        Ok(StatusCode::from_bits_truncate(read_u32(stream)?))
    }
}

impl Error for StatusCode {}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::Good
    }
}

impl StatusCode {
    /// Returns the bit flags of the status code, i.e. it masks out the actual status code value
    pub fn bitflags(&self) -> StatusCode {
        *self & StatusCode::BIT_MASK
    }

    /// Returns the status only, i.e. it masks out any bit flags that come with the status code
    pub fn status(&self) -> StatusCode {
        *self & StatusCode::STATUS_MASK
    }

    /// Tests if the status code is bad
    pub fn is_bad(&self) -> bool {
        self.contains(StatusCode::IS_ERROR)
    }

    /// Tests if the status code is uncertain
    pub fn is_uncertain(&self) -> bool {
        self.contains(StatusCode::IS_UNCERTAIN)
    }

    /// Tests if the status code is good (i.e. not bad or uncertain)
    pub fn is_good(&self) -> bool {
        !self.is_bad() && !self.is_uncertain()
    }

    /// Returns the name of the status, ignoring any modifier bits
    pub fn name(&self) -> &'static str {
        match self.status() {
            StatusCode::Good => "Good",
            StatusCode::BadUnexpectedError => "BadUnexpectedError",
            StatusCode::BadInternalError => "BadInternalError",
            StatusCode::BadOutOfMemory => "BadOutOfMemory",
            StatusCode::BadEncodingError => "BadEncodingError",
            StatusCode::BadDecodingError => "BadDecodingError",
            StatusCode::BadEncodingLimitsExceeded => "BadEncodingLimitsExceeded",
            StatusCode::BadDataEncodingInvalid => "BadDataEncodingInvalid",
            StatusCode::BadOutOfRange => "BadOutOfRange",
            StatusCode::BadNotSupported => "BadNotSupported",
            _ => "Unrecognized status code",
        }
    }
}
