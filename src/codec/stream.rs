// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Bit-aware cursors over byte streams. "Bit" typed fields are packed LSB first into the
//! minimum number of bits, so the structure codec reads and writes through these wrappers.
//! Byte-level access passes straight through to the underlying stream, with any partly
//! consumed byte discarded (read) or any pending bits flushed zero padded (write).

use std::io::{Read, Result, Write};

use crate::types::{
    encoding::{process_decode_io_result, process_encode_io_result, EncodingResult},
    status_code::StatusCode,
};

/// Reads single bits LSB first out of a byte stream. Implements `Read` so that byte
/// oriented routines can run against it unchanged; a byte-level read discards whatever
/// is left of a partly consumed byte.
pub struct BitReader<'a> {
    inner: &'a mut dyn Read,
    /// Bits of the current byte not yet served, low bits first.
    buffer: u8,
    remaining: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        BitReader {
            inner,
            buffer: 0,
            remaining: 0,
        }
    }

    /// Reads the next bit, refilling the one byte buffer from the stream when empty.
    pub fn read_bit(&mut self) -> EncodingResult<u8> {
        if self.remaining == 0 {
            let mut buf = [0u8];
            process_decode_io_result(self.inner.read_exact(&mut buf))?;
            self.buffer = buf[0];
            self.remaining = 8;
        }
        let bit = self.buffer & 0x1;
        self.buffer >>= 1;
        self.remaining -= 1;
        Ok(bit)
    }
}

impl Read for BitReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        // Byte access realigns the cursor, a partly consumed byte is not rewound
        self.remaining = 0;
        self.inner.read(buf)
    }
}

/// Writes single bits LSB first into a byte stream, flushing each byte as it completes.
/// Implements `Write` so that byte oriented routines can run against it unchanged; any
/// pending bits are flushed zero padded before a byte-level write.
pub struct BitWriter<'a> {
    inner: &'a mut dyn Write,
    buffer: u8,
    count: u8,
}

impl<'a> BitWriter<'a> {
    pub fn new(inner: &'a mut dyn Write) -> Self {
        BitWriter {
            inner,
            buffer: 0,
            count: 0,
        }
    }

    /// Writes one bit, returning the number of bytes flushed to the stream (0 or 1) so
    /// that encode size accounting stays exact.
    pub fn write_bit(&mut self, bit: bool) -> EncodingResult<usize> {
        if bit {
            self.buffer |= 1 << self.count;
        }
        self.count += 1;
        if self.count == 8 {
            self.flush_bits()
        } else {
            Ok(0)
        }
    }

    /// Flushes any pending bits as one byte padded with zero bits, returning the number
    /// of bytes written (0 or 1). Call before byte-level output and at the end of encode.
    pub fn flush_bits(&mut self) -> EncodingResult<usize> {
        if self.count == 0 {
            return Ok(0);
        }
        let buf = [self.buffer];
        self.buffer = 0;
        self.count = 0;
        let written = process_encode_io_result(self.inner.write(&buf))?;
        if written != 1 {
            return Err(StatusCode::BadEncodingError);
        }
        Ok(1)
    }
}

impl Write for BitWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        // Safety net. The codec flushes pending bits itself before byte fields so that
        // the padding byte is counted; a flush here keeps the output well formed anyway.
        if self.count > 0 {
            let pending = [self.buffer];
            self.buffer = 0;
            self.count = 0;
            self.inner.write_all(&pending)?;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}
