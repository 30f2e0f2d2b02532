// Smoldot
// Copyright (C) 2019-2022  Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Unsigned LEB128 integers.
//!
//! Protocol codes and variable-size value lengths are stored on the wire as
//! unsigned LEB128 integers, bounded at nine bytes. Nine bytes carry 63 bits
//! of payload, which is the maximum this module accepts: encodings that
//! continue past the ninth byte are rejected rather than interpreted.
//!
//! See <https://en.wikipedia.org/wiki/LEB128>.

use arrayvec::ArrayVec;

/// Maximum number of bytes a varint may occupy.
pub const MAX_LEN: usize = 9;

/// Error potentially returned by [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DecodeError {
    /// The continuation chain extends past the nine-byte bound.
    #[display(fmt = "varint exceeds the nine-byte bound")]
    Overflow,
    /// The buffer ends before the continuation chain terminates.
    #[display(fmt = "unexpected end of varint")]
    Truncated,
    /// The encoding uses more bytes than the minimal form.
    #[display(fmt = "varint is not minimally encoded")]
    NotMinimal,
}

/// Decodes a varint from the front of `bytes`.
///
/// Returns the decoded value and the number of bytes it occupied.
pub fn decode(bytes: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut value = 0u64;

    for (n, byte) in bytes.iter().enumerate() {
        if n == MAX_LEN {
            return Err(DecodeError::Overflow);
        }

        // With at most nine bytes of seven payload bits each, the highest
        // bit written is bit 62. The shift can never overflow.
        value |= u64::from(*byte & 0b111_1111) << (7 * n);

        if *byte & 0x80 == 0 {
            // Reject over-long encodings such as `[0x81, 0x0]`.
            if n >= 1 && *byte == 0x0 {
                return Err(DecodeError::NotMinimal);
            }
            return Ok((value, n + 1));
        }
    }

    Err(DecodeError::Truncated)
}

/// Returns the minimal-length encoding of `value`.
///
/// # Panic
///
/// Panics if `value` doesn't fit in 63 bits, as such a value has no valid
/// nine-byte encoding.
pub fn encode(value: u64) -> ArrayVec<u8, MAX_LEN> {
    assert!(value < (1 << 63), "varint value overflows 63 bits");

    let mut out = ArrayVec::new();
    let mut value = value;
    loop {
        if value < (1 << 7) {
            out.push(u8::try_from(value).unwrap());
            return out;
        }
        out.push((1 << 7) | u8::try_from(value & 0b111_1111).unwrap());
        value >>= 7;
    }
}

/// Returns the minimal-length encoding of a `usize`.
///
/// See also [`encode`].
pub fn encode_usize(value: usize) -> ArrayVec<u8, MAX_LEN> {
    encode(u64::try_from(value).unwrap())
}

/// Decodes a varint as a `usize`, for use within a `nom` parser.
///
/// > **Note**: When using this function outside of a `nom` "context", you
/// >           might have to explicit the type of `E`. Use
/// >           `nom::error::Error<&[u8]>`.
pub(crate) fn nom_varint_usize<'a, E: nom::error::ParseError<&'a [u8]>>(
    bytes: &'a [u8],
) -> nom::IResult<&'a [u8], usize, E> {
    match decode(bytes) {
        Ok((value, len)) => match usize::try_from(value) {
            Ok(value) => Ok((&bytes[len..], value)),
            Err(_) => Err(nom::Err::Error(nom::error::make_error(
                bytes,
                nom::error::ErrorKind::TooLarge,
            ))),
        },
        Err(_) => Err(nom::Err::Error(nom::error::make_error(
            bytes,
            nom::error::ErrorKind::LengthValue,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    #[test]
    fn basic_encode() {
        let obtained = super::encode(0x123_4567_89ab_cdef_u64);
        assert_eq!(
            obtained.as_slice(),
            &[239, 155, 175, 205, 248, 172, 209, 145, 1]
        );
    }

    #[test]
    fn encode_zero() {
        assert_eq!(super::encode(0).as_slice(), &[0x0u8]);
    }

    #[test]
    fn encode_is_minimal() {
        assert_eq!(super::encode(1).as_slice(), &[0x1]);
        assert_eq!(super::encode(127).as_slice(), &[0x7f]);
        assert_eq!(super::encode(128).as_slice(), &[0x80, 0x1]);
        assert_eq!(super::encode(300).as_slice(), &[0xac, 0x2]);
    }

    #[test]
    fn decode_basic() {
        assert_eq!(super::decode(&[0x0]), Ok((0, 1)));
        assert_eq!(super::decode(&[0x7f]), Ok((127, 1)));
        assert_eq!(super::decode(&[0x80, 0x1]), Ok((128, 2)));
        assert_eq!(super::decode(&[0xac, 0x2]), Ok((300, 2)));
    }

    #[test]
    fn decode_stops_at_terminator() {
        // Trailing bytes are left for the caller.
        assert_eq!(super::decode(&[0x04, 0x7f, 0x0, 0x0]), Ok((4, 1)));
    }

    #[test]
    fn decode_truncated() {
        assert_eq!(super::decode(&[]), Err(super::DecodeError::Truncated));
        assert_eq!(super::decode(&[0x80]), Err(super::DecodeError::Truncated));
        assert_eq!(
            super::decode(&[0xff, 0xff]),
            Err(super::DecodeError::Truncated)
        );
    }

    #[test]
    fn decode_not_minimal() {
        assert_eq!(
            super::decode(&[0x81, 0x0]),
            Err(super::DecodeError::NotMinimal)
        );
    }

    #[test]
    fn decode_overflow() {
        // A continuation chain longer than nine bytes must be rejected, no
        // matter what value it would represent.
        let encoded = (0..10).map(|_| 0x81u8).collect::<Vec<_>>();
        assert_eq!(
            super::decode(&encoded),
            Err(super::DecodeError::Overflow)
        );
    }

    #[test]
    fn nine_byte_bound() {
        let max = (1u64 << 63) - 1;
        let encoded = super::encode(max);
        assert_eq!(encoded.len(), 9);
        assert_eq!(super::decode(&encoded), Ok((max, 9)));
    }

    #[test]
    fn roundtrip_random() {
        for _ in 0..128 {
            let value = rand::random::<u64>() >> 1;
            let encoded = super::encode(value);
            assert_eq!(super::decode(&encoded), Ok((value, encoded.len())));
        }
    }
}
