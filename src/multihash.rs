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

//! A multihash is a small data structure containing a code (an integer) and
//! a digest whose length is carried explicitly. Peer identities and
//! certificate hashes are stored in this format.
//!
//! See <https://github.com/multiformats/multihash>

use core::fmt;

/// Multihash code of the sha2-256 hash algorithm.
const SHA2_256: u32 = 0x12;
/// Multihash code of the sha2-512 hash algorithm.
const SHA2_512: u32 = 0x13;

/// A multihash made of a code and a slice of data.
///
/// This type is a *reference* to a multihash stored somewhere else, such as
/// in a `Vec<u8>`. It is not meant for long-term storage; store the encoded
/// bytes instead and decode them on demand.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MultihashRef<'a> {
    code: u32,
    digest: &'a [u8],
}

impl<'a> MultihashRef<'a> {
    /// Returns the hash algorithm code stored in this multihash.
    pub fn hash_algorithm_code(&self) -> u32 {
        self.code
    }

    /// Returns the digest stored in this multihash.
    pub fn digest(&self) -> &'a [u8] {
        self.digest
    }

    /// Checks whether `input` is a valid multihash occupying the whole slice.
    pub fn from_bytes(input: &'a [u8]) -> Result<MultihashRef<'a>, FromBytesError> {
        let multihash =
            match nom::combinator::all_consuming(multihash::<nom::error::Error<&[u8]>>)(input) {
                Ok((_rest, multihash)) => {
                    debug_assert!(_rest.is_empty());
                    multihash
                }
                Err(_) => return Err(FromBytesError::DecodeError),
            };

        // Fixed-output algorithms must carry a digest of their natural
        // length. The identity algorithm carries arbitrary data.
        let expected = match multihash.code {
            SHA2_256 => Some(32),
            SHA2_512 => Some(64),
            _ => None,
        };
        if let Some(expected) = expected {
            if multihash.digest.len() != expected {
                return Err(FromBytesError::InvalidDigestLength {
                    code: multihash.code,
                    length: multihash.digest.len(),
                });
            }
        }

        Ok(multihash)
    }
}

/// Error when turning bytes into a [`MultihashRef`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum FromBytesError {
    /// The bytes don't decode as a code-length-digest triple.
    #[display(fmt = "invalid multihash")]
    DecodeError,
    /// The digest length doesn't match the hash algorithm's output length.
    #[display(
        fmt = "invalid digest length {} for multihash code {}",
        length,
        code
    )]
    InvalidDigestLength {
        /// Hash algorithm code found in the multihash.
        code: u32,
        /// Length of the digest that was found.
        length: usize,
    },
}

impl<'a> fmt::Debug for MultihashRef<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultihashRef")
            .field("code", &self.code)
            .field("digest", &self.digest)
            .finish()
    }
}

fn multihash<'a, E: nom::error::ParseError<&'a [u8]>>(
    bytes: &'a [u8],
) -> nom::IResult<&'a [u8], MultihashRef<'a>, E> {
    nom::combinator::map(
        nom::sequence::tuple((
            nom::combinator::map_opt(crate::varint::nom_varint_usize, |c| u32::try_from(c).ok()),
            nom::multi::length_data(crate::varint::nom_varint_usize),
        )),
        |(code, digest)| MultihashRef { code, digest },
    )(bytes)
}
