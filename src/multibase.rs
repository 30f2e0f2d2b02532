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

//! Multibase-prefixed strings.
//!
//! A multibase string carries its own base encoding as a one-character
//! prefix. Only the bases that actually appear in certificate hashes are
//! supported here.
//!
//! See <https://github.com/multiformats/multibase>.

use alloc::{string::String, vec::Vec};
use base64::Engine as _;

/// Base encoding designated by a multibase prefix character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Base {
    /// `f`, lowercase hexadecimal.
    Base16Lower,
    /// `b`, lowercase RFC 4648 base32 without padding.
    Base32Lower,
    /// `z`, base58 with the Bitcoin alphabet.
    Base58Btc,
    /// `m`, RFC 4648 base64 without padding.
    Base64,
    /// `u`, RFC 4648 base64url without padding.
    Base64Url,
}

impl Base {
    fn from_prefix(prefix: char) -> Option<Base> {
        match prefix {
            'f' => Some(Base::Base16Lower),
            'b' => Some(Base::Base32Lower),
            'z' => Some(Base::Base58Btc),
            'm' => Some(Base::Base64),
            'u' => Some(Base::Base64Url),
            _ => None,
        }
    }

    fn prefix(self) -> char {
        match self {
            Base::Base16Lower => 'f',
            Base::Base32Lower => 'b',
            Base::Base58Btc => 'z',
            Base::Base64 => 'm',
            Base::Base64Url => 'u',
        }
    }
}

/// Error potentially returned by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub(crate) enum DecodeError {
    /// The input is empty.
    #[display(fmt = "empty multibase string")]
    Empty,
    /// The prefix character doesn't designate a supported base.
    #[display(fmt = "unsupported multibase prefix `{}`", _0)]
    UnknownPrefix(char),
    /// The payload isn't valid in the designated base.
    #[display(fmt = "invalid multibase payload")]
    InvalidPayload,
}

/// Decodes a multibase string into the base it designates and its payload.
pub(crate) fn decode(input: &str) -> Result<(Base, Vec<u8>), DecodeError> {
    let mut chars = input.chars();
    let prefix = chars.next().ok_or(DecodeError::Empty)?;
    let base = Base::from_prefix(prefix).ok_or(DecodeError::UnknownPrefix(prefix))?;
    let payload = chars.as_str();

    let decoded = match base {
        Base::Base16Lower => data_encoding::HEXLOWER
            .decode(payload.as_bytes())
            .map_err(|_| DecodeError::InvalidPayload)?,
        Base::Base32Lower => base32_lower_nopad()
            .decode(payload.as_bytes())
            .map_err(|_| DecodeError::InvalidPayload)?,
        Base::Base58Btc => bs58::decode(payload)
            .into_vec()
            .map_err(|_| DecodeError::InvalidPayload)?,
        Base::Base64 => base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(payload)
            .map_err(|_| DecodeError::InvalidPayload)?,
        Base::Base64Url => base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| DecodeError::InvalidPayload)?,
    };

    Ok((base, decoded))
}

/// Encodes `data` in the given base, with the multibase prefix.
pub(crate) fn encode(base: Base, data: &[u8]) -> String {
    let mut out = String::with_capacity(1 + data.len() * 2);
    out.push(base.prefix());
    match base {
        Base::Base16Lower => out.push_str(&data_encoding::HEXLOWER.encode(data)),
        Base::Base32Lower => out.push_str(&base32_lower_nopad().encode(data)),
        Base::Base58Btc => out.push_str(&bs58::encode(data).into_string()),
        Base::Base64 => {
            out.push_str(&base64::engine::general_purpose::STANDARD_NO_PAD.encode(data))
        }
        Base::Base64Url => {
            out.push_str(&base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data))
        }
    }
    out
}

/// Lowercase RFC 4648 base32 without padding.
///
/// Also used by the onion and garlic transcoders, whose addresses use this
/// exact alphabet.
pub(crate) fn base32_lower_nopad() -> &'static data_encoding::Encoding {
    static ENCODING: once_cell::race::OnceBox<data_encoding::Encoding> =
        once_cell::race::OnceBox::new();
    ENCODING.get_or_init(|| {
        let mut spec = data_encoding::Specification::new();
        spec.symbols.push_str("abcdefghijklmnopqrstuvwxyz234567");
        // Addresses in the wild carry non-zero bits after the last full
        // byte; decoders are expected to ignore them.
        spec.check_trailing_bits = false;
        alloc::boxed::Box::new(spec.encoding().unwrap())
    })
}
