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

//! Per-protocol value codecs.
//!
//! Each value-bearing protocol owns a *transcoder* that converts its value
//! between the human-readable token of the string form and the raw bytes of
//! the binary form, plus a validator that decides whether raw bytes are
//! acceptable at all. The three operations obey the following contract:
//!
//! - [`Transcoder::validate_bytes`] accepts everything
//!   [`Transcoder::string_to_bytes`] produces.
//! - [`Transcoder::string_to_bytes`] inverts [`Transcoder::bytes_to_string`]
//!   exactly.
//! - [`Transcoder::bytes_to_string`] inverts [`Transcoder::string_to_bytes`]
//!   up to canonicalisation (e.g. onion hosts are printed lowercase no
//!   matter the case they were parsed with).
//!
//! Dispatch is a tagged union rather than trait objects: the set of value
//! encodings is closed, and a `match` keeps every codec in one place.

use alloc::{
    borrow::ToOwned as _,
    string::{String, ToString as _},
    vec::Vec,
};
use base64::Engine as _;
use core::str::{self, FromStr as _};

use crate::{multibase, multihash};

/// Value codec of a value-bearing protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transcoder {
    /// Four-octet IPv4 address.
    Ip4,
    /// Sixteen-byte IPv6 address.
    Ip6,
    /// Raw UTF-8 IPv6 zone identifier.
    Ip6Zone,
    /// Single-byte CIDR prefix length.
    IpCidr,
    /// Two-byte big-endian port number (tcp, udp, dccp, sctp).
    Port,
    /// Tor v2 hidden service: 10-byte host followed by a 2-byte port.
    Onion,
    /// Tor v3 hidden service: 35-byte host followed by a 2-byte port.
    Onion3,
    /// i2p address in the i2p base64 alphabet.
    Garlic64,
    /// i2p address in lowercase unpadded base32.
    Garlic32,
    /// base58btc-encoded multihash of a peer identity.
    P2p,
    /// Raw UTF-8 domain name (dns, dns4, dns6, dnsaddr, sni).
    Dns,
    /// Multibase-encoded multihash of a TLS certificate.
    CertHash,
    /// Percent-encoded URL path.
    HttpPath,
    /// Filesystem path, stored verbatim.
    Unix,
    /// Eight-byte big-endian memory transport identifier.
    Memory,
}

impl Transcoder {
    /// Converts the token of the string form into raw value bytes.
    ///
    /// The output is *not* implicitly validated; parsers call
    /// [`Transcoder::validate_bytes`] on it afterwards.
    pub fn string_to_bytes(&self, input: &str) -> Result<Vec<u8>, ValueError> {
        match self {
            Transcoder::Ip4 => {
                let addr = no_std_net::Ipv4Addr::from_str(input)
                    .map_err(|_| ValueError::InvalidIp4)?;
                Ok(addr.octets().to_vec())
            }
            Transcoder::Ip6 => {
                let addr = no_std_net::Ipv6Addr::from_str(input)
                    .map_err(|_| ValueError::InvalidIp6)?;
                Ok(addr.octets().to_vec())
            }
            Transcoder::Ip6Zone => {
                if input.is_empty() {
                    return Err(ValueError::EmptyZone);
                }
                Ok(input.as_bytes().to_vec())
            }
            Transcoder::IpCidr => {
                let prefix_len =
                    input.parse::<u8>().map_err(|_| ValueError::InvalidCidr)?;
                Ok(Vec::from([prefix_len]))
            }
            Transcoder::Port => {
                let port = input.parse::<u16>().map_err(|_| ValueError::InvalidPort)?;
                Ok(port.to_be_bytes().to_vec())
            }
            Transcoder::Onion => onion_to_bytes(input, 16),
            Transcoder::Onion3 => onion_to_bytes(input, 56),
            Transcoder::Garlic64 => {
                // i2p base64 addresses are between 516 and 616 characters
                // long, depending on certificate type.
                if input.len() < 516 || input.len() > 616 {
                    return Err(ValueError::Garlic64Length(input.len()));
                }
                garlic64_engine()
                    .decode(input)
                    .map_err(|_| ValueError::Garlic64Encoding)
            }
            Transcoder::Garlic32 => {
                // An address longer than 55 characters designates an
                // encrypted leaseset v2; every other address is exactly 52
                // characters.
                if input.len() < 55 && input.len() != 52 {
                    return Err(ValueError::Garlic32Length(input.len()));
                }
                multibase::base32_lower_nopad()
                    .decode(input.as_bytes())
                    .map_err(|_| ValueError::Garlic32Encoding)
            }
            Transcoder::P2p => bs58::decode(input)
                .into_vec()
                .map_err(|_| ValueError::InvalidBase58),
            Transcoder::Dns => Ok(input.as_bytes().to_vec()),
            Transcoder::CertHash => {
                let (_base, decoded) =
                    multibase::decode(input).map_err(|_| ValueError::InvalidMultibase)?;
                Ok(decoded)
            }
            Transcoder::HttpPath => {
                if !has_valid_percent_escapes(input) {
                    return Err(ValueError::InvalidPercentEscape);
                }
                Ok(percent_encoding::percent_decode_str(input).collect())
            }
            Transcoder::Unix => Ok(input.as_bytes().to_vec()),
            Transcoder::Memory => {
                let value = input.parse::<u64>().map_err(|_| ValueError::InvalidMemory)?;
                Ok(value.to_be_bytes().to_vec())
            }
        }
    }

    /// Converts raw value bytes back into the token of the string form.
    pub fn bytes_to_string(&self, bytes: &[u8]) -> Result<String, ValueError> {
        match self {
            Transcoder::Ip4 => {
                let octets = <[u8; 4]>::try_from(bytes)
                    .map_err(|_| ValueError::InvalidLength(bytes.len()))?;
                Ok(no_std_net::Ipv4Addr::from(octets).to_string())
            }
            Transcoder::Ip6 => {
                let octets = <[u8; 16]>::try_from(bytes)
                    .map_err(|_| ValueError::InvalidLength(bytes.len()))?;
                Ok(no_std_net::Ipv6Addr::from(octets).to_string())
            }
            Transcoder::Ip6Zone => {
                if bytes.is_empty() {
                    return Err(ValueError::EmptyZone);
                }
                Ok(str::from_utf8(bytes)
                    .map_err(|_| ValueError::InvalidUtf8)?
                    .to_owned())
            }
            Transcoder::IpCidr => match bytes {
                [prefix_len] => Ok(prefix_len.to_string()),
                _ => Err(ValueError::InvalidLength(bytes.len())),
            },
            Transcoder::Port => {
                let bytes = <[u8; 2]>::try_from(bytes)
                    .map_err(|_| ValueError::InvalidLength(bytes.len()))?;
                Ok(u16::from_be_bytes(bytes).to_string())
            }
            Transcoder::Onion => onion_to_string(bytes, 10),
            Transcoder::Onion3 => onion_to_string(bytes, 35),
            Transcoder::Garlic64 => {
                self.validate_bytes(bytes)?;
                Ok(garlic64_engine().encode(bytes))
            }
            Transcoder::Garlic32 => {
                self.validate_bytes(bytes)?;
                Ok(multibase::base32_lower_nopad().encode(bytes))
            }
            Transcoder::P2p => {
                self.validate_bytes(bytes)?;
                Ok(bs58::encode(bytes).into_string())
            }
            Transcoder::Dns => {
                self.validate_bytes(bytes)?;
                Ok(str::from_utf8(bytes)
                    .map_err(|_| ValueError::InvalidUtf8)?
                    .to_owned())
            }
            Transcoder::CertHash => {
                self.validate_bytes(bytes)?;
                Ok(multibase::encode(multibase::Base::Base64Url, bytes))
            }
            Transcoder::HttpPath => {
                self.validate_bytes(bytes)?;
                Ok(percent_encoding::percent_encode(bytes, PATH_ESCAPES).to_string())
            }
            Transcoder::Unix => {
                self.validate_bytes(bytes)?;
                Ok(str::from_utf8(bytes)
                    .map_err(|_| ValueError::InvalidUtf8)?
                    .to_owned())
            }
            Transcoder::Memory => {
                let bytes = <[u8; 8]>::try_from(bytes)
                    .map_err(|_| ValueError::InvalidLength(bytes.len()))?;
                Ok(u64::from_be_bytes(bytes).to_string())
            }
        }
    }

    /// Checks whether raw value bytes are acceptable for this protocol.
    pub fn validate_bytes(&self, bytes: &[u8]) -> Result<(), ValueError> {
        match self {
            Transcoder::Ip4 => expect_len(bytes, 4),
            Transcoder::Ip6 => expect_len(bytes, 16),
            Transcoder::Ip6Zone => {
                if bytes.is_empty() {
                    return Err(ValueError::EmptyZone);
                }
                // A `/` would tear the component apart when printed.
                if bytes.contains(&b'/') {
                    return Err(ValueError::ZoneContainsSlash);
                }
                str::from_utf8(bytes).map_err(|_| ValueError::InvalidUtf8)?;
                Ok(())
            }
            Transcoder::IpCidr => expect_len(bytes, 1),
            Transcoder::Port => expect_len(bytes, 2),
            Transcoder::Onion => expect_len(bytes, 12),
            Transcoder::Onion3 => expect_len(bytes, 37),
            Transcoder::Garlic64 => {
                // A garlic64 address is always at least 386 bytes long once
                // decoded.
                if bytes.len() < 386 {
                    return Err(ValueError::Garlic64TooShort(bytes.len()));
                }
                Ok(())
            }
            Transcoder::Garlic32 => {
                // 32 bytes for a regular address, at least 35 for an
                // encrypted leaseset v2.
                if bytes.len() < 35 && bytes.len() != 32 {
                    return Err(ValueError::Garlic32ByteLength(bytes.len()));
                }
                Ok(())
            }
            Transcoder::P2p | Transcoder::CertHash => {
                multihash::MultihashRef::from_bytes(bytes).map_err(ValueError::Multihash)?;
                Ok(())
            }
            Transcoder::Dns => {
                if bytes.is_empty() {
                    return Err(ValueError::EmptyDomainName);
                }
                if bytes.contains(&b'/') {
                    return Err(ValueError::DomainNameContainsSlash);
                }
                str::from_utf8(bytes).map_err(|_| ValueError::InvalidUtf8)?;
                Ok(())
            }
            Transcoder::HttpPath => {
                if bytes.is_empty() {
                    return Err(ValueError::EmptyPath);
                }
                str::from_utf8(bytes).map_err(|_| ValueError::InvalidUtf8)?;
                Ok(())
            }
            Transcoder::Unix => {
                if bytes.is_empty() {
                    return Err(ValueError::EmptyPath);
                }
                str::from_utf8(bytes).map_err(|_| ValueError::InvalidUtf8)?;
                Ok(())
            }
            Transcoder::Memory => expect_len(bytes, 8),
        }
    }
}

/// Error produced by the transcoding operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ValueError {
    /// Failed to parse an IPv4 address.
    #[display(fmt = "failed to parse IPv4 address")]
    InvalidIp4,
    /// Failed to parse an IPv6 address.
    #[display(fmt = "failed to parse IPv6 address")]
    InvalidIp6,
    /// IPv6 zone identifiers must not be empty.
    #[display(fmt = "empty IPv6 zone")]
    EmptyZone,
    /// IPv6 zone identifiers must not contain a `/`.
    #[display(fmt = "IPv6 zone contains a `/`")]
    ZoneContainsSlash,
    /// Failed to parse a CIDR prefix length.
    #[display(fmt = "failed to parse CIDR prefix length")]
    InvalidCidr,
    /// Failed to parse a port number.
    #[display(fmt = "failed to parse port number")]
    InvalidPort,
    /// Onion addresses must be of the form `host:port`.
    #[display(fmt = "onion address is missing a port")]
    OnionMissingPort,
    /// The host part of an onion address has the wrong length.
    #[display(fmt = "onion host has invalid length {}", _0)]
    OnionHostLength(usize),
    /// The host part of an onion address isn't valid base32.
    #[display(fmt = "failed to decode base32 onion host")]
    OnionHostEncoding,
    /// Onion ports must be between 1 and 65535.
    #[display(fmt = "invalid onion port")]
    OnionPort,
    /// A garlic64 string must be between 516 and 616 characters long.
    #[display(fmt = "invalid garlic64 address length {}", _0)]
    Garlic64Length(usize),
    /// The garlic64 payload isn't valid i2p base64.
    #[display(fmt = "failed to decode base64 garlic address")]
    Garlic64Encoding,
    /// A decoded garlic64 address is at least 386 bytes long.
    #[display(fmt = "garlic64 address too short: {} bytes", _0)]
    Garlic64TooShort(usize),
    /// A garlic32 string is exactly 52 characters long, or at least 55.
    #[display(fmt = "invalid garlic32 address length {}", _0)]
    Garlic32Length(usize),
    /// The garlic32 payload isn't valid base32.
    #[display(fmt = "failed to decode base32 garlic address")]
    Garlic32Encoding,
    /// A decoded garlic32 address is 32 bytes long, or at least 35.
    #[display(fmt = "invalid garlic32 address byte length {}", _0)]
    Garlic32ByteLength(usize),
    /// The value isn't valid base58.
    #[display(fmt = "failed to decode base58 value")]
    InvalidBase58,
    /// The value isn't a well-formed multihash.
    #[display(fmt = "{}", _0)]
    Multihash(multihash::FromBytesError),
    /// The value isn't a valid multibase string.
    #[display(fmt = "invalid multibase string")]
    InvalidMultibase,
    /// Domain names must not be empty.
    #[display(fmt = "empty domain name")]
    EmptyDomainName,
    /// Domain names must not contain a `/`.
    #[display(fmt = "domain name contains a `/`")]
    DomainNameContainsSlash,
    /// A `%` must introduce exactly two hexadecimal digits.
    #[display(fmt = "invalid percent escape")]
    InvalidPercentEscape,
    /// Paths must not be empty.
    #[display(fmt = "empty path")]
    EmptyPath,
    /// Failed to parse a memory transport identifier.
    #[display(fmt = "failed to parse memory transport identifier")]
    InvalidMemory,
    /// The value bytes aren't valid UTF-8.
    #[display(fmt = "value is not valid UTF-8")]
    InvalidUtf8,
    /// The value has the wrong length for this protocol.
    #[display(fmt = "invalid value length {}", _0)]
    InvalidLength(usize),
}

fn expect_len(bytes: &[u8], expected: usize) -> Result<(), ValueError> {
    if bytes.len() != expected {
        return Err(ValueError::InvalidLength(bytes.len()));
    }
    Ok(())
}

/// Parses `host:port` where the host is `host_chars` characters of base32.
///
/// Onion hosts are case-insensitive on input and canonically lowercase.
fn onion_to_bytes(input: &str, host_chars: usize) -> Result<Vec<u8>, ValueError> {
    let (host, port) = input.split_once(':').ok_or(ValueError::OnionMissingPort)?;
    if host.len() != host_chars {
        return Err(ValueError::OnionHostLength(host.len()));
    }

    let mut host = host.to_owned();
    host.make_ascii_lowercase();
    let host_bytes = multibase::base32_lower_nopad()
        .decode(host.as_bytes())
        .map_err(|_| ValueError::OnionHostEncoding)?;

    let port = port.parse::<u16>().map_err(|_| ValueError::OnionPort)?;
    if port == 0 {
        return Err(ValueError::OnionPort);
    }

    let mut out = Vec::with_capacity(host_bytes.len() + 2);
    out.extend_from_slice(&host_bytes);
    out.extend_from_slice(&port.to_be_bytes());
    Ok(out)
}

fn onion_to_string(bytes: &[u8], host_len: usize) -> Result<String, ValueError> {
    if bytes.len() != host_len + 2 {
        return Err(ValueError::InvalidLength(bytes.len()));
    }
    let host = multibase::base32_lower_nopad().encode(&bytes[..host_len]);
    let port = u16::from_be_bytes([bytes[host_len], bytes[host_len + 1]]);
    let mut out = host;
    out.push(':');
    out.push_str(&port.to_string());
    Ok(out)
}

/// Returns `true` if every `%` in `input` introduces two hexadecimal digits.
///
/// [`percent_encoding::percent_decode_str`] passes malformed escapes through
/// unchanged, so strictness has to be checked up front.
fn has_valid_percent_escapes(input: &str) -> bool {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return false;
            }
            if !bytes[i + 1].is_ascii_hexdigit() || !bytes[i + 2].is_ascii_hexdigit() {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Characters escaped when printing an http-path value: everything except
/// ASCII alphanumerics and the RFC 3986 unreserved marks.
const PATH_ESCAPES: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Base64 engine for the i2p alphabet, which replaces `+` and `/` with `-`
/// and `~`.
fn garlic64_engine() -> &'static base64::engine::GeneralPurpose {
    static ENGINE: once_cell::race::OnceBox<base64::engine::GeneralPurpose> =
        once_cell::race::OnceBox::new();
    ENGINE.get_or_init(|| {
        let alphabet = base64::alphabet::Alphabet::new(
            "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-~",
        )
        .unwrap();
        alloc::boxed::Box::new(base64::engine::GeneralPurpose::new(
            &alphabet,
            base64::engine::GeneralPurposeConfig::new()
                .with_decode_padding_mode(base64::engine::DecodePaddingMode::Indifferent),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::{Transcoder, ValueError};
    use alloc::{string::String, vec, vec::Vec};

    fn roundtrip(transcoder: Transcoder, token: &str) -> (Vec<u8>, String) {
        let bytes = transcoder.string_to_bytes(token).unwrap();
        transcoder.validate_bytes(&bytes).unwrap();
        let printed = transcoder.bytes_to_string(&bytes).unwrap();
        (bytes, printed)
    }

    #[test]
    fn ip4() {
        let (bytes, printed) = roundtrip(Transcoder::Ip4, "127.0.0.1");
        assert_eq!(bytes, &[127, 0, 0, 1]);
        assert_eq!(printed, "127.0.0.1");

        assert!(Transcoder::Ip4.string_to_bytes("::1").is_err());
        assert!(Transcoder::Ip4.string_to_bytes("fdpsofodsajfdoisa").is_err());
        assert!(Transcoder::Ip4.string_to_bytes("1.2.3").is_err());
    }

    #[test]
    fn ip6() {
        let (bytes, printed) = roundtrip(Transcoder::Ip6, "::1");
        assert_eq!(bytes.len(), 16);
        assert_eq!(printed, "::1");

        // The IPv4-mapped form must print with the `::ffff:` prefix.
        let (_, printed) = roundtrip(Transcoder::Ip6, "::ffff:127.0.0.1");
        assert_eq!(printed, "::ffff:127.0.0.1");

        let (_, printed) = roundtrip(Transcoder::Ip6, "2601:9:4f81:9700:803e:ca65:66e8:c21");
        assert_eq!(printed, "2601:9:4f81:9700:803e:ca65:66e8:c21");
    }

    #[test]
    fn ip6zone() {
        let (bytes, printed) = roundtrip(Transcoder::Ip6Zone, "eth0");
        assert_eq!(bytes, b"eth0");
        assert_eq!(printed, "eth0");

        assert!(Transcoder::Ip6Zone.string_to_bytes("").is_err());
        assert_eq!(
            Transcoder::Ip6Zone.validate_bytes(b"eth/0"),
            Err(ValueError::ZoneContainsSlash)
        );
    }

    #[test]
    fn ipcidr() {
        let (bytes, printed) = roundtrip(Transcoder::IpCidr, "24");
        assert_eq!(bytes, &[24]);
        assert_eq!(printed, "24");

        assert!(Transcoder::IpCidr.string_to_bytes("256").is_err());
        assert!(Transcoder::IpCidr.string_to_bytes("1026").is_err());
    }

    #[test]
    fn port() {
        let (bytes, printed) = roundtrip(Transcoder::Port, "1234");
        assert_eq!(bytes, &[0x04, 0xd2]);
        assert_eq!(printed, "1234");

        let (bytes, _) = roundtrip(Transcoder::Port, "0");
        assert_eq!(bytes, &[0, 0]);
        let (bytes, _) = roundtrip(Transcoder::Port, "65535");
        assert_eq!(bytes, &[0xff, 0xff]);

        assert!(Transcoder::Port.string_to_bytes("65536").is_err());
        assert!(Transcoder::Port.string_to_bytes("-1").is_err());
        assert!(Transcoder::Port
            .string_to_bytes("jfodsajfidosajfoidsa")
            .is_err());
    }

    #[test]
    fn onion() {
        let (bytes, printed) = roundtrip(Transcoder::Onion, "aaimaq4ygg2iegci:80");
        assert_eq!(
            bytes,
            hex::decode("0010c0439831b48218480050").unwrap()
        );
        assert_eq!(printed, "aaimaq4ygg2iegci:80");

        // Hosts are case-insensitive and canonically lowercase.
        let (upper_bytes, printed) = roundtrip(Transcoder::Onion, "AAIMAQ4YGG2IEGCI:80");
        assert_eq!(upper_bytes, bytes);
        assert_eq!(printed, "aaimaq4ygg2iegci:80");

        assert!(Transcoder::Onion.string_to_bytes("timaq4ygg2iegci7").is_err());
        assert!(Transcoder::Onion
            .string_to_bytes("aaimaq4ygg2iegci7:80")
            .is_err());
        assert!(Transcoder::Onion
            .string_to_bytes("timaq4ygg2iegci7:0")
            .is_err());
        assert!(Transcoder::Onion
            .string_to_bytes("timaq4ygg2iegci7:-1")
            .is_err());
        assert!(Transcoder::Onion
            .string_to_bytes("timaq4ygg2iegci@:666")
            .is_err());
        assert!(Transcoder::Onion
            .string_to_bytes("9imaq4ygg2iegci7:80")
            .is_err());
    }

    #[test]
    fn onion3() {
        let (bytes, printed) = roundtrip(
            Transcoder::Onion3,
            "vww6ybal4bd7szmgncyruucpgfkqahzddi37ktceo3ah7ngmcopnpyyd:1234",
        );
        assert_eq!(
            bytes,
            hex::decode(
                "adadec040be047f9658668b11a504f3155001f231a37f54c4476c07fb4cc139ed7e30304d2"
            )
            .unwrap()
        );
        assert_eq!(
            printed,
            "vww6ybal4bd7szmgncyruucpgfkqahzddi37ktceo3ah7ngmcopnpyyd:1234"
        );

        assert!(Transcoder::Onion3
            .string_to_bytes("vww6ybal4bd7szmgncyruucpgfkqahzddi37ktceo3ah7ngmcopnpyyd7:80")
            .is_err());
        assert!(Transcoder::Onion3
            .string_to_bytes("vww6ybal4bd7szmgncyruucpgfkqahzddi37ktceo3ah7ngmcopnpyyd:0")
            .is_err());
        assert!(Transcoder::Onion3
            .string_to_bytes("vww6ybal4bd7szmgncyruucpgfkqahzddi37ktceo3ah7ngmcopnpyyd")
            .is_err());
    }

    #[test]
    fn garlic32() {
        let token = "566niximlxdzpanmn4qouucvua3k7neniwss47li5r6ugoertzuq";
        let (bytes, printed) = roundtrip(Transcoder::Garlic32, token);
        assert_eq!(
            bytes,
            hex::decode("efbcd45d0c5dc79781ac6f20ea5055a036afb48d45a52e7d68ec7d4338919e69")
                .unwrap()
        );
        assert_eq!(printed, token);

        // Encrypted leaseset v2 addresses are longer.
        roundtrip(
            Transcoder::Garlic32,
            "566niximlxdzpanmn4qouucvua3k7neniwss47li5r6ugoertzuqzwassw",
        );

        // 51 and 53 characters are both invalid.
        assert!(Transcoder::Garlic32
            .string_to_bytes("566niximlxdzpanmn4qouucvua3k7neniwss47li5r6ugoertzu")
            .is_err());
        assert!(Transcoder::Garlic32
            .string_to_bytes("566niximlxdzpanmn4qouucvua3k7neniwss47li5r6ugoertzu77")
            .is_err());
        assert!(Transcoder::Garlic32
            .string_to_bytes("566niximlxdzpanmn4qouucvua3k7neniwss47li5r6ugoertzu@")
            .is_err());
    }

    #[test]
    fn p2p() {
        let token = "QmcgpsyWgH8Y8ajJz1Cu72KnS5uo2Aa2LpzU7kinSupNKC";
        let (bytes, printed) = roundtrip(Transcoder::P2p, token);
        assert_eq!(bytes[0], 0x12);
        assert_eq!(bytes.len(), 34);
        assert_eq!(printed, token);

        // Identity multihashes (inline ed25519 keys) are longer than 32
        // bytes and must be accepted.
        roundtrip(Transcoder::P2p, "12D3KooWCryG7Mon9orvQxcS1rYZjotPgpwoJNHHKcLLfE4Hf5mV");

        // A sha2-256 multihash whose digest is 33 bytes long.
        let bytes = Transcoder::P2p
            .string_to_bytes("QmxoHT6iViN5xAjoz1VZ553cL31U9F94ht3QvWR1FrEbZY")
            .unwrap();
        assert!(Transcoder::P2p.validate_bytes(&bytes).is_err());
    }

    #[test]
    fn dns() {
        let (bytes, printed) = roundtrip(Transcoder::Dns, "example.com");
        assert_eq!(bytes, b"example.com");
        assert_eq!(printed, "example.com");

        assert_eq!(
            Transcoder::Dns.validate_bytes(b""),
            Err(ValueError::EmptyDomainName)
        );
        assert_eq!(
            Transcoder::Dns.validate_bytes(b"example.com/path"),
            Err(ValueError::DomainNameContainsSlash)
        );
    }

    #[test]
    fn certhash() {
        let token = "uEiDDq4_xNyDorZBH3TlGazyJdOWSwvo4PUo5YHFMrvDE8g";
        let (bytes, printed) = roundtrip(Transcoder::CertHash, token);
        assert_eq!(bytes[0], 0x12);
        assert_eq!(printed, token);

        // Other multibase prefixes are accepted but canonicalised to
        // base64url when printed.
        let (bytes, printed) =
            roundtrip(Transcoder::CertHash, "b2uaraocy6yrdblb4sfptaddgimjmmpy");
        assert_eq!(
            printed,
            Transcoder::CertHash.bytes_to_string(&bytes).unwrap()
        );
        assert!(printed.starts_with('u'));

        // One character missing.
        assert!(Transcoder::CertHash
            .string_to_bytes("b2uaraocy6yrdblb4sfptaddgimjmmp")
            .is_err());
    }

    #[test]
    fn http_path() {
        let (bytes, printed) = roundtrip(Transcoder::HttpPath, "tmp%2Fbar");
        assert_eq!(bytes, b"tmp/bar");
        assert_eq!(printed, "tmp%2Fbar");

        let (bytes, printed) = roundtrip(Transcoder::HttpPath, "foo");
        assert_eq!(bytes, b"foo");
        assert_eq!(printed, "foo");

        assert_eq!(
            Transcoder::HttpPath.string_to_bytes("thisIsMissingAfullByte%f"),
            Err(ValueError::InvalidPercentEscape)
        );
        assert_eq!(
            Transcoder::HttpPath.string_to_bytes("bad%zzescape"),
            Err(ValueError::InvalidPercentEscape)
        );
    }

    #[test]
    fn unix() {
        let (bytes, printed) = roundtrip(Transcoder::Unix, "/a/b/c/d/e");
        assert_eq!(bytes, b"/a/b/c/d/e");
        assert_eq!(printed, "/a/b/c/d/e");

        assert_eq!(
            Transcoder::Unix.validate_bytes(b""),
            Err(ValueError::EmptyPath)
        );
    }

    #[test]
    fn memory() {
        let (bytes, printed) = roundtrip(Transcoder::Memory, "4");
        assert_eq!(bytes, &[0, 0, 0, 0, 0, 0, 0, 4]);
        assert_eq!(printed, "4");

        roundtrip(Transcoder::Memory, "18446744073709551615");
        assert!(Transcoder::Memory
            .string_to_bytes("92233720368547758081")
            .is_err());
    }

    #[test]
    fn garlic64_roundtrip() {
        let token = "jT~IyXaoauTni6N4517EG8mrFUKpy0IlgZh-EY9csMAk82Odatmzr~YTZy8Hv7u~wvkg75EFNOyqb~nAPg-khyp2TS~ObUz8WlqYAM2VlEzJ7wJB91P-cUlKF18zSzVoJFmsrcQHZCirSbWoOknS6iNmsGRh5KVZsBEfp1Dg3gwTipTRIx7Vl5Vy~1OSKQVjYiGZS9q8RL0MF~7xFiKxZDLbPxk0AK9TzGGqm~wMTI2HS0Gm4Ycy8LYPVmLvGonIBYndg2bJC7WLuF6tVjVquiokSVDKFwq70BCUU5AU-EvdOD5KEOAM7mPfw-gJUG4tm1TtvcobrObqoRnmhXPTBTN5H7qDD12AvlwFGnfAlBXjuP4xOUAISL5SRLiulrsMSiT4GcugSI80mF6sdB0zWRgL1yyvoVWeTBn1TqjO27alr95DGTluuSqrNAxgpQzCKEWAyzrQkBfo2avGAmmz2NaHaAvYbOg0QSJz1PLjv2jdPW~ofiQmrGWM1cd~1cCqAAAA";
        let (bytes, printed) = roundtrip(Transcoder::Garlic64, token);
        assert_eq!(bytes.len(), 387);
        assert_eq!(printed, token);

        // Too short, too long, bad alphabet.
        assert!(Transcoder::Garlic64.string_to_bytes("jT~IyXaoauTni6N").is_err());
        let mut overlong = alloc::string::String::from(token);
        for _ in 0..200 {
            overlong.push('A');
        }
        assert!(Transcoder::Garlic64.string_to_bytes(&overlong).is_err());
        let mut bad = alloc::string::String::from(token);
        bad.replace_range(0..1, "@");
        assert!(Transcoder::Garlic64.string_to_bytes(&bad).is_err());

        assert_eq!(
            Transcoder::Garlic64.validate_bytes(&vec![0; 385]),
            Err(ValueError::Garlic64TooShort(385))
        );
    }
}
