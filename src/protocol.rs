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

//! Protocol table.
//!
//! Every component of an address names a *protocol*: a registered pairing of
//! a numeric code (used on the wire), a name (used in the string form), a
//! size regime describing how the value is stored, and the transcoder that
//! encodes and validates the value.
//!
//! The [`Registry`] maps names and codes to [`Protocol`] records and
//! enforces their structural rules. The table of well-known protocols is
//! frozen at process start and accessible through [`Registry::global`];
//! codes follow the multicodec table at
//! <https://github.com/multiformats/multicodec>.

use alloc::{borrow::Cow, boxed::Box, string::String, vec::Vec};
use arrayvec::ArrayVec;
use hashbrown::HashMap;

use crate::{transcoder::Transcoder, varint};

// Codes of the well-known protocols.
pub const IP4: u32 = 4;
pub const TCP: u32 = 6;
pub const DCCP: u32 = 33;
pub const IP6: u32 = 41;
pub const IP6ZONE: u32 = 42;
pub const IPCIDR: u32 = 43;
pub const DNS: u32 = 53;
pub const DNS4: u32 = 54;
pub const DNS6: u32 = 55;
pub const DNSADDR: u32 = 56;
pub const SCTP: u32 = 132;
pub const UDP: u32 = 273;
pub const P2P_WEBRTC_DIRECT: u32 = 276;
pub const WEBRTC_DIRECT: u32 = 280;
pub const WEBRTC: u32 = 281;
pub const P2P_CIRCUIT: u32 = 290;
pub const UDT: u32 = 301;
pub const UTP: u32 = 302;
pub const UNIX: u32 = 400;
pub const P2P: u32 = 421;
pub const HTTPS: u32 = 443;
pub const ONION: u32 = 444;
pub const ONION3: u32 = 445;
pub const GARLIC64: u32 = 446;
pub const GARLIC32: u32 = 447;
pub const TLS: u32 = 448;
pub const SNI: u32 = 449;
pub const NOISE: u32 = 454;
pub const QUIC: u32 = 460;
pub const QUIC_V1: u32 = 461;
pub const WEBTRANSPORT: u32 = 465;
pub const CERTHASH: u32 = 466;
pub const WS: u32 = 477;
pub const WSS: u32 = 478;
pub const HTTP: u32 = 480;
pub const HTTP_PATH: u32 = 481;
pub const MEMORY: u32 = 777;
pub const PLAINTEXTV2: u32 = 7367777;

/// Size regime of a protocol's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// The protocol carries no value.
    Empty,
    /// The value occupies a fixed number of bits, always a multiple of 8.
    Fixed(u32),
    /// The value is stored behind a varint length prefix.
    Variable,
}

impl Size {
    /// Number of bytes the value occupies, or `None` for the
    /// length-prefixed regime.
    pub fn value_len(&self) -> Option<usize> {
        match self {
            Size::Empty => Some(0),
            Size::Fixed(bits) => Some(usize::try_from(*bits / 8).unwrap()),
            Size::Variable => None,
        }
    }
}

/// A registered protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    /// Numeric code identifying the protocol on the wire.
    pub code: u32,
    /// Name used in the string form.
    pub name: Cow<'static, str>,
    /// How the protocol's value is stored.
    pub size: Size,
    /// `true` if the value absorbs the remainder of a string address,
    /// embedded `/` included. Only permitted with [`Size::Variable`].
    pub path: bool,
    /// Value codec. Present exactly when [`Size`] isn't [`Size::Empty`].
    pub transcoder: Option<Transcoder>,
    /// Varint encoding of [`Protocol::code`], precomputed.
    vcode: ArrayVec<u8, { varint::MAX_LEN }>,
}

impl Protocol {
    /// Builds a protocol record, precomputing its varint code.
    pub fn new(
        code: u32,
        name: impl Into<Cow<'static, str>>,
        size: Size,
        transcoder: Option<Transcoder>,
    ) -> Protocol {
        Protocol {
            code,
            name: name.into(),
            size,
            path: false,
            transcoder,
            vcode: varint::encode(u64::from(code)),
        }
    }

    /// Same as [`Protocol::new`], for a path protocol. Implies
    /// [`Size::Variable`].
    pub fn new_path(
        code: u32,
        name: impl Into<Cow<'static, str>>,
        transcoder: Option<Transcoder>,
    ) -> Protocol {
        Protocol {
            path: true,
            ..Protocol::new(code, name, Size::Variable, transcoder)
        }
    }

    /// Varint encoding of [`Protocol::code`].
    pub fn vcode(&self) -> &[u8] {
        &self.vcode
    }
}

/// Error potentially returned by [`Registry::register`] and
/// [`Registry::alias`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RegistryError {
    /// A protocol with this name is already registered.
    #[display(fmt = "protocol name {} is already registered", _0)]
    DuplicateName(String),
    /// A protocol with this code is already registered.
    #[display(fmt = "protocol code {} is already registered", _0)]
    DuplicateCode(u32),
    /// Value-bearing protocols must have a transcoder.
    #[display(fmt = "value-bearing protocol is missing a transcoder")]
    MissingTranscoder,
    /// Protocols without a value must not have a transcoder.
    #[display(fmt = "protocol without a value has a transcoder")]
    UnexpectedTranscoder,
    /// Path protocols must use the variable size regime.
    #[display(fmt = "path protocol doesn't use a length-prefixed value")]
    PathWithoutVariableSize,
    /// Fixed sizes must be positive multiples of 8 bits.
    #[display(fmt = "invalid fixed size of {} bits", _0)]
    InvalidFixedSize(u32),
    /// The target of an alias isn't registered.
    #[display(fmt = "alias target {} is not registered", _0)]
    UnknownAliasTarget(String),
}

/// Table of registered protocols, indexed by name and by code.
pub struct Registry {
    protocols: Vec<Protocol>,
    by_name: HashMap<String, usize, SipHasherBuild>,
    by_code: HashMap<u32, usize, SipHasherBuild>,
}

impl Registry {
    /// Builds an empty registry.
    pub fn new() -> Registry {
        Registry {
            protocols: Vec::new(),
            by_name: HashMap::with_hasher(SipHasherBuild::new(*b"multiaddrnames!!")),
            by_code: HashMap::with_hasher(SipHasherBuild::new(*b"multiaddrcodes!!")),
        }
    }

    /// Builds a registry containing the table of well-known protocols,
    /// including the legacy `ipfs` alias for `p2p`.
    pub fn with_default_protocols() -> Registry {
        let mut registry = Registry::new();

        let defaults = [
            Protocol::new(IP4, "ip4", Size::Fixed(32), Some(Transcoder::Ip4)),
            Protocol::new(TCP, "tcp", Size::Fixed(16), Some(Transcoder::Port)),
            Protocol::new(DCCP, "dccp", Size::Fixed(16), Some(Transcoder::Port)),
            Protocol::new(IP6, "ip6", Size::Fixed(128), Some(Transcoder::Ip6)),
            Protocol::new(IP6ZONE, "ip6zone", Size::Variable, Some(Transcoder::Ip6Zone)),
            Protocol::new(IPCIDR, "ipcidr", Size::Fixed(8), Some(Transcoder::IpCidr)),
            Protocol::new(DNS, "dns", Size::Variable, Some(Transcoder::Dns)),
            Protocol::new(DNS4, "dns4", Size::Variable, Some(Transcoder::Dns)),
            Protocol::new(DNS6, "dns6", Size::Variable, Some(Transcoder::Dns)),
            Protocol::new(DNSADDR, "dnsaddr", Size::Variable, Some(Transcoder::Dns)),
            Protocol::new(SCTP, "sctp", Size::Fixed(16), Some(Transcoder::Port)),
            Protocol::new(UDP, "udp", Size::Fixed(16), Some(Transcoder::Port)),
            Protocol::new(P2P_WEBRTC_DIRECT, "p2p-webrtc-direct", Size::Empty, None),
            Protocol::new(WEBRTC_DIRECT, "webrtc-direct", Size::Empty, None),
            Protocol::new(WEBRTC, "webrtc", Size::Empty, None),
            Protocol::new(P2P_CIRCUIT, "p2p-circuit", Size::Empty, None),
            Protocol::new(UDT, "udt", Size::Empty, None),
            Protocol::new(UTP, "utp", Size::Empty, None),
            Protocol::new_path(UNIX, "unix", Some(Transcoder::Unix)),
            Protocol::new(P2P, "p2p", Size::Variable, Some(Transcoder::P2p)),
            Protocol::new(HTTPS, "https", Size::Empty, None),
            Protocol::new(ONION, "onion", Size::Fixed(96), Some(Transcoder::Onion)),
            Protocol::new(ONION3, "onion3", Size::Fixed(296), Some(Transcoder::Onion3)),
            Protocol::new(GARLIC64, "garlic64", Size::Variable, Some(Transcoder::Garlic64)),
            Protocol::new(GARLIC32, "garlic32", Size::Variable, Some(Transcoder::Garlic32)),
            Protocol::new(TLS, "tls", Size::Empty, None),
            Protocol::new(SNI, "sni", Size::Variable, Some(Transcoder::Dns)),
            Protocol::new(NOISE, "noise", Size::Empty, None),
            Protocol::new(QUIC, "quic", Size::Empty, None),
            Protocol::new(QUIC_V1, "quic-v1", Size::Empty, None),
            Protocol::new(WEBTRANSPORT, "webtransport", Size::Empty, None),
            Protocol::new(CERTHASH, "certhash", Size::Variable, Some(Transcoder::CertHash)),
            Protocol::new(WS, "ws", Size::Empty, None),
            Protocol::new(WSS, "wss", Size::Empty, None),
            Protocol::new(HTTP, "http", Size::Empty, None),
            Protocol::new(HTTP_PATH, "http-path", Size::Variable, Some(Transcoder::HttpPath)),
            Protocol::new(MEMORY, "memory", Size::Fixed(64), Some(Transcoder::Memory)),
            Protocol::new(PLAINTEXTV2, "plaintextv2", Size::Empty, None),
        ];

        for protocol in defaults {
            registry.register(protocol).unwrap();
        }
        registry.alias("ipfs", "p2p").unwrap();

        registry
    }

    /// Returns the process-wide registry of well-known protocols.
    ///
    /// Initialized on first use and frozen afterwards; concurrent readers
    /// need no synchronisation.
    pub fn global() -> &'static Registry {
        static REGISTRY: once_cell::race::OnceBox<Registry> = once_cell::race::OnceBox::new();
        REGISTRY.get_or_init(|| Box::new(Registry::with_default_protocols()))
    }

    /// Adds a protocol to the registry.
    ///
    /// Fails if the name or code is already bound, if a value-bearing
    /// protocol lacks a transcoder (or a valueless one has one), if `path`
    /// is set without the variable size regime, or if a fixed size isn't a
    /// positive multiple of 8 bits.
    pub fn register(&mut self, protocol: Protocol) -> Result<(), RegistryError> {
        match protocol.size {
            Size::Empty if protocol.transcoder.is_some() => {
                return Err(RegistryError::UnexpectedTranscoder)
            }
            Size::Empty => {}
            Size::Fixed(bits) if bits == 0 || bits % 8 != 0 => {
                return Err(RegistryError::InvalidFixedSize(bits))
            }
            Size::Fixed(_) | Size::Variable if protocol.transcoder.is_none() => {
                return Err(RegistryError::MissingTranscoder)
            }
            Size::Fixed(_) | Size::Variable => {}
        }
        if protocol.path && protocol.size != Size::Variable {
            return Err(RegistryError::PathWithoutVariableSize);
        }
        if self.by_name.contains_key(protocol.name.as_ref()) {
            return Err(RegistryError::DuplicateName(protocol.name.clone().into_owned()));
        }
        if self.by_code.contains_key(&protocol.code) {
            return Err(RegistryError::DuplicateCode(protocol.code));
        }

        let index = self.protocols.len();
        self.by_name
            .insert(protocol.name.clone().into_owned(), index);
        self.by_code.insert(protocol.code, index);
        self.protocols.push(protocol);
        Ok(())
    }

    /// Binds an additional name to an already-registered protocol.
    pub fn alias(&mut self, from: &str, to: &str) -> Result<(), RegistryError> {
        if self.by_name.contains_key(from) {
            return Err(RegistryError::DuplicateName(String::from(from)));
        }
        let index = *self
            .by_name
            .get(to)
            .ok_or_else(|| RegistryError::UnknownAliasTarget(String::from(to)))?;
        self.by_name.insert(String::from(from), index);
        Ok(())
    }

    /// Looks a protocol up by name.
    pub fn by_name(&self, name: &str) -> Option<&Protocol> {
        self.by_name.get(name).map(|index| &self.protocols[*index])
    }

    /// Looks a protocol up by code.
    pub fn by_code(&self, code: u32) -> Option<&Protocol> {
        self.by_code.get(&code).map(|index| &self.protocols[*index])
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}

/// Implementation of the `BuildHasher` trait for the sip hasher.
///
/// Contrary to the one in the standard library, a seed is explicitly passed
/// here, making the hashing predictable. This is a good thing for tests and
/// no-std compatibility.
pub(crate) struct SipHasherBuild([u8; 16]);

impl SipHasherBuild {
    pub(crate) fn new(seed: [u8; 16]) -> SipHasherBuild {
        SipHasherBuild(seed)
    }
}

impl core::hash::BuildHasher for SipHasherBuild {
    type Hasher = siphasher::sip::SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        siphasher::sip::SipHasher::new_with_key(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Protocol, Registry, RegistryError, Size};
    use crate::transcoder::Transcoder;

    #[test]
    fn default_table() {
        let registry = Registry::global();

        for (code, name, size) in [
            (super::IP4, "ip4", Size::Fixed(32)),
            (super::TCP, "tcp", Size::Fixed(16)),
            (super::UDP, "udp", Size::Fixed(16)),
            (super::IP6, "ip6", Size::Fixed(128)),
            (super::IP6ZONE, "ip6zone", Size::Variable),
            (super::IPCIDR, "ipcidr", Size::Fixed(8)),
            (super::DCCP, "dccp", Size::Fixed(16)),
            (super::SCTP, "sctp", Size::Fixed(16)),
            (super::DNS, "dns", Size::Variable),
            (super::P2P_CIRCUIT, "p2p-circuit", Size::Empty),
            (super::ONION, "onion", Size::Fixed(96)),
            (super::ONION3, "onion3", Size::Fixed(296)),
            (super::GARLIC64, "garlic64", Size::Variable),
            (super::GARLIC32, "garlic32", Size::Variable),
            (super::UNIX, "unix", Size::Variable),
            (super::P2P, "p2p", Size::Variable),
            (super::QUIC_V1, "quic-v1", Size::Empty),
            (super::WEBTRANSPORT, "webtransport", Size::Empty),
            (super::CERTHASH, "certhash", Size::Variable),
            (super::HTTP_PATH, "http-path", Size::Variable),
            (super::MEMORY, "memory", Size::Fixed(64)),
            (super::PLAINTEXTV2, "plaintextv2", Size::Empty),
        ] {
            let protocol = registry.by_name(name).unwrap();
            assert_eq!(protocol.code, code, "{}", name);
            assert_eq!(protocol.size, size, "{}", name);
            assert_eq!(registry.by_code(code).unwrap().name, name);
            // Transcoders are present exactly on value-bearing protocols.
            assert_eq!(protocol.transcoder.is_some(), size != Size::Empty);
        }

        // `unix` is the only path protocol.
        assert!(registry.by_name("unix").unwrap().path);
        assert_eq!(
            registry
                .protocols
                .iter()
                .filter(|protocol| protocol.path)
                .count(),
            1
        );
    }

    #[test]
    fn ipfs_alias() {
        let registry = Registry::global();
        let aliased = registry.by_name("ipfs").unwrap();
        assert_eq!(aliased.code, super::P2P);
        assert_eq!(aliased.name, "p2p");
    }

    #[test]
    fn unknown_lookups() {
        let registry = Registry::global();
        assert!(registry.by_name("dsijafd").is_none());
        assert!(registry.by_code(0).is_none());
        assert!(registry.by_code(123456).is_none());
    }

    #[test]
    fn vcode_is_varint_of_code() {
        let registry = Registry::global();
        let udp = registry.by_code(super::UDP).unwrap();
        assert_eq!(udp.vcode(), &[0x91, 0x02]);
        let ip4 = registry.by_code(super::IP4).unwrap();
        assert_eq!(ip4.vcode(), &[0x04]);
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = Registry::new();
        registry
            .register(Protocol::new(4, "ip4", Size::Fixed(32), Some(Transcoder::Ip4)))
            .unwrap();

        assert_eq!(
            registry.register(Protocol::new(
                999,
                "ip4",
                Size::Fixed(32),
                Some(Transcoder::Ip4)
            )),
            Err(RegistryError::DuplicateName("ip4".into()))
        );
        assert_eq!(
            registry.register(Protocol::new(
                4,
                "ip4bis",
                Size::Fixed(32),
                Some(Transcoder::Ip4)
            )),
            Err(RegistryError::DuplicateCode(4))
        );
    }

    #[test]
    fn register_enforces_structure() {
        let mut registry = Registry::new();

        assert_eq!(
            registry.register(Protocol::new(1, "novalue", Size::Empty, Some(Transcoder::Port))),
            Err(RegistryError::UnexpectedTranscoder)
        );
        assert_eq!(
            registry.register(Protocol::new(2, "valueless", Size::Fixed(16), None)),
            Err(RegistryError::MissingTranscoder)
        );
        assert_eq!(
            registry.register(Protocol::new(3, "oddsize", Size::Fixed(12), Some(Transcoder::Port))),
            Err(RegistryError::InvalidFixedSize(12))
        );
        let fixed_path = Protocol {
            path: true,
            ..Protocol::new(5, "fixedpath", Size::Fixed(16), Some(Transcoder::Port))
        };
        assert_eq!(
            registry.register(fixed_path),
            Err(RegistryError::PathWithoutVariableSize)
        );
    }

    #[test]
    fn alias_requires_target() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.alias("ipfs", "p2p"),
            Err(RegistryError::UnknownAliasTarget("p2p".into()))
        );
    }
}
