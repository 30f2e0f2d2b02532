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

//! A component is one `(protocol, value)` atom of an address.
//!
//! Each component owns its canonical byte image: the protocol's varint
//! code, the varint length prefix if the protocol's value is
//! variable-sized, then the value bytes. Components are immutable once
//! built, and equality, ordering and hashing are all defined on the byte
//! image alone.

use alloc::{
    string::{String, ToString as _},
    vec::Vec,
};
use core::{cmp, fmt, hash};

use crate::{
    multiaddr::{Error, Multiaddr},
    protocol::{Protocol, Registry, Size},
    varint,
};

/// A single multiaddr component.
#[derive(Clone)]
pub struct Component {
    /// Canonical byte image: varint code, optional varint value length,
    /// value bytes.
    bytes: Vec<u8>,
    protocol: Protocol,
    /// Offset of the first value byte within `bytes`.
    value_start: usize,
}

impl Component {
    /// Builds a component from a protocol name and an optional value token.
    ///
    /// Uses the process-wide registry; see [`Registry::new_component`] for
    /// the registry-owning equivalent.
    pub fn new(name: &str, value: Option<&str>) -> Result<Component, Error> {
        Registry::global().new_component(name, value)
    }

    /// Parses a component occupying the whole of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Component, Error> {
        let (read, component) = Component::read(Registry::global(), bytes)?;
        if read != bytes.len() {
            return Err(Error::TrailingBytes);
        }
        Ok(component)
    }

    /// Reads one component from the front of `bytes`, returning the number
    /// of bytes it occupied.
    pub(crate) fn read(
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(usize, Component), Error> {
        let (code, code_len) = varint::decode(bytes).map_err(Error::Varint)?;
        let protocol = u32::try_from(code)
            .ok()
            .and_then(|code| registry.by_code(code))
            .ok_or(Error::UnknownProtocolCode(code))?;

        let (value_start, value_len) = match protocol.size.value_len() {
            Some(value_len) => (code_len, value_len),
            None => {
                let (value_len, len_len) =
                    varint::decode(&bytes[code_len..]).map_err(Error::Varint)?;
                let value_len =
                    usize::try_from(value_len).map_err(|_| Error::TruncatedComponent)?;
                (code_len + len_len, value_len)
            }
        };

        let total = value_start
            .checked_add(value_len)
            .ok_or(Error::TruncatedComponent)?;
        if bytes.len() < total {
            return Err(Error::TruncatedComponent);
        }
        let component = Component {
            bytes: bytes[..total].to_vec(),
            protocol: protocol.clone(),
            value_start,
        };
        component.validate()?;
        Ok((total, component))
    }

    /// Builds a component from a protocol record and raw value bytes.
    pub(crate) fn from_parts(protocol: &Protocol, value: &[u8]) -> Result<Component, Error> {
        let mut bytes =
            Vec::with_capacity(protocol.vcode().len() + varint::MAX_LEN + value.len());
        bytes.extend_from_slice(protocol.vcode());
        if protocol.size == Size::Variable {
            bytes.extend_from_slice(&varint::encode_usize(value.len()));
        }
        let value_start = bytes.len();
        bytes.extend_from_slice(value);

        let component = Component {
            bytes,
            protocol: protocol.clone(),
            value_start,
        };
        component.validate()?;
        Ok(component)
    }

    /// Checks the byte-image invariants: the image starts with the
    /// protocol's varint code, its length adds up, and the value bytes
    /// satisfy the transcoder.
    fn validate(&self) -> Result<(), Error> {
        debug_assert!(self.bytes.starts_with(self.protocol.vcode()));
        debug_assert!(self.value_start >= self.protocol.vcode().len());
        debug_assert!(self.value_start <= self.bytes.len());

        if let Some(value_len) = self.protocol.size.value_len() {
            if self.raw_value().len() != value_len {
                return Err(Error::TruncatedComponent);
            }
        }

        if let Some(transcoder) = &self.protocol.transcoder {
            transcoder
                .validate_bytes(self.raw_value())
                .map_err(|error| Error::InvalidValue {
                    protocol: self.protocol.name.to_string(),
                    error,
                })?;
        }
        Ok(())
    }

    /// Returns the protocol of this component.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Returns the protocol code of this component.
    pub fn code(&self) -> u32 {
        self.protocol.code
    }

    /// Returns the canonical byte image of this component.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the serialized version of this component.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Returns the raw value bytes, without code or length prefix.
    pub fn raw_value(&self) -> &[u8] {
        &self.bytes[self.value_start..]
    }

    /// Returns the value formatted as in the string form, or `None` if the
    /// protocol carries no value.
    pub fn value(&self) -> Option<String> {
        let transcoder = self.protocol.transcoder.as_ref()?;
        // Value bytes were validated at construction; transcoding back
        // cannot fail.
        transcoder.bytes_to_string(self.raw_value()).ok()
    }

    /// Turns this component into a single-component multiaddr.
    pub fn to_multiaddr(self) -> Multiaddr {
        Multiaddr::from(self)
    }
}

impl Registry {
    /// Builds a component from a protocol name and an optional value token
    /// looked up in this registry.
    pub fn new_component(&self, name: &str, value: Option<&str>) -> Result<Component, Error> {
        let protocol = self
            .by_name(name)
            .ok_or_else(|| Error::UnknownProtocolName(String::from(name)))?;

        match (&protocol.transcoder, value) {
            (Some(transcoder), Some(value)) => {
                let bytes =
                    transcoder
                        .string_to_bytes(value)
                        .map_err(|error| Error::InvalidValue {
                            protocol: protocol.name.to_string(),
                            error,
                        })?;
                Component::from_parts(protocol, &bytes)
            }
            (Some(_), None) => Err(Error::MissingValue {
                protocol: protocol.name.to_string(),
            }),
            (None, Some(_)) => Err(Error::UnexpectedValue {
                protocol: protocol.name.to_string(),
            }),
            (None, None) => Component::from_parts(protocol, &[]),
        }
    }
}

impl crate::meg::Matchable for Component {
    fn code(&self) -> u32 {
        self.protocol.code
    }

    fn value(&self) -> String {
        Component::value(self).unwrap_or_default()
    }

    fn raw_value(&self) -> Vec<u8> {
        Component::raw_value(self).to_vec()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.protocol.name)?;
        if let Some(value) = self.value() {
            if value.is_empty() {
                return Ok(());
            }
            // Path values already carry their leading `/`.
            if !(self.protocol.path && value.starts_with('/')) {
                f.write_str("/")?;
            }
            f.write_str(&value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.to_string()).finish()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Component) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Component {}

impl cmp::PartialOrd for Component {
    fn partial_cmp(&self, other: &Component) -> Option<cmp::Ordering> {
        Some(Ord::cmp(self, other))
    }
}

impl cmp::Ord for Component {
    fn cmp(&self, other: &Component) -> cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl hash::Hash for Component {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        state.write(&self.bytes);
    }
}

impl serde::Serialize for Component {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

impl<'de> serde::Deserialize<'de> for Component {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Component, D::Error> {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = Component;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a multiaddr component")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Component, E> {
                let addr = value.parse::<Multiaddr>().map_err(E::custom)?;
                let mut components = addr.into_iter();
                match (components.next(), components.next()) {
                    (Some(component), None) => Ok(component),
                    _ => Err(E::custom(Error::TrailingBytes)),
                }
            }

            fn visit_bytes<E: serde::de::Error>(self, value: &[u8]) -> Result<Component, E> {
                Component::from_bytes(value).map_err(E::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(Visitor)
        } else {
            deserializer.deserialize_bytes(Visitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Component;
    use crate::multiaddr::Error;
    use alloc::string::ToString as _;

    #[test]
    fn new_with_value() {
        let component = Component::new("ip4", Some("127.0.0.1")).unwrap();
        assert_eq!(component.as_bytes(), &[0x04, 0x7f, 0x00, 0x00, 0x01]);
        assert_eq!(component.raw_value(), &[0x7f, 0x00, 0x00, 0x01]);
        assert_eq!(component.value().unwrap(), "127.0.0.1");
        assert_eq!(component.to_string(), "/ip4/127.0.0.1");
    }

    #[test]
    fn new_without_value() {
        let component = Component::new("quic-v1", None).unwrap();
        assert_eq!(component.as_bytes(), &[0xcd, 0x03]);
        assert_eq!(component.value(), None);
        assert_eq!(component.to_string(), "/quic-v1");
    }

    #[test]
    fn new_variable_size() {
        let component = Component::new("dns", Some("example.com")).unwrap();
        // Code, varint length, then the raw name.
        assert_eq!(component.as_bytes()[0], 53);
        assert_eq!(component.as_bytes()[1], 11);
        assert_eq!(component.raw_value(), b"example.com");
    }

    #[test]
    fn new_rejects_misuse() {
        assert!(matches!(
            Component::new("dsijafd", Some("x")),
            Err(Error::UnknownProtocolName(_))
        ));
        assert!(matches!(
            Component::new("tcp", None),
            Err(Error::MissingValue { .. })
        ));
        assert!(matches!(
            Component::new("quic", Some("1234")),
            Err(Error::UnexpectedValue { .. })
        ));
        assert!(matches!(
            Component::new("tcp", Some("65536")),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn from_bytes_roundtrip() {
        let component = Component::new("udp", Some("1234")).unwrap();
        let decoded = Component::from_bytes(component.as_bytes()).unwrap();
        assert_eq!(component, decoded);
    }

    #[test]
    fn from_bytes_rejects_trailing() {
        let mut bytes = Component::new("udp", Some("1234")).unwrap().to_vec();
        bytes.push(0x0);
        assert_eq!(Component::from_bytes(&bytes), Err(Error::TrailingBytes));
    }

    #[test]
    fn from_bytes_rejects_truncated() {
        let bytes = Component::new("ip4", Some("127.0.0.1")).unwrap().to_vec();
        assert_eq!(
            Component::from_bytes(&bytes[..3]),
            Err(Error::TruncatedComponent)
        );
    }

    #[test]
    fn ordering_is_byte_image_ordering() {
        let a = Component::new("ip4", Some("1.2.3.4")).unwrap();
        let b = Component::new("ip4", Some("1.2.3.5")).unwrap();
        let c = Component::new("tcp", Some("80")).unwrap();
        assert!(a < b);
        assert!(a < c);
        assert_eq!(a.cmp(&a), core::cmp::Ordering::Equal);
    }
}
