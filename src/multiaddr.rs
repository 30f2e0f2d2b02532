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

//! Multiaddr parsing, serialisation, and structural algebra.
//!
//! A [`Multiaddr`] is an ordered sequence of [`Component`]s. It has two
//! exactly-equivalent representations: a binary form, which is the plain
//! concatenation of the components' byte images, and a string form, which
//! concatenates `/name` or `/name/value` for each component. Both round-trip
//! losslessly, and parsing either form rejects invalid input without
//! producing a partial address.
//!
//! Multiaddrs are immutable. The structural operators (encapsulation,
//! splitting, joining) always build new values, which makes them safe to use
//! as map keys and to share between threads.

use alloc::{string::String, vec::Vec};
use core::{cmp, fmt, hash, str::FromStr};

use crate::{
    component::Component,
    meg,
    protocol::{Protocol, Registry, Size},
    transcoder, varint,
};

/// A parsed multiaddr.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Multiaddr {
    components: Vec<Component>,
}

/// Error potentially returned when parsing or inspecting a multiaddr.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Error {
    /// The input string or byte slice is empty.
    #[display(fmt = "empty multiaddr")]
    Empty,
    /// The input string doesn't begin with `/`.
    #[display(fmt = "multiaddr must begin with `/`")]
    BadStart,
    /// A protocol name isn't in the registry.
    #[display(fmt = "unknown protocol name {:?}", _0)]
    UnknownProtocolName(String),
    /// A protocol code isn't in the registry.
    #[display(fmt = "unknown protocol code {}", _0)]
    UnknownProtocolCode(u64),
    /// A value-bearing protocol isn't followed by a value token.
    #[display(fmt = "protocol {} requires a value", protocol)]
    MissingValue {
        /// Name of the protocol whose value is missing.
        protocol: String,
    },
    /// The transcoder rejected a value token or value bytes.
    #[display(fmt = "invalid value for protocol {}: {}", protocol, error)]
    InvalidValue {
        /// Name of the protocol whose value was rejected.
        protocol: String,
        /// Reason the transcoder rejected the value.
        error: transcoder::ValueError,
    },
    /// A value was given to a protocol that doesn't take one.
    #[display(fmt = "protocol {} doesn't take a value", protocol)]
    UnexpectedValue {
        /// Name of the protocol.
        protocol: String,
    },
    /// The byte buffer ends before the declared value length.
    #[display(fmt = "unexpected end of multiaddr")]
    TruncatedComponent,
    /// Bytes remain after the last complete component.
    #[display(fmt = "bytes remain after the last component")]
    TrailingBytes,
    /// A varint couldn't be decoded.
    #[display(fmt = "{}", _0)]
    Varint(varint::DecodeError),
    /// [`Multiaddr::value_for_protocol`] found no component with the
    /// requested code.
    #[display(fmt = "protocol not found in multiaddr")]
    ProtocolNotFound,
}

impl Multiaddr {
    /// Returns the empty multiaddr.
    pub fn empty() -> Multiaddr {
        Multiaddr::default()
    }

    /// Parses and validates the binary form. The input is copied, not
    /// retained.
    ///
    /// Uses the process-wide registry; see [`Registry::multiaddr_from_bytes`]
    /// for the registry-owning equivalent.
    pub fn from_bytes(bytes: &[u8]) -> Result<Multiaddr, Error> {
        Registry::global().multiaddr_from_bytes(bytes)
    }

    /// Returns the binary form: the concatenation of the components' byte
    /// images.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.components.iter().map(|c| c.as_bytes().len()).sum());
        for component in &self.components {
            out.extend_from_slice(component.as_bytes());
        }
        out
    }

    /// Returns `true` if this is the empty multiaddr.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns the components of this multiaddr.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Returns an iterator over the components of this multiaddr.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Component> + '_ {
        self.components.iter()
    }

    /// Returns the protocols of this multiaddr, in order.
    pub fn protocols(&self) -> Vec<Protocol> {
        self.components
            .iter()
            .map(|component| component.protocol().clone())
            .collect()
    }

    /// Returns the string value of the first component with the given
    /// protocol code. Components without a value yield an empty string.
    pub fn value_for_protocol(&self, code: u32) -> Result<String, Error> {
        self.components
            .iter()
            .find(|component| component.code() == code)
            .map(|component| component.value().unwrap_or_default())
            .ok_or(Error::ProtocolNotFound)
    }

    /// Wraps this multiaddr around another:
    /// `/ip4/1.2.3.4` encapsulate `/tcp/80` = `/ip4/1.2.3.4/tcp/80`.
    pub fn encapsulate(&self, other: &Multiaddr) -> Multiaddr {
        let mut components =
            Vec::with_capacity(self.components.len() + other.components.len());
        components.extend_from_slice(&self.components);
        components.extend_from_slice(&other.components);
        Multiaddr { components }
    }

    /// Removes the *last* occurrence of `suffix` as a contiguous component
    /// subsequence, and everything after it.
    ///
    /// Returns the address unchanged if `suffix` doesn't occur in it, and
    /// the empty multiaddr if the occurrence starts at the first component.
    pub fn decapsulate(&self, suffix: &Multiaddr) -> Multiaddr {
        if suffix.components.is_empty() {
            return self.clone();
        }

        let mut last_index = None;
        for start in 0..self.components.len() {
            let candidate = &self.components[start..];
            if candidate.len() < suffix.components.len() {
                break;
            }
            if candidate[..suffix.components.len()] == suffix.components[..] {
                last_index = Some(start);
            }
        }

        match last_index {
            None => self.clone(),
            Some(index) => Multiaddr {
                components: self.components[..index].to_vec(),
            },
        }
    }

    /// Returns every component as a single-component multiaddr.
    pub fn split(&self) -> Vec<Multiaddr> {
        self.components
            .iter()
            .map(|component| Multiaddr::from(component.clone()))
            .collect()
    }

    /// Splits off the first component. The remainder is empty if the
    /// address has at most one component.
    pub fn split_first(&self) -> (Option<Component>, Multiaddr) {
        match self.components.split_first() {
            None => (None, Multiaddr::empty()),
            Some((first, rest)) => (
                Some(first.clone()),
                Multiaddr {
                    components: rest.to_vec(),
                },
            ),
        }
    }

    /// Splits off the last component. The prefix is empty if the address
    /// has at most one component.
    pub fn split_last(&self) -> (Multiaddr, Option<Component>) {
        match self.components.split_last() {
            None => (Multiaddr::empty(), None),
            Some((last, prefix)) => (
                Multiaddr {
                    components: prefix.to_vec(),
                },
                Some(last.clone()),
            ),
        }
    }

    /// Splits the address at the *first* component for which `predicate`
    /// returns `true`. That component begins the second half. If no
    /// component matches, the second half is empty.
    pub fn split_when(
        &self,
        mut predicate: impl FnMut(&Component) -> bool,
    ) -> (Multiaddr, Multiaddr) {
        let split_at = self
            .components
            .iter()
            .position(|component| predicate(component))
            .unwrap_or(self.components.len());
        (
            Multiaddr {
                components: self.components[..split_at].to_vec(),
            },
            Multiaddr {
                components: self.components[split_at..].to_vec(),
            },
        )
    }

    /// Concatenates the given addresses. Joining nothing yields the empty
    /// multiaddr.
    pub fn join(addrs: impl IntoIterator<Item = Multiaddr>) -> Multiaddr {
        addrs.into_iter().flat_map(|addr| addr.components).collect()
    }

    /// Runs a matcher against the components of this multiaddr. See the
    /// [`meg`](crate::meg) module.
    pub fn matches(&self, matcher: &meg::Matcher) -> Result<bool, meg::CaptureError> {
        meg::match_components(matcher, &self.components)
    }

    fn byte_iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.components
            .iter()
            .flat_map(|component| component.as_bytes().iter().copied())
    }
}

impl Registry {
    /// Parses and validates the string form against this registry.
    pub fn multiaddr_from_str(&self, input: &str) -> Result<Multiaddr, Error> {
        // A single trailing `/` is tolerated.
        let input = input.strip_suffix('/').unwrap_or(input);
        if input.is_empty() {
            return Err(Error::Empty);
        }
        let rest = input.strip_prefix('/').ok_or(Error::BadStart)?;

        let mut components = Vec::new();
        let mut parts = rest.split('/');
        while let Some(name) = parts.next() {
            let protocol = self
                .by_name(name)
                .ok_or_else(|| Error::UnknownProtocolName(String::from(name)))?;

            if protocol.size == Size::Empty {
                components.push(Component::from_parts(protocol, &[])?);
                continue;
            }

            let token = if protocol.path {
                // A path protocol absorbs the remainder of the address,
                // `/` included.
                let mut token = String::new();
                for part in parts.by_ref() {
                    token.push('/');
                    token.push_str(part);
                }
                if token.is_empty() {
                    return Err(Error::MissingValue {
                        protocol: String::from(protocol.name.as_ref()),
                    });
                }
                token
            } else {
                String::from(parts.next().ok_or_else(|| Error::MissingValue {
                    protocol: String::from(protocol.name.as_ref()),
                })?)
            };

            let transcoder = protocol.transcoder.as_ref().unwrap();
            let value = transcoder
                .string_to_bytes(&token)
                .map_err(|error| Error::InvalidValue {
                    protocol: String::from(protocol.name.as_ref()),
                    error,
                })?;
            components.push(Component::from_parts(protocol, &value)?);
        }

        Ok(Multiaddr { components })
    }

    /// Parses and validates the binary form against this registry.
    pub fn multiaddr_from_bytes(&self, bytes: &[u8]) -> Result<Multiaddr, Error> {
        if bytes.is_empty() {
            return Err(Error::Empty);
        }

        let mut components = Vec::new();
        let mut remaining = bytes;
        while !remaining.is_empty() {
            let (read, component) = Component::read(self, remaining)?;
            remaining = &remaining[read..];
            components.push(component);
        }

        Ok(Multiaddr { components })
    }
}

impl FromStr for Multiaddr {
    type Err = Error;

    fn from_str(input: &str) -> Result<Multiaddr, Error> {
        Registry::global().multiaddr_from_str(input)
    }
}

impl TryFrom<&[u8]> for Multiaddr {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Multiaddr, Error> {
        Multiaddr::from_bytes(bytes)
    }
}

impl From<Component> for Multiaddr {
    fn from(component: Component) -> Multiaddr {
        Multiaddr {
            components: Vec::from([component]),
        }
    }
}

impl FromIterator<Component> for Multiaddr {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Multiaddr {
        Multiaddr {
            components: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Multiaddr {
    type Item = Component;
    type IntoIter = alloc::vec::IntoIter<Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.into_iter()
    }
}

impl fmt::Display for Multiaddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in &self.components {
            fmt::Display::fmt(component, f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Multiaddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.components.iter()).finish()
    }
}

impl cmp::PartialOrd for Multiaddr {
    fn partial_cmp(&self, other: &Multiaddr) -> Option<cmp::Ordering> {
        Some(Ord::cmp(self, other))
    }
}

impl cmp::Ord for Multiaddr {
    fn cmp(&self, other: &Multiaddr) -> cmp::Ordering {
        // Lexicographic comparison of the byte images, without
        // materialising them.
        self.byte_iter().cmp(other.byte_iter())
    }
}

impl hash::Hash for Multiaddr {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        for component in &self.components {
            state.write(component.as_bytes());
        }
    }
}

impl serde::Serialize for Multiaddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(&self.to_vec())
        }
    }
}

impl<'de> serde::Deserialize<'de> for Multiaddr {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Multiaddr, D::Error> {
        struct Visitor;

        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = Multiaddr;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a multiaddr")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Multiaddr, E> {
                value.parse().map_err(E::custom)
            }

            fn visit_bytes<E: serde::de::Error>(self, value: &[u8]) -> Result<Multiaddr, E> {
                Multiaddr::from_bytes(value).map_err(E::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(Visitor)
        } else {
            deserializer.deserialize_bytes(Visitor)
        }
    }
}
