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

//! Self-describing, composable network addresses.
//!
//! A multiaddr names a network endpoint as an ordered sequence of typed
//! components, each pairing a protocol with an optional value: an IPv4
//! address, a UDP port, a peer identity, a DNS name. Because every
//! component declares what it is, addresses compose and nest without
//! ambiguity:
//!
//! ```
//! use multiaddr::Multiaddr;
//!
//! let addr = "/ip4/127.0.0.1/udp/1234/quic-v1".parse::<Multiaddr>().unwrap();
//! assert_eq!(addr.to_vec()[..2], [0x4, 0x7f]);
//! assert_eq!(addr.to_string(), "/ip4/127.0.0.1/udp/1234/quic-v1");
//! ```
//!
//! See <https://github.com/multiformats/multiaddr> for the format's
//! specification.
//!
//! # Representations
//!
//! Every address has two exactly-equivalent representations:
//!
//! - A compact binary form, suitable for wire transport and persistence:
//!   the concatenation of each component's varint protocol code, optional
//!   varint value length, and value bytes.
//! - A human-readable string form: `/name` or `/name/value` for each
//!   component.
//!
//! Both forms round-trip losslessly. Parsing validates every component's
//! value and either produces a complete address or fails with an
//! [`Error`]; there are no partial results.
//!
//! # Layers
//!
//! - [`varint`]: the bounded LEB128 integers used throughout the binary
//!   form.
//! - [`protocol`]: the [`Registry`] mapping protocol names and codes to
//!   their records, frozen at process start.
//! - [`transcoder`]: the per-protocol value codecs.
//! - [`component`]: a single `(protocol, value)` atom and its canonical
//!   byte image.
//! - [`multiaddr`]: parsing, serialisation, and the structural operators
//!   (encapsulation, splitting, joining).
//! - [`meg`]: regular expressions over component sequences, for
//!   classifying and destructuring addresses.
//! - [`multihash`]: validation of the multihash values carried by the
//!   `p2p` and `certhash` protocols.
//!
//! The crate performs no I/O and no name resolution; its contract is
//! purely syntactic and structural. All values are immutable after
//! construction.

#![no_std]
#![deny(rustdoc::broken_intra_doc_links)]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod component;
pub mod meg;
pub mod multiaddr;
pub mod multihash;
pub mod protocol;
pub mod transcoder;
pub mod varint;

mod multibase;

pub use component::Component;
pub use multiaddr::{Error, Multiaddr};
pub use protocol::{Protocol, Registry, Size};
pub use transcoder::Transcoder;
