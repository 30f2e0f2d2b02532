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

//! Regular expressions over multiaddr components.
//!
//! A [`Matcher`] is a Thompson NFA whose alphabet is protocol codes rather
//! than characters: each input symbol is one component of an address.
//! Patterns are built from combinators ([`val`], [`optional`],
//! [`zero_or_more`], [`one_or_more`], [`or`], [`cat`]) and assembled with
//! [`pattern_to_matcher`]. The [`ANY`] code matches every component.
//!
//! Terminals can *capture* the component they matched into a [`Capture`] or
//! [`CaptureMany`] slot. Captures are only applied once a complete match is
//! found, in left-to-right order of the matched components; a failed
//! simulation writes nothing.
//!
//! The developer is assumed to be familiar with the Thompson NFA approach
//! to regex before making changes to this module. Refer to
//! <https://swtch.com/~rsc/regexp/regexp1.html> for an introduction.

use alloc::{boxed::Box, rc::Rc, string::String, vec::Vec};
use core::{cell::RefCell, fmt, mem};

/// Protocol code to match against, or the wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code(Option<u32>);

/// Wildcard code: matches any component regardless of protocol.
pub const ANY: Code = Code(None);

impl From<u32> for Code {
    fn from(code: u32) -> Code {
        Code(Some(code))
    }
}

impl Code {
    fn matches(&self, code: u32) -> bool {
        match self.0 {
            None => true,
            Some(expected) => expected == code,
        }
    }
}

/// Anything the engine can match against: a protocol code plus the two
/// shapes of value a capture can copy out.
pub trait Matchable {
    /// Protocol code of the component.
    fn code(&self) -> u32;
    /// Value as printed in the string form; empty when the protocol carries
    /// no value.
    fn value(&self) -> String;
    /// Raw value bytes.
    fn raw_value(&self) -> Vec<u8>;
}

/// Error potentially returned when applying captures after a successful
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CaptureError {
    /// A capture-exactly-one slot matched more than one component.
    #[display(fmt = "capture slot already holds a value")]
    AlreadyCaptured,
}

type CaptureFn = Rc<dyn Fn(&dyn Matchable) -> Result<(), CaptureError>>;

/// Slot filled by [`capture_string`] or [`capture_bytes`] with the value of
/// exactly one component.
///
/// Slots are shared handles: clone one into a pattern, keep the original,
/// and read it out after a successful match.
pub struct Capture<T> {
    inner: Rc<RefCell<Option<T>>>,
}

impl<T> Capture<T> {
    /// Builds an empty slot.
    pub fn new() -> Capture<T> {
        Capture {
            inner: Rc::new(RefCell::new(None)),
        }
    }

    /// Removes and returns the captured value, if any.
    pub fn take(&self) -> Option<T> {
        self.inner.borrow_mut().take()
    }
}

impl<T> Default for Capture<T> {
    fn default() -> Capture<T> {
        Capture::new()
    }
}

impl<T> Clone for Capture<T> {
    fn clone(&self) -> Capture<T> {
        Capture {
            inner: self.inner.clone(),
        }
    }
}

/// Slot filled by the repeated capture combinators with the values of every
/// component their sub-pattern matched.
pub struct CaptureMany<T> {
    inner: Rc<RefCell<Vec<T>>>,
}

impl<T> CaptureMany<T> {
    /// Builds an empty slot.
    pub fn new() -> CaptureMany<T> {
        CaptureMany {
            inner: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Removes and returns the captured values, in match order.
    pub fn take(&self) -> Vec<T> {
        mem::take(&mut *self.inner.borrow_mut())
    }
}

impl<T> Default for CaptureMany<T> {
    fn default() -> CaptureMany<T> {
        CaptureMany::new()
    }
}

impl<T> Clone for CaptureMany<T> {
    fn clone(&self) -> CaptureMany<T> {
        CaptureMany {
            inner: self.inner.clone(),
        }
    }
}

#[derive(Clone, Copy)]
enum StateKind {
    /// Matching state. Consumes one component if the code matches, then
    /// moves to `next`.
    Match(Code),
    /// Epsilon split between `next` and the contained index.
    Split(usize),
    /// Accepting state.
    Done,
}

/// One state of the NFA. The whole automaton lives in a flat array and
/// states address each other by index, which keeps it trivially copyable
/// and free of ownership cycles (the zero-or-more combinator introduces a
/// back-edge).
pub struct MatchState {
    capture: Option<CaptureFn>,
    next: usize,
    kind: StateKind,
}

impl fmt::Debug for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StateKind::Done => f.write_str("done"),
            StateKind::Split(right) => {
                write!(f, "split{{left: {}, right: {}}}", self.next, right)
            }
            StateKind::Match(code) => write!(f, "match{{code: {:?}, next: {}}}", code, self.next),
        }
    }
}

/// A pattern is a curried state-table builder: given the table under
/// construction and the index of the state to continue with, it appends its
/// own states and returns the index of its entry point.
pub type Pattern = Box<dyn Fn(&mut Vec<MatchState>, usize) -> usize>;

/// A compiled pattern: a flat state table and the index of the start state.
pub struct Matcher {
    states: Vec<MatchState>,
    start: usize,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("states", &self.states)
            .field("start", &self.start)
            .finish()
    }
}

/// Assembles a sequence of patterns into a [`Matcher`].
pub fn pattern_to_matcher(patterns: impl IntoIterator<Item = Pattern>) -> Matcher {
    let patterns = patterns.into_iter().collect::<Vec<_>>();
    let mut states = Vec::with_capacity(patterns.len() * 3 + 1);
    states.push(MatchState {
        capture: None,
        next: 0,
        kind: StateKind::Done,
    });
    let mut next_idx = states.len() - 1;
    // Build the chain by composing patterns from right to left.
    for pattern in patterns.iter().rev() {
        next_idx = pattern(&mut states, next_idx);
    }
    Matcher {
        states,
        start: next_idx,
    }
}

fn match_state(code: Code, capture: Option<CaptureFn>) -> Pattern {
    Box::new(move |states, next| {
        states.push(MatchState {
            capture: capture.clone(),
            next,
            kind: StateKind::Match(code),
        });
        states.len() - 1
    })
}

fn loop_state(code: Code, capture: Option<CaptureFn>) -> Pattern {
    Box::new(move |states, next| {
        states.push(MatchState {
            capture: capture.clone(),
            next: 0,
            kind: StateKind::Match(code),
        });
        let match_idx = states.len() - 1;

        // Split between looping on the match state and continuing. The loop
        // branch comes first so that greedy repetition is explored first.
        states.push(MatchState {
            capture: None,
            next: match_idx,
            kind: StateKind::Split(next),
        });
        let split_idx = states.len() - 1;

        // Close the loop.
        states[match_idx].next = split_idx;
        split_idx
    })
}

/// Consumes one component with the given code.
pub fn val(code: impl Into<Code>) -> Pattern {
    match_state(code.into(), None)
}

/// Makes a pattern optional.
pub fn optional(pattern: Pattern) -> Pattern {
    Box::new(move |states, next| {
        let body = pattern(states, next);
        states.push(MatchState {
            capture: None,
            next: body,
            kind: StateKind::Split(next),
        });
        states.len() - 1
    })
}

/// Concatenates two patterns.
pub fn cat(left: Pattern, right: Pattern) -> Pattern {
    Box::new(move |states, next| {
        let mid = right(states, next);
        left(states, mid)
    })
}

/// Matches any one of the given patterns. Earlier alternatives are
/// preferred when several lead to an accepting path.
pub fn or(patterns: Vec<Pattern>) -> Pattern {
    Box::new(move |states, next| {
        let Some((last, rest)) = patterns.split_last() else {
            return next;
        };
        let mut accum = last(states, next);
        for pattern in rest.iter().rev() {
            let left = pattern(states, next);
            states.push(MatchState {
                capture: None,
                next: left,
                kind: StateKind::Split(accum),
            });
            accum = states.len() - 1;
        }
        accum
    })
}

/// Consumes zero or more components with the given code.
pub fn zero_or_more(code: impl Into<Code>) -> Pattern {
    loop_state(code.into(), None)
}

/// Consumes one or more components with the given code.
pub fn one_or_more(code: impl Into<Code>) -> Pattern {
    let code = code.into();
    Box::new(move |states, next| {
        let loop_idx = loop_state(code, None)(states, next);
        match_state(code, None)(states, loop_idx)
    })
}

fn capture_one_fn<T: 'static>(
    slot: &Capture<T>,
    extract: impl Fn(&dyn Matchable) -> T + 'static,
) -> CaptureFn {
    let slot = slot.clone();
    Rc::new(move |matched| {
        let mut cell = slot.inner.borrow_mut();
        if cell.is_some() {
            *cell = None;
            return Err(CaptureError::AlreadyCaptured);
        }
        *cell = Some(extract(matched));
        Ok(())
    })
}

fn capture_many_fn<T: 'static>(
    slot: &CaptureMany<T>,
    extract: impl Fn(&dyn Matchable) -> T + 'static,
) -> CaptureFn {
    let slot = slot.clone();
    Rc::new(move |matched| {
        slot.inner.borrow_mut().push(extract(matched));
        Ok(())
    })
}

/// Consumes one component with the given code and stores its string value
/// in `slot`. The slot must fire exactly once per match.
pub fn capture_string(code: impl Into<Code>, slot: &Capture<String>) -> Pattern {
    match_state(
        code.into(),
        Some(capture_one_fn(slot, |m: &dyn Matchable| m.value())),
    )
}

/// Consumes one component with the given code and stores its raw value
/// bytes in `slot`. The slot must fire exactly once per match.
pub fn capture_bytes(code: impl Into<Code>, slot: &Capture<Vec<u8>>) -> Pattern {
    match_state(
        code.into(),
        Some(capture_one_fn(slot, |m: &dyn Matchable| m.raw_value())),
    )
}

/// Consumes zero or more components with the given code, storing every
/// string value in `slot`.
pub fn capture_zero_or_more_strings(
    code: impl Into<Code>,
    slot: &CaptureMany<String>,
) -> Pattern {
    loop_state(
        code.into(),
        Some(capture_many_fn(slot, |m: &dyn Matchable| m.value())),
    )
}

/// Consumes zero or more components with the given code, storing every raw
/// value in `slot`.
pub fn capture_zero_or_more_bytes(
    code: impl Into<Code>,
    slot: &CaptureMany<Vec<u8>>,
) -> Pattern {
    loop_state(
        code.into(),
        Some(capture_many_fn(slot, |m: &dyn Matchable| m.raw_value())),
    )
}

/// Consumes one or more components with the given code, storing every
/// string value in `slot`.
pub fn capture_one_or_more_strings(
    code: impl Into<Code>,
    slot: &CaptureMany<String>,
) -> Pattern {
    let code = code.into();
    let capture = capture_many_fn(slot, |m: &dyn Matchable| m.value());
    Box::new(move |states, next| {
        let loop_idx = loop_state(code, Some(capture.clone()))(states, next);
        match_state(code, Some(capture.clone()))(states, loop_idx)
    })
}

/// Consumes one or more components with the given code, storing every raw
/// value in `slot`.
pub fn capture_one_or_more_bytes(
    code: impl Into<Code>,
    slot: &CaptureMany<Vec<u8>>,
) -> Pattern {
    let code = code.into();
    let capture = capture_many_fn(slot, |m: &dyn Matchable| m.raw_value());
    Box::new(move |states, next| {
        let loop_idx = loop_state(code, Some(capture.clone()))(states, next);
        match_state(code, Some(capture.clone()))(states, loop_idx)
    })
}

/// Singly-linked capture chain shared between simulation threads. Built
/// right-to-left during simulation, reversed when a match is found.
struct CaptureNode {
    capture: CaptureFn,
    /// Index of the matched component in the input.
    position: usize,
    prev: Option<Rc<CaptureNode>>,
}

/// Simulates the matcher against a sequence of components.
///
/// On a complete match, the winning thread's captures are applied in
/// left-to-right order and `Ok(true)` is returned; a capture that fails
/// aborts the application and its error is returned instead. Threads are
/// explored in pattern-construction order, so paths through explicit codes
/// are preferred over paths through [`ANY`].
pub fn match_components<T: Matchable>(
    matcher: &Matcher,
    components: &[T],
) -> Result<bool, CaptureError> {
    let states = &matcher.states;

    // Fast case for a small number of states (<=128): the visited set lives
    // on the stack.
    let mut stack_bitset = [0u64; 2];
    let mut heap_bitset;
    let visited: &mut [u64] = if states.len() <= 128 {
        &mut stack_bitset
    } else {
        heap_bitset = alloc::vec![0u64; (states.len() + 63) / 64];
        &mut heap_bitset
    };

    let mut current: Vec<(usize, Option<Rc<CaptureNode>>)> = Vec::with_capacity(16);
    let mut next_frontier: Vec<(usize, Option<Rc<CaptureNode>>)> = Vec::with_capacity(16);

    append_state(&mut current, states, matcher.start, None, visited);

    for (position, component) in components.iter().enumerate() {
        visited.fill(0);
        if current.is_empty() {
            return Ok(false);
        }

        for (state_idx, captures) in &current {
            let state = &states[*state_idx];
            let StateKind::Match(code) = state.kind else {
                continue;
            };
            if !code.matches(component.code()) {
                continue;
            }

            let captures = match &state.capture {
                Some(capture) => Some(Rc::new(CaptureNode {
                    capture: capture.clone(),
                    position,
                    prev: captures.clone(),
                })),
                None => captures.clone(),
            };
            append_state(&mut next_frontier, states, state.next, captures, visited);
        }

        mem::swap(&mut current, &mut next_frontier);
        next_frontier.clear();
    }

    for (state_idx, captures) in &current {
        if !matches!(states[*state_idx].kind, StateKind::Done) {
            continue;
        }

        // Complete path found. The chain was built right-to-left; flip it
        // so captures run in the order users expect.
        let mut chain = Vec::with_capacity(16);
        let mut node = captures.clone();
        while let Some(current_node) = node {
            chain.push((current_node.capture.clone(), current_node.position));
            node = current_node.prev.clone();
        }
        for (capture, position) in chain.into_iter().rev() {
            capture(&components[position])?;
        }
        return Ok(true);
    }

    Ok(false)
}

/// Appends a state to the frontier, expanding splits into both branches.
///
/// Non-recursive; the bitset guards against the back-edges that repetition
/// introduces.
fn append_state(
    frontier: &mut Vec<(usize, Option<Rc<CaptureNode>>)>,
    states: &[MatchState],
    start: usize,
    captures: Option<Rc<CaptureNode>>,
    visited: &mut [u64],
) {
    let mut stack = Vec::with_capacity(16);
    stack.push((start, captures));

    while let Some((index, captures)) = stack.pop() {
        if index >= states.len() {
            continue;
        }
        if visited[index / 64] & (1 << (index % 64)) != 0 {
            continue;
        }
        visited[index / 64] |= 1 << (index % 64);

        match states[index].kind {
            StateKind::Split(right) => {
                // Push the second branch first so the first branch is
                // processed first, preserving preference order.
                stack.push((right, captures.clone()));
                stack.push((states[index].next, captures));
            }
            _ => frontier.push((index, captures)),
        }
    }
}
