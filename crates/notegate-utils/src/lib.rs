//! Internal utilities for the NoteGate plugin framework.
//!
//! Shared between `notegate-core` (runtime parameter lookup) and
//! `notegate-macros` (compile-time ID generation), so everything here is
//! `const fn` and dependency-free.
//!
//! Plugin authors should go through the `notegate` facade crate instead.

pub mod hash;

pub use hash::fnv1a_32;
