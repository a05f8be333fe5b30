//! Method descriptors: the unit of registration in a [`crate::Registry`].
//!
//! A [`Method`] is an immutable record naming a codec, its capabilities, its
//! option schema, and the factories that build its streaming state. The
//! factories return boxed [`MethodEncoder`] / [`MethodDecoder`] trait objects;
//! the generic [`crate::Encoder`] and [`crate::Decoder`] handles dispatch
//! `update` / `finish` through them.

use std::ops::BitOr;

use crate::buffer::{InputBuffer, OutputBuffer};
use crate::error::Result;
use crate::options::{MethodSchema, Options};
use crate::registry::Registry;

// ─────────────────────────────────────────────────────────────────────────────
// Capabilities
// ─────────────────────────────────────────────────────────────────────────────

/// Capability bitmask for a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const ENCODE: Capabilities = Capabilities(1 << 0);
    pub const DECODE: Capabilities = Capabilities(1 << 1);

    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    pub const fn can_encode(self) -> bool {
        self.0 & Capabilities::ENCODE.0 != 0
    }

    pub const fn can_decode(self) -> bool {
        self.0 & Capabilities::DECODE.0 != 0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming state traits
// ─────────────────────────────────────────────────────────────────────────────

/// Method-specific encoder state installed by a [`Method`] factory.
///
/// Implementations must honor the partial-I/O contract: `update` may consume
/// any prefix of the input and produce any prefix of the output space, but
/// must make forward progress unless both buffers are at capacity.
pub trait MethodEncoder {
    fn update(&mut self, input: &mut InputBuffer<'_>, output: &mut OutputBuffer<'_>)
        -> Result<()>;

    /// Flush everything and terminate the stream. May be retried with more
    /// output space after returning a `Limit` error.
    fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()>;
}

/// Method-specific decoder state installed by a [`Method`] factory.
pub trait MethodDecoder {
    fn update(&mut self, input: &mut InputBuffer<'_>, output: &mut OutputBuffer<'_>)
        -> Result<()>;

    /// Drain buffered output and verify the stream terminated cleanly.
    /// May be retried with more output space after returning a `Limit` error.
    fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Method descriptor
// ─────────────────────────────────────────────────────────────────────────────

pub type CreateEncoderFn = fn(&Registry, &Options) -> Result<Box<dyn MethodEncoder>>;
pub type CreateDecoderFn = fn(&Registry, &Options) -> Result<Box<dyn MethodDecoder>>;

/// An immutable compression-method descriptor.
///
/// Descriptors are registered by reference and live for the life of the
/// process (`&'static`), so a registry lookup hands out plain references.
/// The registry is passed back into the factories so that wrapper methods
/// can reach the codecs they build on.
pub struct Method {
    /// Unique, case-sensitive method name (e.g. `"deflate"`, `"gzip"`).
    pub name: &'static str,
    pub capabilities: Capabilities,
    pub create_encoder: CreateEncoderFn,
    pub create_decoder: CreateDecoderFn,
    pub schema: &'static MethodSchema,
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
