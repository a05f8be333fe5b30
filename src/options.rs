//! Typed configuration options and per-method option schemas.
//!
//! An [`Options`] bag maps string keys to typed values. Each compression
//! method publishes a [`MethodSchema`] describing the keys it understands:
//! type, default, permitted range, and what to do with keys it does not
//! recognize. The `deflate` method rejects unknown keys; `gzip` ignores them
//! so that `deflate.*` and `limits.*` keys pass through to the codec it
//! wraps.
//!
//! Keys under the `limits.*` prefix belong to the core (see [`crate::limits`])
//! and are accepted by every method's validation, independent of its schema.

use std::collections::HashMap;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Values
// ─────────────────────────────────────────────────────────────────────────────

/// The type of an option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Int64,
    UInt64,
    Bool,
    Str,
    Bytes,
}

impl OptionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            OptionType::Int64 => "int64",
            OptionType::UInt64 => "uint64",
            OptionType::Bool => "bool",
            OptionType::Str => "string",
            OptionType::Bytes => "bytes",
        }
    }
}

/// A typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int64(i64),
    UInt64(u64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
}

impl OptionValue {
    pub fn option_type(&self) -> OptionType {
        match self {
            OptionValue::Int64(_) => OptionType::Int64,
            OptionValue::UInt64(_) => OptionType::UInt64,
            OptionValue::Bool(_) => OptionType::Bool,
            OptionValue::Str(_) => OptionType::Str,
            OptionValue::Bytes(_) => OptionType::Bytes,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Options bag
// ─────────────────────────────────────────────────────────────────────────────

/// A string-keyed bag of typed option values.
///
/// Setting a key that already exists replaces its value. The typed getters
/// return `None` when the key is absent *or* holds a value of a different
/// type; type mismatches against a schema are reported by
/// [`MethodSchema::validate`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    entries: HashMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }

    pub fn set_int64(&mut self, key: &str, value: i64) {
        self.entries.insert(key.to_owned(), OptionValue::Int64(value));
    }

    pub fn set_uint64(&mut self, key: &str, value: u64) {
        self.entries.insert(key.to_owned(), OptionValue::UInt64(value));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.entries.insert(key.to_owned(), OptionValue::Bool(value));
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_owned(), OptionValue::Str(value.to_owned()));
    }

    pub fn set_bytes(&mut self, key: &str, value: &[u8]) {
        self.entries
            .insert(key.to_owned(), OptionValue::Bytes(value.to_vec()));
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn get_int64(&self, key: &str) -> Option<i64> {
        match self.entries.get(key) {
            Some(OptionValue::Int64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_uint64(&self, key: &str) -> Option<u64> {
        match self.entries.get(key) {
            Some(OptionValue::UInt64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key) {
            Some(OptionValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(OptionValue::Str(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn get_bytes(&self, key: &str) -> Option<&[u8]> {
        match self.entries.get(key) {
            Some(OptionValue::Bytes(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Schemas
// ─────────────────────────────────────────────────────────────────────────────

/// What a schema does with option keys it does not list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
    /// Unknown keys are a caller error (`InvalidArg`).
    Reject,
    /// Unknown keys are permitted and left for a wrapped method to consume.
    Ignore,
}

/// Schema-declared default for an option. String and bytes options have no
/// schema default; absent simply means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    None,
    Int64(i64),
    UInt64(u64),
    Bool(bool),
}

/// Permitted value range for an option. The variant matching the option's
/// declared type is the only one that applies; both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    None,
    Int { min: i64, max: i64 },
    UInt { min: u64, max: u64 },
}

/// One schema entry: a permitted key with its type, default, and range.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: &'static str,
    pub ty: OptionType,
    pub default: DefaultValue,
    pub range: Range,
    pub help: &'static str,
}

/// A method's full option schema.
#[derive(Debug, Clone, Copy)]
pub struct MethodSchema {
    pub options: &'static [OptionSpec],
    pub unknown_keys: UnknownKeyPolicy,
}

impl MethodSchema {
    /// Look up the spec for `key`, if the schema lists it.
    pub fn find(&self, key: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|spec| spec.key == key)
    }

    /// Validate an options bag against this schema.
    ///
    /// Checks every entry for key recognition (subject to the unknown-key
    /// policy), type agreement, and range. `limits.*` keys are core options:
    /// they are accepted for any method but must be `uint64`.
    pub fn validate(&self, options: &Options) -> Result<()> {
        for (key, value) in options.iter() {
            if key.starts_with("limits.") {
                if value.option_type() != OptionType::UInt64 {
                    return Err(Error::invalid_arg(format!(
                        "option \"{key}\" must be uint64"
                    )));
                }
                continue;
            }

            let spec = match self.find(key) {
                Some(spec) => spec,
                None => match self.unknown_keys {
                    UnknownKeyPolicy::Ignore => continue,
                    UnknownKeyPolicy::Reject => {
                        return Err(Error::invalid_arg(format!(
                            "unknown option key \"{key}\""
                        )));
                    }
                },
            };

            if value.option_type() != spec.ty {
                return Err(Error::invalid_arg(format!(
                    "option \"{key}\" must be {}",
                    spec.ty.as_str()
                )));
            }

            match (spec.range, value) {
                (Range::Int { min, max }, OptionValue::Int64(v)) => {
                    if *v < min || *v > max {
                        return Err(Error::invalid_arg(format!(
                            "option \"{key}\" out of range ({min}..={max})"
                        )));
                    }
                }
                (Range::UInt { min, max }, OptionValue::UInt64(v)) => {
                    if *v < min || *v > max {
                        return Err(Error::invalid_arg(format!(
                            "option \"{key}\" out of range ({min}..={max})"
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
