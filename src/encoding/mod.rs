//! Page payload codecs
//!
//! Every codec is a pure, symmetric encode/decode pair over a typed vector.
//! Decoders take the exact payload slice plus the value count declared by
//! the page header; they fail with typed errors rather than reading out of
//! bounds, and reject payloads with unconsumed trailing bytes.

pub mod delta;
pub mod dictionary;
pub mod plain;
pub mod rle;
pub mod varint;
