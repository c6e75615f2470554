//! Bincodec is binary encoding for rust values. For details, see:
//! https://github.com/bincode-org/bincode
//!
//! The bincode::(de)serialize functions use fixed-length integer encoding
//! by default. The wrappers here switch to big-endian variable-length
//! encoding, which keeps persisted metadata such as the disk space map
//! compact.
use bincode::{DefaultOptions, Options};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let res = DefaultOptions::new().with_big_endian().with_varint_encoding().serialize(value)?;
    Ok(res)
}

pub fn deserialize<'a, T: Deserialize<'a>>(input: &'a [u8]) -> Result<T> {
    let res = DefaultOptions::new().with_big_endian().with_varint_encoding().deserialize(input)?;
    Ok(res)
}
