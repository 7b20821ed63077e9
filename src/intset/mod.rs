pub mod error;
pub mod intset;
mod lib;

pub use error::IntSetError;
pub use intset::IntSet;

pub const INTSET_ENC_INT16: u8 = 2;
pub const INTSET_ENC_INT32: u8 = 4;
pub const INTSET_ENC_INT64: u8 = 8;
const INT16_MIN: i64 = i16::MIN as i64;
const INT16_MAX: i64 = i16::MAX as i64;
const INT32_MIN: i64 = i32::MIN as i64;
const INT32_MAX: i64 = i32::MAX as i64;
/// encoding (u32) + length (u32)
pub const INTSET_HEADER_SIZE: usize = 8;
