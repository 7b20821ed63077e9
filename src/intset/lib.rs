use crate::intset::{
    INT16_MAX, INT16_MIN, INT32_MAX, INT32_MIN, INTSET_ENC_INT16, INTSET_ENC_INT32,
    INTSET_ENC_INT64,
};

/// Smallest encoding able to hold `value`.
pub fn intset_value_encoding(value: i64) -> u8 {
    if !(INT32_MIN..=INT32_MAX).contains(&value) {
        INTSET_ENC_INT64
    } else if !(INT16_MIN..=INT16_MAX).contains(&value) {
        INTSET_ENC_INT32
    } else {
        INTSET_ENC_INT16
    }
}

pub fn is_valid_encoding(encoding: u32) -> bool {
    encoding == INTSET_ENC_INT16 as u32
        || encoding == INTSET_ENC_INT32 as u32
        || encoding == INTSET_ENC_INT64 as u32
}
