use std::mem::size_of;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use rand::Rng;

use crate::dict::dict::DictEntry;

pub(crate) const DICT_HT_INITIAL_EXP: i32 = 2;
pub const DICT_HT_INITIAL_SIZE: usize = 1 << DICT_HT_INITIAL_EXP;
pub const DICT_FORCE_RESIZE_RATIO: usize = 4;
pub const DICT_REHASH_EMPTY_VISITS: usize = 10;
pub const DICT_REHASH_BATCH: usize = 100;
pub(crate) const DICT_STATS_VECTLEN: usize = 50;
pub const GETFAIR_NUM_ENTRIES: usize = 15;
pub const HASHTABLE_MIN_FILL: usize = 10;
pub(crate) const LONG_MAX: usize = 0x7FFF_FFFF_FFFF_FFFF;

/// Once this many consecutive empty buckets were seen while sampling, jump
/// to a new random index.
pub(crate) const SAMPLE_EMPTY_JUMP: usize = 5;

/// Bucket draws per sampled entry before a fair draw gives up and picks from
/// the sample itself.
pub(crate) const FAIR_DRAWS_PER_SAMPLE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictResizeFlag {
    DictResizeEnable,
    /// Growth at a 1:1 load factor is suppressed, the force ratio still applies.
    DictResizeAvoid,
}

impl DictResizeFlag {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => DictResizeFlag::DictResizeEnable,
            _ => DictResizeFlag::DictResizeAvoid,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            DictResizeFlag::DictResizeEnable => 0,
            DictResizeFlag::DictResizeAvoid => 1,
        }
    }
}

/// Resize policy handle. Every dict owns one; cloning it and handing the
/// clone to other dicts makes them follow the same policy, e.g. to stop
/// growth for all keyspaces while a snapshot child is alive.
#[derive(Debug, Clone)]
pub struct ResizeGate {
    flag: Arc<AtomicU8>,
}

impl Default for ResizeGate {
    fn default() -> Self {
        Self::new(DictResizeFlag::DictResizeEnable)
    }
}

impl ResizeGate {
    pub fn new(flag: DictResizeFlag) -> Self {
        Self {
            flag: Arc::new(AtomicU8::new(flag.as_u8())),
        }
    }

    #[inline]
    pub fn get(&self) -> DictResizeFlag {
        DictResizeFlag::from_u8(self.flag.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, flag: DictResizeFlag) {
        self.flag.store(flag.as_u8(), Ordering::Relaxed)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.get() == DictResizeFlag::DictResizeEnable
    }

    pub fn enable(&self) {
        self.set(DictResizeFlag::DictResizeEnable)
    }

    pub fn disable(&self) {
        self.set(DictResizeFlag::DictResizeAvoid)
    }
}

#[inline]
pub fn dict_size(exp: i32) -> usize {
    if exp == -1 {
        0
    } else {
        1 << exp
    }
}

#[inline]
pub fn dict_size_mask(exp: i32) -> u64 {
    if exp == -1 {
        0
    } else {
        (dict_size(exp) - 1) as u64
    }
}

pub fn entry_mem_usage<K, V>() -> usize {
    size_of::<DictEntry<K, V>>()
}

/// Exponent of the smallest power of two >= `size`, never below the
/// initial table exponent.
pub fn next_exp(size: usize) -> i32 {
    if size <= DICT_HT_INITIAL_SIZE {
        return DICT_HT_INITIAL_EXP;
    }
    let long_bits = size_of::<usize>() * 8;
    if size >= LONG_MAX {
        return (long_bits - 1) as i32;
    }
    let leading_zeros = (size - 1).leading_zeros() as usize;
    (long_bits - leading_zeros) as i32
}

pub fn random_ulong() -> u64 {
    rand::rng().random::<u64>()
}
