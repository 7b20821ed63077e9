use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use cityhasher::CityHasher;

pub const HASH_SEED: u64 = 0x87c37b91114253d5;

static HASH_FUNCTION_SEED: AtomicU64 = AtomicU64::new(HASH_SEED);

pub fn set_hash_function_seed(seed: u64) {
    HASH_FUNCTION_SEED.store(seed, Ordering::Relaxed)
}

pub fn get_hash_function_seed() -> u64 {
    HASH_FUNCTION_SEED.load(Ordering::Relaxed)
}

#[inline]
pub fn sys_hash(hash: impl Hash) -> u64 {
    let mut hasher = CityHasher::with_seed(get_hash_function_seed());
    hash.hash(&mut hasher);
    hasher.finish()
}

/// Hash of a raw byte string.
#[inline]
pub fn gen_hash_function(buf: &[u8]) -> u64 {
    let mut hasher = CityHasher::with_seed(get_hash_function_seed());
    hasher.write(buf);
    hasher.finish()
}

/// ASCII case-insensitive variant of [`gen_hash_function`].
pub fn gen_case_hash_function(buf: &[u8]) -> u64 {
    gen_hash_function(&buf.to_ascii_lowercase())
}
