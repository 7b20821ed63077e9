use std::fmt::{Debug, Formatter};

use crate::dict::hash::{gen_case_hash_function, gen_hash_function};

pub type HashFunction<K> = Box<dyn Fn(&K) -> u64 + Send + Sync>;
pub type DupFunction<T, P> = Box<dyn Fn(&P, &T) -> T + Send + Sync>;
pub type CompareFunction<K, P> = Box<dyn Fn(&P, &K, &K) -> bool + Send + Sync>;
pub type DestructorFunction<T, P> = Box<dyn Fn(&P, T) + Send + Sync>;

/// Pluggable behavior of a dict. Every hook is optional: a missing hash
/// function falls back to [`sys_hash`](crate::dict::hash::sys_hash), a
/// missing compare to `==`, missing dups keep the caller's value and missing
/// destructors simply drop. `P` is the private data handed to every hook.
pub struct DictType<K, V, P = ()> {
    pub hash_function: Option<HashFunction<K>>,
    pub key_dup: Option<DupFunction<K, P>>,
    pub val_dup: Option<DupFunction<V, P>>,
    pub key_compare: Option<CompareFunction<K, P>>,
    pub key_destructor: Option<DestructorFunction<K, P>>,
    pub val_destructor: Option<DestructorFunction<V, P>>,
}

impl<K, V, P> Default for DictType<K, V, P> {
    fn default() -> Self {
        Self {
            hash_function: None,
            key_dup: None,
            val_dup: None,
            key_compare: None,
            key_destructor: None,
            val_destructor: None,
        }
    }
}

impl<K, V, P> Debug for DictType<K, V, P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictType")
            .field("hash_function", &self.hash_function.is_some())
            .field("key_dup", &self.key_dup.is_some())
            .field("val_dup", &self.val_dup.is_some())
            .field("key_compare", &self.key_compare.is_some())
            .field("key_destructor", &self.key_destructor.is_some())
            .field("val_destructor", &self.val_destructor.is_some())
            .finish()
    }
}

impl<V: 'static, P: 'static> DictType<String, V, P> {
    /// String keys hashed over their bytes; the dict stores its own copy of
    /// every key it is handed.
    pub fn heap_string_copy_key() -> Self {
        Self {
            hash_function: Some(Box::new(|key: &String| gen_hash_function(key.as_bytes()))),
            key_dup: Some(Box::new(|_: &P, key: &String| key.clone())),
            ..Self::default()
        }
    }

    /// Keys compared and hashed ignoring ASCII case.
    pub fn case_insensitive_strings() -> Self {
        Self {
            hash_function: Some(Box::new(|key: &String| gen_case_hash_function(key.as_bytes()))),
            key_compare: Some(Box::new(|_: &P, a: &String, b: &String| a.eq_ignore_ascii_case(b))),
            ..Self::default()
        }
    }
}

impl<P: 'static> DictType<String, String, P> {
    pub fn heap_strings() -> Self {
        Self {
            val_dup: Some(Box::new(|_: &P, val: &String| val.clone())),
            ..Self::heap_string_copy_key()
        }
    }
}
