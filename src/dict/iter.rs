use std::marker::PhantomData;

use crate::dict::dict::{Dict, DictEntry};
use crate::dict::error::HashError;

/// Cursor over every entry of a dict.
///
/// A safe iterator (`get_safe_iterator`) pauses rehash steps until it is
/// released, so the caller may add, find and delete while iterating. Any
/// entry may be deleted, the remaining entries of its bucket are still
/// returned. Entries added during the iteration may or may not be returned.
/// An unsafe iterator only allows `next`; any mutation in between is
/// detected through the fingerprint when it is released.
#[derive(Debug)]
pub struct DictIterator<K, V> {
    table: usize,
    index: i64,
    safe: bool,
    /// addresses of the not yet returned entries of the current chain, last
    /// one first, used as identities only and never dereferenced
    pending: Vec<usize>,
    fingerprint: u64,
    _boo: PhantomData<fn() -> (K, V)>,
}

impl<K, V> DictIterator<K, V> {
    pub fn is_safe(&self) -> bool {
        self.safe
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

fn entry_addr<K, V>(entry: &DictEntry<K, V>) -> usize {
    entry as *const DictEntry<K, V> as usize
}

/// Thomas Wang's 64 bit integer mix.
fn mix64(mut hash: u64) -> u64 {
    hash = (!hash).wrapping_add(hash << 21);
    hash ^= hash >> 24;
    hash = hash.wrapping_add(hash << 3).wrapping_add(hash << 8);
    hash ^= hash >> 14;
    hash = hash.wrapping_add(hash << 2).wrapping_add(hash << 4);
    hash ^= hash >> 28;
    hash = hash.wrapping_add(hash << 31);
    hash
}

impl<K, V, P> Dict<K, V, P> {
    /// Digest of the layout of both generations: bucket array address, size
    /// and used count. Any add, delete or rehash step changes it.
    pub fn fingerprint(&self) -> u64 {
        let integers = [
            self.ht[0].table.as_ptr() as u64,
            self.ht[0].size_exp as i64 as u64,
            self.ht[0].used as u64,
            self.ht[1].table.as_ptr() as u64,
            self.ht[1].size_exp as i64 as u64,
            self.ht[1].used as u64,
        ];
        integers
            .iter()
            .fold(0u64, |hash, &n| mix64(hash.wrapping_add(n)))
    }

    pub fn get_iterator(&self) -> DictIterator<K, V> {
        DictIterator {
            table: 0,
            index: -1,
            safe: false,
            pending: Vec::new(),
            fingerprint: self.fingerprint(),
            _boo: PhantomData,
        }
    }

    pub fn get_safe_iterator(&mut self) -> DictIterator<K, V> {
        self.iterators += 1;
        DictIterator {
            safe: true,
            ..self.get_iterator()
        }
    }

    fn chain_head(&self, table: usize, index: i64) -> Option<&DictEntry<K, V>> {
        self.ht[table].table.get(index as usize)?.as_deref()
    }

    fn chain_entry(&self, table: usize, index: i64, addr: usize) -> Option<&DictEntry<K, V>> {
        let mut he = self.chain_head(table, index);
        while let Some(entry) = he {
            if entry_addr(entry) == addr {
                return Some(entry);
            }
            he = entry.next.as_deref();
        }
        None
    }

    /// Returns the next entry, or None once both generations are exhausted.
    /// With a safe iterator any entry, returned or not, may be deleted before
    /// the next call.
    pub fn next(&self, it: &mut DictIterator<K, V>) -> Option<&DictEntry<K, V>> {
        // entries deleted since the chain was entered are skipped
        while let Some(addr) = it.pending.pop() {
            if let Some(entry) = self.chain_entry(it.table, it.index, addr) {
                return Some(entry);
            }
        }
        loop {
            it.index += 1;
            if it.index as usize >= self.ht[it.table].size() {
                if self.is_rehashing() && it.table == 0 {
                    it.table = 1;
                    it.index = 0;
                } else {
                    return None;
                }
            }
            if it.index as usize >= self.ht[it.table].size() {
                return None;
            }
            if let Some(entry) = self.chain_head(it.table, it.index) {
                let mut rest = entry.next.as_deref();
                while let Some(next) = rest {
                    it.pending.push(entry_addr(next));
                    rest = next.next.as_deref();
                }
                it.pending.reverse();
                return Some(entry);
            }
        }
    }

    /// Verifies that an unsafe iterator was not invalidated by a mutation.
    pub fn check_iterator(&self, it: &DictIterator<K, V>) -> Result<(), HashError> {
        if it.safe {
            return Ok(());
        }
        let actual = self.fingerprint();
        if actual != it.fingerprint {
            return Err(HashError::FingerprintMismatch {
                expected: it.fingerprint,
                actual,
            });
        }
        Ok(())
    }

    /// Ends an iteration.
    ///
    /// # Panics
    ///
    /// Panics when an unsafe iterator was used across a mutation of the dict.
    pub fn release_iterator(&mut self, it: DictIterator<K, V>) {
        if it.safe {
            self.iterators = self.iterators.saturating_sub(1);
            return;
        }
        if let Err(e) = self.check_iterator(&it) {
            panic!("{}", e);
        }
    }

    /// Borrowing iterator over all entries. The dict cannot be mutated while
    /// it is alive, so no fingerprint is needed.
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            dict: self,
            it: self.get_iterator(),
        }
    }
}

pub struct Iter<'a, K, V, P = ()> {
    dict: &'a Dict<K, V, P>,
    it: DictIterator<K, V>,
}

impl<'a, K, V, P> Iterator for Iter<'a, K, V, P> {
    type Item = &'a DictEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.dict.next(&mut self.it)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.dict.dict_size()))
    }
}

impl<'a, K, V, P> IntoIterator for &'a Dict<K, V, P> {
    type Item = &'a DictEntry<K, V>;
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
