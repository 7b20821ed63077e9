use std::collections::HashSet;
use std::hash::Hash;

use crate::dict::dict::{Dict, DictEntry, EntryPos};
use crate::dict::lib::{random_ulong, FAIR_DRAWS_PER_SAMPLE, SAMPLE_EMPTY_JUMP};

impl<K, V, P> Dict<K, V, P>
where
    K: Hash,
{
    /// Uniformly picks one of the buckets that may hold entries, empty or
    /// not. While rehashing, ht[0] buckets below rehash_idx are known to be
    /// empty and never picked.
    fn random_bucket(&self) -> (usize, usize) {
        if self.is_rehashing() {
            let s0 = self.ht[0].size();
            let s1 = self.ht[1].size();
            let rehash_idx = self.rehash_idx as usize;
            let h = rehash_idx + (random_ulong() % (s0 + s1 - rehash_idx) as u64) as usize;
            if h >= s0 {
                (1, h - s0)
            } else {
                (0, h)
            }
        } else {
            (0, (random_ulong() & self.ht[0].mask()) as usize)
        }
    }

    fn chain_len(&self, table: usize, bucket: usize) -> usize {
        let mut len = 0;
        let mut he = self.ht[table].table[bucket].as_deref();
        while let Some(entry) = he {
            len += 1;
            he = entry.next.as_deref();
        }
        len
    }

    /// Picks a random non-empty bucket, then a random entry of its chain.
    /// Buckets are uniform, entries are not: keys in long chains are less
    /// likely to be returned.
    fn random_position(&self) -> Option<EntryPos> {
        if self.dict_size() == 0 {
            return None;
        }
        loop {
            let (table, bucket) = self.random_bucket();
            let len = self.chain_len(table, bucket);
            if len > 0 {
                let depth = (random_ulong() % len as u64) as usize;
                return Some(EntryPos { table, bucket, depth });
            }
        }
    }

    pub fn get_random_key(&mut self) -> Option<&DictEntry<K, V>> {
        if self.dict_size() == 0 {
            return None;
        }
        self.rehash_step();
        let pos = self.random_position()?;
        self.entry_at(pos)
    }

    fn sampling_rehash_steps(&mut self, count: usize) {
        for _ in 0..count {
            if !self.is_rehashing() {
                break;
            }
            self.rehash_step();
        }
    }

    /// Collects up to `count` positions from a run of contiguous buckets
    /// starting at a random index, in both generations while rehashing.
    /// A bucket is harvested at most once, even when a jump lands on it
    /// again.
    fn sample_positions(&self, count: usize) -> Vec<EntryPos> {
        let count = count.min(self.dict_size());
        let mut sampled = Vec::with_capacity(count);
        if count == 0 {
            return sampled;
        }
        let mut harvested = HashSet::new();
        let mut maxsteps = count * 10;
        let tables = if self.is_rehashing() { 2 } else { 1 };
        let mut maxsizemask = self.ht[0].mask();
        if tables > 1 && self.ht[1].mask() > maxsizemask {
            maxsizemask = self.ht[1].mask();
        }

        let mut i = random_ulong() & maxsizemask;
        let mut emptylen = 0;
        while sampled.len() < count && maxsteps > 0 {
            maxsteps -= 1;
            for table in 0..tables {
                // ht[0] indexes below rehash_idx were already migrated
                if tables == 2 && table == 0 && i < self.rehash_idx as u64 {
                    if i >= self.ht[1].size() as u64 {
                        i = self.rehash_idx as u64;
                    } else {
                        continue;
                    }
                }
                let t = &self.ht[table];
                if i >= t.size() as u64 {
                    continue;
                }
                let bucket = i as usize;
                let mut he = t.table[bucket].as_deref();
                if he.is_none() {
                    emptylen += 1;
                    if emptylen >= SAMPLE_EMPTY_JUMP && emptylen > count {
                        i = random_ulong() & maxsizemask;
                        emptylen = 0;
                    }
                    continue;
                }
                emptylen = 0;
                if !harvested.insert((table, bucket)) {
                    continue;
                }
                let mut depth = 0;
                while let Some(entry) = he {
                    sampled.push(EntryPos { table, bucket, depth });
                    if sampled.len() == count {
                        return sampled;
                    }
                    he = entry.next.as_deref();
                    depth += 1;
                }
            }
            i = (i + 1) & maxsizemask;
        }
        sampled
    }

    /// Returns up to `count` entries sampled from a random region of the
    /// table. Faster than calling `get_random_key` `count` times but neither
    /// uniform nor guaranteed to return `count` entries. No entry is returned
    /// twice.
    pub fn get_some_keys(&mut self, count: usize) -> Vec<&DictEntry<K, V>> {
        self.sampling_rehash_steps(count.min(self.dict_size()));
        let this: &Self = self;
        this.sample_positions(count)
            .into_iter()
            .filter_map(move |pos| this.entry_at(pos))
            .collect()
    }

    /// Returns an entry drawn uniformly over all keys.
    ///
    /// A `get_some_keys` sample of `fair_sample_size` entries bounds the chain
    /// length. Buckets are then drawn uniformly and a depth below the bound is
    /// accepted only if the chain reaches it, so every entry has the same
    /// odds regardless of its chain or of the empty buckets around it. If the
    /// draws keep missing, one entry of the sample is returned.
    pub fn get_fair_random_key(&mut self) -> Option<&DictEntry<K, V>> {
        if self.dict_size() == 0 {
            return None;
        }
        let sample_size = self.config.fair_sample_size.max(1);
        self.sampling_rehash_steps(sample_size.min(self.dict_size()));
        let positions = self.sample_positions(sample_size);
        if let Some(deepest) = positions.iter().map(|pos| pos.depth + 1).max() {
            self.fair_chain_bound = self.fair_chain_bound.max(deepest);
        }

        for _ in 0..sample_size * FAIR_DRAWS_PER_SAMPLE {
            let (table, bucket) = self.random_bucket();
            let len = self.chain_len(table, bucket);
            if len == 0 {
                continue;
            }
            self.fair_chain_bound = self.fair_chain_bound.max(len);
            let depth = (random_ulong() % self.fair_chain_bound as u64) as usize;
            if depth < len {
                return self.entry_at(EntryPos { table, bucket, depth });
            }
        }

        if positions.is_empty() {
            return self.get_random_key();
        }
        let pick = positions[(random_ulong() % positions.len() as u64) as usize];
        self.entry_at(pick)
    }
}
