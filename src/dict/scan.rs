use crate::dict::dict::{Bucket, Dict, DictEntry, DictTable};

/// Reverse binary increment of the bits of `v` covered by `mask`.
#[inline]
fn next_cursor(v: u64, mask: u64) -> u64 {
    let v = v | !mask;
    v.reverse_bits().wrapping_add(1).reverse_bits()
}

fn emit_bucket<K, V, F>(t: &DictTable<K, V>, idx: u64, f: &mut F)
where
    F: FnMut(&DictEntry<K, V>),
{
    let mut he = t.table[idx as usize].as_deref();
    while let Some(entry) = he {
        f(entry);
        he = entry.next.as_deref();
    }
}

/// Calls `visit(table, idx)` for every bucket addressed by `cursor`: one
/// bucket of the smaller table, then every bucket of the larger table that
/// expands it. Returns the next cursor.
fn walk_cursor<F>(cursor: u64, small: (usize, u64), large: Option<(usize, u64)>, mut visit: F) -> u64
where
    F: FnMut(usize, u64),
{
    let mut v = cursor;
    let (t0, m0) = small;
    visit(t0, v & m0);
    let Some((t1, m1)) = large else {
        return next_cursor(v, m0);
    };
    loop {
        visit(t1, v & m1);
        v = next_cursor(v, m1);
        if v & (m0 ^ m1) == 0 {
            break;
        }
    }
    v
}

impl<K, V, P> Dict<K, V, P> {
    /// Table index and mask of the smaller and, while rehashing, the larger
    /// generation.
    fn scan_tables(&self) -> ((usize, u64), Option<(usize, u64)>) {
        let m0 = self.ht[0].mask();
        if !self.is_rehashing() {
            return ((0, m0), None);
        }
        let m1 = self.ht[1].mask();
        if self.ht[0].size() <= self.ht[1].size() {
            ((0, m0), Some((1, m1)))
        } else {
            ((1, m1), Some((0, m0)))
        }
    }

    /// Visits the entries of the bucket(s) addressed by `cursor` and returns
    /// the cursor of the next call, 0 once the whole dict was covered.
    ///
    /// Start with cursor 0. Every entry present for the whole duration of a
    /// full scan is reported at least once, even if the table grows, shrinks
    /// or rehashes between calls. Entries may be reported more than once.
    pub fn scan<F>(&self, cursor: u64, mut f: F) -> u64
    where
        F: FnMut(&DictEntry<K, V>),
    {
        if self.dict_size() == 0 {
            return 0;
        }
        let (small, large) = self.scan_tables();
        walk_cursor(cursor, small, large, |table, idx| {
            emit_bucket(&self.ht[table], idx, &mut f)
        })
    }

    /// Same as `scan`, but first hands every visited bucket to `bucket_fn`.
    /// It may update or reorder the entries of the chain in place; it must
    /// not add or remove entries.
    pub fn scan_buckets<F, B>(&mut self, cursor: u64, mut f: F, mut bucket_fn: B) -> u64
    where
        F: FnMut(&DictEntry<K, V>),
        B: FnMut(&mut Bucket<K, V>),
    {
        if self.dict_size() == 0 {
            return 0;
        }
        let (small, large) = self.scan_tables();
        let ht = &mut self.ht;
        walk_cursor(cursor, small, large, |table, idx| {
            let t = &mut ht[table];
            bucket_fn(&mut t.table[idx as usize]);
            emit_bucket(t, idx, &mut f);
        })
    }
}
