use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::mem;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::config::DictConfig;
use crate::dict::dict_type::DictType;
use crate::dict::error::HashError;
use crate::dict::hash::sys_hash;
use crate::dict::lib::{
    dict_size, dict_size_mask, entry_mem_usage, next_exp, DictResizeFlag, ResizeGate, DICT_HT_INITIAL_SIZE,
};

/// Head of a bucket chain.
pub type Bucket<K, V> = Option<Box<DictEntry<K, V>>>;

/// Value slot of an entry. A given dict normally only ever populates one of
/// the non-empty variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DictValue<V> {
    /// Entry returned by `add_raw` / `add_or_find` that has not been set yet.
    #[default]
    Empty,
    Val(V),
    Signed(i64),
    Unsigned(u64),
    Double(f64),
}

impl<V> DictValue<V> {
    pub fn as_val(&self) -> Option<&V> {
        match self {
            DictValue::Val(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DictValue::Empty)
    }
}

pub struct DictEntry<K, V> {
    pub(crate) key: K,
    pub(crate) val: DictValue<V>,
    pub(crate) next: Bucket<K, V>,
}

impl<K: Debug, V: Debug> Debug for DictEntry<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictEntry")
            .field("key", &self.key)
            .field("val", &self.val)
            .finish()
    }
}

impl<K, V> DictEntry<K, V> {
    fn new(key: K, next: Bucket<K, V>) -> Self {
        Self {
            key,
            val: DictValue::Empty,
            next,
        }
    }

    #[inline]
    pub fn get_key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn get_val(&self) -> &DictValue<V> {
        &self.val
    }

    #[inline]
    pub fn get_val_mut(&mut self) -> &mut DictValue<V> {
        &mut self.val
    }

    /// Stores `val` as is; the dict's `val_dup` hook is not applied here.
    #[inline]
    pub fn set_val(&mut self, val: V) {
        self.val = DictValue::Val(val)
    }

    #[inline]
    pub fn set_signed_integer_val(&mut self, val: i64) {
        self.val = DictValue::Signed(val)
    }

    #[inline]
    pub fn set_unsigned_integer_val(&mut self, val: u64) {
        self.val = DictValue::Unsigned(val)
    }

    #[inline]
    pub fn set_double_val(&mut self, val: f64) {
        self.val = DictValue::Double(val)
    }

    pub fn get_signed_integer_val(&self) -> Option<i64> {
        match self.val {
            DictValue::Signed(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_unsigned_integer_val(&self) -> Option<u64> {
        match self.val {
            DictValue::Unsigned(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_double_val(&self) -> Option<f64> {
        match self.val {
            DictValue::Double(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn next_entry(&self) -> Option<&DictEntry<K, V>> {
        self.next.as_deref()
    }
}

/// One generation of buckets.
pub(crate) struct DictTable<K, V> {
    pub(crate) table: Vec<Bucket<K, V>>,
    /// exponent of size. (size = 1<<exp), -1 while unallocated
    pub(crate) size_exp: i32,
    pub(crate) used: usize,
}

impl<K, V> Default for DictTable<K, V> {
    fn default() -> Self {
        Self {
            table: Vec::new(),
            size_exp: -1,
            used: 0,
        }
    }
}

impl<K, V> DictTable<K, V> {
    fn with_exp(exp: i32) -> Self {
        let mut table = Vec::new();
        table.resize_with(dict_size(exp), || None);
        Self {
            table,
            size_exp: exp,
            used: 0,
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        dict_size(self.size_exp)
    }

    #[inline]
    pub(crate) fn mask(&self) -> u64 {
        dict_size_mask(self.size_exp)
    }
}

/// Location of an entry: generation, bucket and depth in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryPos {
    pub(crate) table: usize,
    pub(crate) bucket: usize,
    pub(crate) depth: usize,
}

pub struct Dict<K, V, P = ()> {
    pub(crate) dict_type: Arc<DictType<K, V, P>>,
    pub(crate) privdata: P,
    pub(crate) ht: [DictTable<K, V>; 2],
    /// rehashing not in progress if rehash_idx == -1
    pub(crate) rehash_idx: i64,
    /// number of safe iterators currently open, rehash steps are paused while >0
    pub(crate) iterators: u64,
    /// longest chain seen by fair sampling since the last migration finished
    pub(crate) fair_chain_bound: usize,
    pub(crate) resize_gate: ResizeGate,
    pub(crate) config: DictConfig,
}

impl<K, V> Dict<K, V>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self::create(Arc::new(DictType::default()), ())
    }
}

impl<K, V> Default for Dict<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, P> Dict<K, V, P> {
    pub fn create(dict_type: Arc<DictType<K, V, P>>, privdata: P) -> Self {
        Self::with_config(dict_type, privdata, DictConfig::default())
    }

    pub fn with_config(dict_type: Arc<DictType<K, V, P>>, privdata: P, config: DictConfig) -> Self {
        let flag = if config.resize_enabled {
            DictResizeFlag::DictResizeEnable
        } else {
            DictResizeFlag::DictResizeAvoid
        };
        Self::with_resize_gate(dict_type, privdata, config, ResizeGate::new(flag))
    }

    /// Builds a dict that follows the resize policy of `gate`, which may be
    /// shared with other dicts.
    pub fn with_resize_gate(
        dict_type: Arc<DictType<K, V, P>>,
        privdata: P,
        config: DictConfig,
        gate: ResizeGate,
    ) -> Self {
        Self {
            dict_type,
            privdata,
            ht: [DictTable::default(), DictTable::default()],
            rehash_idx: -1,
            iterators: 0,
            fair_chain_bound: 1,
            resize_gate: gate,
            config,
        }
    }

    #[inline]
    pub fn is_rehashing(&self) -> bool {
        self.rehash_idx != -1
    }

    #[inline]
    pub fn rehash_idx(&self) -> i64 {
        self.rehash_idx
    }

    /// Number of entries stored in both generations.
    #[inline]
    pub fn dict_size(&self) -> usize {
        self.ht[0].used + self.ht[1].used
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dict_size() == 0
    }

    /// Number of buckets allocated in both generations.
    #[inline]
    pub fn dict_slots(&self) -> usize {
        self.ht[0].size() + self.ht[1].size()
    }

    /// Approximate heap usage of entries and bucket arrays.
    pub fn mem_usage(&self) -> usize {
        self.dict_size() * entry_mem_usage::<K, V>()
            + self.dict_slots() * mem::size_of::<Bucket<K, V>>()
    }

    pub fn privdata(&self) -> &P {
        &self.privdata
    }

    pub fn config(&self) -> &DictConfig {
        &self.config
    }

    pub fn resize_gate(&self) -> &ResizeGate {
        &self.resize_gate
    }

    pub fn enable_resize(&self) {
        self.resize_gate.enable()
    }

    pub fn disable_resize(&self) {
        self.resize_gate.disable()
    }

    /// True when the table is allocated beyond the initial size and filled
    /// below `min_fill_percent`, i.e. `resize` would shrink it.
    pub fn needs_resize(&self) -> bool {
        let size = self.dict_slots();
        let used = self.dict_size();
        size > DICT_HT_INITIAL_SIZE && used * 100 / size < self.config.min_fill_percent
    }

    fn dup_key(&self, key: K) -> K {
        match &self.dict_type.key_dup {
            Some(dup) => dup(&self.privdata, &key),
            None => key,
        }
    }

    fn dup_val(&self, val: V) -> V {
        match &self.dict_type.val_dup {
            Some(dup) => dup(&self.privdata, &val),
            None => val,
        }
    }

    fn free_key(&self, key: K) {
        if let Some(destructor) = &self.dict_type.key_destructor {
            destructor(&self.privdata, key)
        }
    }

    fn free_val(&self, val: DictValue<V>) {
        if let (Some(destructor), DictValue::Val(val)) = (&self.dict_type.val_destructor, val) {
            destructor(&self.privdata, val)
        }
    }

    /// Destroys an entry detached with `unlink`.
    pub fn free_unlinked_entry(&self, entry: Box<DictEntry<K, V>>) {
        let DictEntry { key, val, next } = *entry;
        debug_assert!(next.is_none());
        self.free_key(key);
        self.free_val(val);
    }

    pub(crate) fn entry_at(&self, pos: EntryPos) -> Option<&DictEntry<K, V>> {
        let mut he = self.ht[pos.table].table.get(pos.bucket)?.as_deref();
        for _ in 0..pos.depth {
            he = he?.next.as_deref();
        }
        he
    }

    pub(crate) fn entry_at_mut(&mut self, pos: EntryPos) -> Option<&mut DictEntry<K, V>> {
        let mut he = self.ht[pos.table].table.get_mut(pos.bucket)?.as_deref_mut();
        for _ in 0..pos.depth {
            he = he?.next.as_deref_mut();
        }
        he
    }

    fn unlink_at(&mut self, pos: EntryPos) -> Option<Box<DictEntry<K, V>>> {
        let t = &mut self.ht[pos.table];
        let mut link = t.table.get_mut(pos.bucket)?;
        for _ in 0..pos.depth {
            link = &mut link.as_mut()?.next;
        }
        let mut entry = link.take()?;
        *link = entry.next.take();
        t.used -= 1;
        Some(entry)
    }

    /// Destroys every entry of one generation and resets it. `callback` is
    /// invoked with the private data every 65536 buckets.
    fn clear_table(&mut self, table: usize, callback: Option<fn(&P)>) {
        let t = mem::take(&mut self.ht[table]);
        for (i, mut bucket) in t.table.into_iter().enumerate() {
            if let Some(callback) = callback {
                if i & 65535 == 0 {
                    callback(&self.privdata);
                }
            }
            while let Some(mut entry) = bucket {
                bucket = entry.next.take();
                self.free_unlinked_entry(entry);
            }
        }
    }

    /// Removes every entry and returns to the unallocated idle state.
    pub fn empty(&mut self, callback: Option<fn(&P)>) {
        self.clear_table(0, callback);
        self.clear_table(1, callback);
        self.rehash_idx = -1;
        self.fair_chain_bound = 1;
    }

    /// Destroys the dict, running the destructors of every entry.
    pub fn release(self) {}

    /// Moves the whole chain of bucket `idx` of the old generation into the
    /// new one.
    fn rehash_bucket(&mut self, idx: usize)
    where
        K: Hash,
    {
        let mut de = self.ht[0].table[idx].take();
        let shrinking = self.ht[1].size_exp < self.ht[0].size_exp;
        let mask1 = self.ht[1].mask();
        while let Some(mut entry) = de {
            de = entry.next.take();
            // hash & mask0 == idx, so when shrinking hash & mask1 == idx & mask1
            let h = if shrinking {
                idx as u64 & mask1
            } else {
                self.hash_key(&entry.key) & mask1
            } as usize;
            entry.next = self.ht[1].table[h].take();
            self.ht[1].table[h] = Some(entry);
            self.ht[0].used -= 1;
            self.ht[1].used += 1;
        }
    }

    fn check_rehashing_complete(&mut self) -> bool {
        if self.ht[0].used != 0 {
            return false;
        }
        self.ht[0] = mem::take(&mut self.ht[1]);
        self.rehash_idx = -1;
        self.fair_chain_bound = 1;
        debug!(size = self.ht[0].size(), used = self.ht[0].used, "dict rehashing completed");
        true
    }

    /// Performs up to `n` bucket migrations. Empty buckets do not count as
    /// work but at most `n * empty_visits_per_step` of them are skipped per
    /// call. Returns true once no migration is in progress anymore.
    pub fn rehash(&mut self, n: usize) -> bool
    where
        K: Hash,
    {
        if !self.is_rehashing() {
            return true;
        }
        let mut empty_visits = n * self.config.empty_visits_per_step.max(1);
        let mut n = n;
        while n > 0 && self.ht[0].used != 0 {
            n -= 1;
            assert!(self.ht[0].size() > self.rehash_idx as usize);
            while self.ht[0].table[self.rehash_idx as usize].is_none() {
                self.rehash_idx += 1;
                empty_visits -= 1;
                if empty_visits == 0 {
                    return false;
                }
            }
            self.rehash_bucket(self.rehash_idx as usize);
            self.rehash_idx += 1;
        }
        self.check_rehashing_complete()
    }

    /// One migration step, skipped while safe iterators are open.
    pub(crate) fn rehash_step(&mut self)
    where
        K: Hash,
    {
        if self.is_rehashing() && self.iterators == 0 {
            self.rehash(1);
        }
    }

    /// Rehashes in batches until `ms` milliseconds elapsed or the migration
    /// completed. Returns the number of batched steps requested.
    pub fn rehash_milliseconds(&mut self, ms: u64) -> usize
    where
        K: Hash,
    {
        if self.iterators > 0 {
            return 0;
        }
        let batch = self.config.rehash_batch.max(1);
        let start = Instant::now();
        let mut rehashes = 0;
        while !self.rehash(batch) {
            rehashes += batch;
            if start.elapsed().as_millis() as u64 > ms {
                break;
            }
        }
        rehashes
    }

    pub(crate) fn hash_key(&self, key: &K) -> u64
    where
        K: Hash,
    {
        match &self.dict_type.hash_function {
            Some(hash) => hash(key),
            None => sys_hash(key),
        }
    }
}

impl<K, V, P> Dict<K, V, P>
where
    K: Hash + Eq,
{
    fn compare_keys(&self, key1: &K, key2: &K) -> bool {
        match &self.dict_type.key_compare {
            Some(compare) => compare(&self.privdata, key1, key2),
            None => key1 == key2,
        }
    }

    pub fn get_hash(&self, key: &K) -> u64 {
        self.hash_key(key)
    }

    /// Starts a migration to a table of the next power of two >= `size`, or
    /// installs that table directly when there is nothing to migrate.
    pub fn expand(&mut self, size: usize) -> Result<(), HashError> {
        if self.is_rehashing() {
            return Err(HashError::IsRehashing);
        }
        if self.ht[0].used > size {
            return Err(HashError::ExpandErr(format!(
                "size {} is smaller than the {} stored entries",
                size, self.ht[0].used
            )));
        }
        let exp = next_exp(size);
        if exp == self.ht[0].size_exp {
            return Err(HashError::ExpandErr(format!(
                "table already has {} buckets",
                dict_size(exp)
            )));
        }
        let table = DictTable::with_exp(exp);
        if self.ht[0].used == 0 {
            self.ht[0] = table;
            return Ok(());
        }
        debug!(from = self.ht[0].size(), to = table.size(), "dict rehashing started");
        self.ht[1] = table;
        self.rehash_idx = 0;
        Ok(())
    }

    fn expand_if_needed(&mut self) -> Result<(), HashError> {
        if self.is_rehashing() {
            return Ok(());
        }
        if self.ht[0].size() == 0 {
            return self.expand(DICT_HT_INITIAL_SIZE);
        }
        let used = self.ht[0].used;
        let size = self.ht[0].size();
        if used >= size && (self.resize_gate.is_enabled() || used / size > self.config.force_resize_ratio) {
            return self.expand(used + 1);
        }
        Ok(())
    }

    /// Shrinks (or grows) the table to the smallest size holding every entry
    /// at a load factor <= 1.
    pub fn resize(&mut self) -> Result<(), HashError> {
        if !self.resize_gate.is_enabled() {
            return Err(HashError::ResizeForbidden);
        }
        if self.is_rehashing() {
            return Err(HashError::IsRehashing);
        }
        let minimal = self.ht[0].used.max(DICT_HT_INITIAL_SIZE);
        self.expand(minimal)
    }

    pub(crate) fn key_position(&self, key: &K, hash: u64) -> Option<EntryPos> {
        if self.dict_size() == 0 {
            return None;
        }
        for table in 0..2 {
            let t = &self.ht[table];
            if t.size() != 0 {
                let bucket = (hash & t.mask()) as usize;
                let mut he = t.table[bucket].as_deref();
                let mut depth = 0;
                while let Some(entry) = he {
                    if self.compare_keys(key, &entry.key) {
                        return Some(EntryPos { table, bucket, depth });
                    }
                    he = entry.next.as_deref();
                    depth += 1;
                }
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    /// Inserts `key` with an empty value and returns the new entry. When the
    /// key already exists nothing is inserted and the existing entry is
    /// returned as the error.
    /// Locates `key`, linking a new entry with an empty value at the head of
    /// its bucket when it is missing. Err carries the existing entry.
    fn insert_position(&mut self, key: K) -> Result<EntryPos, EntryPos> {
        let hash = self.hash_key(&key);
        self.rehash_step();
        if let Err(e) = self.expand_if_needed() {
            debug!(cause = %e, "dict expand skipped");
        }
        if let Some(pos) = self.key_position(&key, hash) {
            return Err(pos);
        }
        // while rehashing new entries only go to the new table
        let table = if self.is_rehashing() { 1 } else { 0 };
        let key = self.dup_key(key);
        let t = &mut self.ht[table];
        let bucket = (hash & t.mask()) as usize;
        let head = t.table[bucket].take();
        t.table[bucket] = Some(Box::new(DictEntry::new(key, head)));
        t.used += 1;
        Ok(EntryPos {
            table,
            bucket,
            depth: 0,
        })
    }

    fn located(&mut self, pos: EntryPos) -> &mut DictEntry<K, V> {
        match self.entry_at_mut(pos) {
            Some(entry) => entry,
            None => unreachable!("located entry is missing from its chain"),
        }
    }

    pub fn add_raw(&mut self, key: K) -> Result<&mut DictEntry<K, V>, &mut DictEntry<K, V>> {
        match self.insert_position(key) {
            Ok(pos) => Ok(self.located(pos)),
            Err(pos) => Err(self.located(pos)),
        }
    }

    /// Adds `key` with `val`. The value is only duplicated once the key is
    /// known to be new.
    pub fn add(&mut self, key: K, val: V) -> Result<(), HashError> {
        let pos = self
            .insert_position(key)
            .map_err(|_| HashError::DictEntryDup)?;
        let val = self.dup_val(val);
        self.located(pos).val = DictValue::Val(val);
        Ok(())
    }

    /// Returns the entry of `key`, inserting an empty one if missing.
    pub fn add_or_find(&mut self, key: K) -> &mut DictEntry<K, V> {
        match self.add_raw(key) {
            Ok(entry) => entry,
            Err(existing) => existing,
        }
    }

    /// Sets `key` to `val`. Returns true if the key was added, false if an
    /// existing value was overwritten.
    pub fn replace(&mut self, key: K, val: V) -> bool {
        let (pos, added) = match self.insert_position(key) {
            Ok(pos) => (pos, true),
            Err(pos) => (pos, false),
        };
        let val = self.dup_val(val);
        let old = mem::replace(&mut self.located(pos).val, DictValue::Val(val));
        self.free_val(old);
        added
    }

    pub fn find(&mut self, key: &K) -> Option<&DictEntry<K, V>> {
        if self.dict_size() == 0 {
            return None;
        }
        self.rehash_step();
        let hash = self.hash_key(key);
        let pos = self.key_position(key, hash)?;
        self.entry_at(pos)
    }

    pub fn find_mut(&mut self, key: &K) -> Option<&mut DictEntry<K, V>> {
        if self.dict_size() == 0 {
            return None;
        }
        self.rehash_step();
        let hash = self.hash_key(key);
        let pos = self.key_position(key, hash)?;
        self.entry_at_mut(pos)
    }

    pub fn fetch_value(&mut self, key: &K) -> Option<&DictValue<V>> {
        self.find(key).map(|entry| entry.get_val())
    }

    /// Looks up the entry whose key lives at `key_ptr`, by identity.
    pub fn find_entry_ref_by_ptr_and_hash(&self, key_ptr: *const K, hash: u64) -> Option<&DictEntry<K, V>> {
        if self.dict_size() == 0 {
            return None;
        }
        for table in 0..2 {
            let t = &self.ht[table];
            if t.size() != 0 {
                let mut he = t.table[(hash & t.mask()) as usize].as_deref();
                while let Some(entry) = he {
                    if std::ptr::eq(&entry.key, key_ptr) {
                        return Some(entry);
                    }
                    he = entry.next.as_deref();
                }
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    fn generic_delete(&mut self, key: &K) -> Option<Box<DictEntry<K, V>>> {
        if self.dict_size() == 0 {
            return None;
        }
        self.rehash_step();
        let hash = self.hash_key(key);
        let pos = self.key_position(key, hash)?;
        self.unlink_at(pos)
    }

    pub fn delete(&mut self, key: &K) -> Result<(), HashError> {
        match self.generic_delete(key) {
            Some(entry) => {
                self.free_unlinked_entry(entry);
                Ok(())
            }
            None => Err(HashError::DictNoKey),
        }
    }

    /// Detaches the entry of `key` without destroying it. The caller must
    /// hand it back to `free_unlinked_entry` (or drop it) when done.
    pub fn unlink(&mut self, key: &K) -> Option<Box<DictEntry<K, V>>> {
        self.generic_delete(key)
    }
}

impl<K, V, P> Drop for Dict<K, V, P> {
    fn drop(&mut self) {
        self.empty(None);
    }
}
