#[cfg(test)]
mod dict_test {
    use std::collections::{HashMap, HashSet};
    use std::hash::Hash;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::config::DictConfig;
    use crate::dict::dict::{Dict, DictValue};
    use crate::dict::dict_type::DictType;
    use crate::dict::error::HashError;
    use crate::dict::lib::{DICT_FORCE_RESIZE_RATIO, DICT_STATS_VECTLEN};

    fn drain<K: Hash + Eq, V, P>(d: &mut Dict<K, V, P>) {
        while !d.rehash(100) {}
    }

    fn int_dict(n: i64) -> Dict<i64, i64> {
        let mut d = Dict::new();
        for j in 0..n {
            d.add(j, j).unwrap();
        }
        drain(&mut d);
        d
    }

    #[test]
    fn add_duplicate_test() {
        print!("[TEST] Add a, b, then a again: ");
        let mut d: Dict<String, i64> = Dict::new();
        assert_eq!(d.add("a".to_string(), 1), Ok(()));
        assert_eq!(d.add("b".to_string(), 2), Ok(()));
        assert_eq!(d.add("a".to_string(), 3), Err(HashError::DictEntryDup));
        assert_eq!(d.dict_size(), 2);
        assert_eq!(d.fetch_value(&"a".to_string()), Some(&DictValue::Val(1)));
        println!("PASS");

        print!("[TEST] Delete a, then a is gone: ");
        assert_eq!(d.delete(&"a".to_string()), Ok(()));
        assert!(d.find(&"a".to_string()).is_none());
        assert_eq!(d.dict_size(), 1);
        println!("PASS");
    }

    #[test]
    fn grow_to_eight_test() {
        print!("[TEST] Five keys grow the table from 4 to 8 buckets: ");
        let mut d: Dict<i64, i64> = Dict::new();
        assert_eq!(d.dict_slots(), 0);
        for j in 0..4 {
            d.add(j, j).unwrap();
        }
        assert_eq!(d.dict_slots(), 4);
        assert!(!d.is_rehashing());

        d.add(4, 4).unwrap();
        assert!(d.is_rehashing());
        assert_eq!(d.ht[1].size(), 8);
        drain(&mut d);
        assert!(!d.is_rehashing());
        assert_eq!(d.rehash_idx(), -1);
        assert_eq!(d.dict_slots(), 8);
        assert_eq!(d.dict_size(), 5);

        for (idx, bucket) in d.ht[0].table.iter().enumerate() {
            let mut he = bucket.as_deref();
            while let Some(entry) = he {
                assert_eq!((d.get_hash(entry.get_key()) & 7) as usize, idx);
                he = entry.next_entry();
            }
        }
        println!("PASS");
    }

    #[test]
    fn insert_resize_avoid_test() {
        let mut d = int_dict(16);

        print!("[TEST] Add 16 keys and verify dict resize is ok: ");
        assert_eq!(d.dict_size(), 16);
        assert_eq!(d.dict_slots(), 16);
        println!("PASS");

        print!("[TEST] Disable resize and pad to (force_resize_ratio + 1) * 16: ");
        d.disable_resize();
        let limit = (DICT_FORCE_RESIZE_RATIO as i64 + 1) * 16;
        for j in 16..limit {
            d.add(j, j).unwrap();
            assert!(!d.is_rehashing());
            assert_eq!(d.dict_slots(), 16);
        }
        assert_eq!(d.dict_size(), limit as usize);
        println!("PASS");

        print!("[TEST] One more key forces the growth: ");
        d.add(limit, limit).unwrap();
        assert!(d.is_rehashing());
        assert_eq!(d.ht[0].size(), 16);
        assert_eq!(d.ht[1].size(), 128);
        d.enable_resize();
        drain(&mut d);
        assert_eq!(d.dict_slots(), 128);
        assert_eq!(d.dict_size(), limit as usize + 1);
        println!("PASS");
    }

    #[test]
    fn load_factor_bound_test() {
        print!("[TEST] Load factor stays bounded with resize disabled: ");
        let mut d: Dict<i64, i64> = Dict::new();
        d.disable_resize();
        for j in 0..5000 {
            d.add(j, j).unwrap();
            let size0 = d.ht[0].size();
            assert!(size0.is_power_of_two());
            if d.is_rehashing() {
                assert!(d.ht[1].size().is_power_of_two());
            } else {
                assert!(d.dict_size() <= (DICT_FORCE_RESIZE_RATIO + 1) * size0);
            }
        }
        println!("PASS");
    }

    #[test]
    fn migration_preserves_keys_test() {
        print!("[TEST] Every key stays reachable during a migration: ");
        let mut d = int_dict(100);
        d.expand(1024).unwrap();
        assert!(d.is_rehashing());
        let mut steps = 0;
        loop {
            assert_eq!(d.dict_size(), 100);
            for j in 0..100 {
                let hash = d.get_hash(&j);
                assert!(d.key_position(&j, hash).is_some(), "key {} lost", j);
            }
            if d.rehash(1) {
                break;
            }
            steps += 1;
        }
        assert!(steps > 0);
        assert_eq!(d.dict_slots(), 1024);
        for j in 0..100 {
            assert_eq!(d.fetch_value(&j), Some(&DictValue::Val(j)));
        }
        println!("PASS");
    }

    #[test]
    fn insert_during_migration_test() {
        print!("[TEST] Keys added while migrating land in the new table: ");
        let mut d = int_dict(8);
        d.expand(64).unwrap();
        d.add(1000, 1).unwrap();
        assert!(d.ht[1].used >= 1);
        let hash = d.get_hash(&1000);
        assert_eq!(d.key_position(&1000, hash).map(|pos| pos.table), Some(1));
        println!("PASS");
    }

    #[test]
    fn delete_test() {
        let mut d = int_dict(50);

        print!("[TEST] Delete every key: ");
        for j in 0..50 {
            assert_eq!(d.delete(&j), Ok(()));
            assert!(d.find(&j).is_none());
        }
        assert_eq!(d.dict_size(), 0);
        assert_eq!(d.delete(&7), Err(HashError::DictNoKey));
        println!("PASS");

        print!("[TEST] Delete on an empty dict: ");
        let mut empty: Dict<i64, i64> = Dict::new();
        assert_eq!(empty.delete(&1), Err(HashError::DictNoKey));
        assert!(empty.unlink(&1).is_none());
        println!("PASS");
    }

    #[test]
    fn add_raw_and_typed_values_test() {
        let mut d: Dict<String, String> = Dict::new();

        print!("[TEST] add_raw returns the existing entry: ");
        {
            let entry = d.add_raw("k".to_string()).unwrap();
            assert!(entry.get_val().is_empty());
            entry.set_signed_integer_val(-5);
        }
        match d.add_raw("k".to_string()) {
            Err(existing) => assert_eq!(existing.get_signed_integer_val(), Some(-5)),
            Ok(_) => panic!("duplicate key inserted"),
        }
        assert_eq!(d.dict_size(), 1);
        println!("PASS");

        print!("[TEST] add_or_find and typed values: ");
        d.add_or_find("u".to_string()).set_unsigned_integer_val(7);
        d.add_or_find("f".to_string()).set_double_val(1.5);
        d.add_or_find("v".to_string()).set_val("hello".to_string());
        assert_eq!(d.find(&"u".to_string()).unwrap().get_unsigned_integer_val(), Some(7));
        assert_eq!(d.find(&"f".to_string()).unwrap().get_double_val(), Some(1.5));
        assert_eq!(d.find(&"f".to_string()).unwrap().get_signed_integer_val(), None);
        assert_eq!(
            d.fetch_value(&"v".to_string()).and_then(|v| v.as_val()),
            Some(&"hello".to_string())
        );
        let entry = d.add_or_find("u".to_string());
        assert_eq!(entry.get_unsigned_integer_val(), Some(7));
        assert_eq!(d.dict_size(), 4);
        println!("PASS");

        print!("[TEST] find_mut updates in place: ");
        if let Some(entry) = d.find_mut(&"v".to_string()) {
            entry.set_val("world".to_string());
        }
        assert_eq!(
            d.fetch_value(&"v".to_string()),
            Some(&DictValue::Val("world".to_string()))
        );
        println!("PASS");
    }

    #[derive(Default)]
    struct Freed {
        keys: AtomicUsize,
        vals: AtomicUsize,
    }

    fn counting_type() -> (Arc<DictType<i64, i64>>, Arc<Freed>) {
        let freed = Arc::new(Freed::default());
        let keys = freed.clone();
        let vals = freed.clone();
        let dict_type = DictType {
            key_destructor: Some(Box::new(move |_: &(), _: i64| {
                keys.keys.fetch_add(1, Ordering::SeqCst);
            })),
            val_destructor: Some(Box::new(move |_: &(), _: i64| {
                vals.vals.fetch_add(1, Ordering::SeqCst);
            })),
            ..DictType::default()
        };
        (Arc::new(dict_type), freed)
    }

    #[test]
    fn duplicate_value_copies_test() {
        print!("[TEST] Values are only duplicated for new keys: ");
        let copies = Arc::new(AtomicUsize::new(0));
        let freed = Arc::new(AtomicUsize::new(0));
        let (counter, frees) = (copies.clone(), freed.clone());
        let dict_type = DictType {
            val_dup: Some(Box::new(move |_: &(), val: &i64| {
                counter.fetch_add(1, Ordering::SeqCst);
                *val
            })),
            val_destructor: Some(Box::new(move |_: &(), _: i64| {
                frees.fetch_add(1, Ordering::SeqCst);
            })),
            ..DictType::default()
        };
        let mut d = Dict::create(Arc::new(dict_type), ());
        d.add(1, 10).unwrap();
        assert_eq!(d.add(1, 20), Err(HashError::DictEntryDup));
        assert_eq!(copies.load(Ordering::SeqCst), 1);
        assert_eq!(freed.load(Ordering::SeqCst), 0);
        assert_eq!(d.fetch_value(&1), Some(&DictValue::Val(10)));

        assert!(!d.replace(1, 30));
        assert!(d.replace(2, 40));
        assert_eq!(copies.load(Ordering::SeqCst), 3);
        assert_eq!(freed.load(Ordering::SeqCst), 1);
        assert_eq!(d.fetch_value(&1), Some(&DictValue::Val(30)));
        println!("PASS");
    }

    #[test]
    fn destructor_test() {
        let (dict_type, freed) = counting_type();
        let mut d = Dict::create(dict_type, ());
        for j in 0..10 {
            d.add(j, j).unwrap();
        }

        print!("[TEST] Replace frees the old value only: ");
        assert!(!d.replace(3, 30));
        assert!(d.replace(100, 100));
        assert_eq!(freed.vals.load(Ordering::SeqCst), 1);
        assert_eq!(freed.keys.load(Ordering::SeqCst), 0);
        assert_eq!(d.fetch_value(&3), Some(&DictValue::Val(30)));
        println!("PASS");

        print!("[TEST] Delete frees key and value: ");
        d.delete(&4).unwrap();
        assert_eq!(freed.keys.load(Ordering::SeqCst), 1);
        assert_eq!(freed.vals.load(Ordering::SeqCst), 2);
        println!("PASS");

        print!("[TEST] Unlink defers the destructors: ");
        let entry = d.unlink(&5).unwrap();
        assert_eq!(*entry.get_key(), 5);
        assert!(d.find(&5).is_none());
        assert_eq!(freed.keys.load(Ordering::SeqCst), 1);
        d.free_unlinked_entry(entry);
        assert_eq!(freed.keys.load(Ordering::SeqCst), 2);
        assert_eq!(freed.vals.load(Ordering::SeqCst), 3);
        println!("PASS");

        print!("[TEST] Release frees everything left: ");
        let left = d.dict_size();
        d.release();
        assert_eq!(freed.keys.load(Ordering::SeqCst), 2 + left);
        assert_eq!(freed.vals.load(Ordering::SeqCst), 3 + left);
        println!("PASS");
    }

    fn bump(calls: &AtomicUsize) {
        calls.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn empty_test() {
        print!("[TEST] Empty resets the dict and reports progress: ");
        let mut d: Dict<i64, i64, AtomicUsize> =
            Dict::create(Arc::new(DictType::default()), AtomicUsize::new(0));
        for j in 0..1000 {
            d.add(j, j).unwrap();
        }
        drain(&mut d);
        let callback: fn(&AtomicUsize) = bump;
        d.empty(Some(callback));
        assert_eq!(d.privdata().load(Ordering::SeqCst), 1);
        assert_eq!(d.dict_size(), 0);
        assert_eq!(d.dict_slots(), 0);
        assert!(!d.is_rehashing());
        d.add(1, 1).unwrap();
        assert_eq!(d.dict_slots(), 4);
        println!("PASS");
    }

    #[test]
    fn string_types_test() {
        print!("[TEST] Case insensitive keys: ");
        let mut d: Dict<String, i64> =
            Dict::create(Arc::new(DictType::case_insensitive_strings()), ());
        d.add("Hello".to_string(), 1).unwrap();
        assert_eq!(d.add("hELLO".to_string(), 2), Err(HashError::DictEntryDup));
        assert!(d.find(&"HELLO".to_string()).is_some());
        println!("PASS");

        print!("[TEST] Heap string copies: ");
        let mut d: Dict<String, String> = Dict::create(Arc::new(DictType::heap_strings()), ());
        for j in 0..100 {
            d.add(format!("key:{}", j), format!("val:{}", j)).unwrap();
        }
        assert_eq!(
            d.fetch_value(&"key:42".to_string()).and_then(|v| v.as_val()),
            Some(&"val:42".to_string())
        );
        println!("PASS");
    }

    #[test]
    fn expand_errors_test() {
        let mut d = int_dict(20);

        print!("[TEST] Expand below the stored entries fails: ");
        assert!(matches!(d.expand(10), Err(HashError::ExpandErr(_))));
        println!("PASS");

        print!("[TEST] Expand to the current size fails: ");
        assert_eq!(d.dict_slots(), 32);
        assert!(matches!(d.expand(32), Err(HashError::ExpandErr(_))));
        println!("PASS");

        print!("[TEST] Expand and resize while rehashing fail: ");
        d.expand(64).unwrap();
        assert_eq!(d.expand(128), Err(HashError::IsRehashing));
        assert_eq!(d.resize(), Err(HashError::IsRehashing));
        drain(&mut d);
        println!("PASS");

        print!("[TEST] Resize is refused while disabled: ");
        d.disable_resize();
        assert_eq!(d.resize(), Err(HashError::ResizeForbidden));
        d.enable_resize();
        println!("PASS");
    }

    #[test]
    fn shrink_test() {
        print!("[TEST] Resize shrinks a sparse table: ");
        let mut d = int_dict(1000);
        for j in 0..990 {
            d.delete(&j).unwrap();
        }
        assert!(d.needs_resize());
        d.resize().unwrap();
        assert!(d.is_rehashing());
        drain(&mut d);
        assert_eq!(d.dict_slots(), 16);
        assert!(!d.needs_resize());
        for j in 990..1000 {
            assert_eq!(d.fetch_value(&j), Some(&DictValue::Val(j)));
        }
        println!("PASS");
    }

    #[test]
    fn rehash_milliseconds_test() {
        let mut d = int_dict(10000);

        print!("[TEST] Paused by a safe iterator: ");
        d.expand(1 << 16).unwrap();
        let it = d.get_safe_iterator();
        assert_eq!(d.rehash_milliseconds(100), 0);
        d.release_iterator(it);
        println!("PASS");

        print!("[TEST] Drains the migration: ");
        while d.is_rehashing() {
            d.rehash_milliseconds(100);
        }
        assert_eq!(d.dict_slots(), 1 << 16);
        assert_eq!(d.dict_size(), 10000);
        println!("PASS");
    }

    #[test]
    fn rehash_empty_visits_test() {
        print!("[TEST] A rehash step gives up after too many empty buckets: ");
        let mut d: Dict<i64, i64> = Dict::new();
        d.add(0, 0).unwrap();
        d.add(1, 1).unwrap();
        d.expand(1 << 12).unwrap();
        drain(&mut d);
        // two keys spread over 4096 buckets, shrink back
        d.resize().unwrap();
        assert!(d.is_rehashing());
        let idx = d.rehash_idx();
        let done = d.rehash(1);
        if !done {
            assert!(d.rehash_idx() - idx <= 10);
        }
        drain(&mut d);
        assert_eq!(d.dict_slots(), 4);
        println!("PASS");
    }

    #[test]
    fn iterator_test() {
        let mut d = int_dict(100);

        print!("[TEST] Unsafe iterator visits every entry: ");
        let mut it = d.get_iterator();
        let mut seen = HashSet::new();
        while let Some(entry) = d.next(&mut it) {
            assert!(seen.insert(*entry.get_key()));
        }
        d.release_iterator(it);
        assert_eq!(seen.len(), 100);
        println!("PASS");

        print!("[TEST] Borrowing iterator: ");
        let sum: i64 = d.iter().map(|e| *e.get_key()).sum();
        assert_eq!(sum, (0..100).sum::<i64>());
        let mut count = 0;
        for _ in &d {
            count += 1;
        }
        assert_eq!(count, 100);
        println!("PASS");

        print!("[TEST] Iteration covers both tables while rehashing: ");
        d.expand(1024).unwrap();
        d.rehash(5);
        assert!(d.is_rehashing());
        assert_eq!(d.iter().count(), 100);
        println!("PASS");
    }

    #[test]
    fn unsafe_iterator_misuse_test() {
        print!("[TEST] Unsafe iterator detects an insertion: ");
        let mut d = int_dict(10);
        let mut it = d.get_iterator();
        let first = d.next(&mut it).map(|e| *e.get_key());
        assert!(first.is_some());
        assert_eq!(d.check_iterator(&it), Ok(()));
        d.add(100, 100).unwrap();
        assert!(matches!(
            d.check_iterator(&it),
            Err(HashError::FingerprintMismatch { .. })
        ));
        println!("PASS");
    }

    #[test]
    #[should_panic]
    fn unsafe_iterator_release_panics_test() {
        let mut d = int_dict(10);
        let mut it = d.get_iterator();
        d.next(&mut it);
        d.delete(&3).unwrap();
        d.release_iterator(it);
    }

    #[test]
    fn safe_iterator_delete_test() {
        print!("[TEST] Delete every returned entry through a safe iterator: ");
        let mut d = int_dict(100);
        d.expand(512).unwrap();
        d.rehash(3);
        assert!(d.is_rehashing());
        let rehash_idx = d.rehash_idx();

        let mut it = d.get_safe_iterator();
        let mut seen = Vec::new();
        loop {
            let key = match d.next(&mut it) {
                Some(entry) => *entry.get_key(),
                None => break,
            };
            seen.push(key);
            d.delete(&key).unwrap();
            assert_eq!(d.rehash_idx(), rehash_idx);
        }
        d.release_iterator(it);

        seen.sort();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
        assert_eq!(d.dict_size(), 0);
        println!("PASS");
    }

    #[test]
    fn safe_iterator_delete_ahead_test() {
        print!("[TEST] Deleting the entry after the returned one keeps the chain: ");
        let mut d: Dict<i64, i64> = Dict::new();
        d.disable_resize();
        for j in 0..16 {
            d.add(j, j).unwrap();
        }
        assert_eq!(d.dict_slots(), 4);

        let mut it = d.get_safe_iterator();
        let mut seen = HashSet::new();
        let mut deleted = HashSet::new();
        loop {
            let (key, next) = match d.next(&mut it) {
                Some(entry) => (*entry.get_key(), entry.next_entry().map(|n| *n.get_key())),
                None => break,
            };
            assert!(seen.insert(key));
            if let Some(next) = next {
                if !seen.contains(&next) && deleted.insert(next) {
                    d.delete(&next).unwrap();
                }
            }
        }
        d.release_iterator(it);

        assert!(!deleted.is_empty());
        assert!(seen.is_disjoint(&deleted));
        assert_eq!(seen.len() + deleted.len(), 16);
        println!("PASS");
    }

    #[test]
    fn safe_iterator_across_empty_test() {
        print!("[TEST] Releasing a safe iterator after empty: ");
        let mut d = int_dict(100);
        let mut it = d.get_safe_iterator();
        assert!(d.next(&mut it).is_some());
        d.empty(None);
        assert!(d.next(&mut it).is_none());
        d.release_iterator(it);
        assert_eq!(d.iterators, 0);

        // lookups drive the migration again once no iterator is open
        for j in 0..100 {
            d.add(j, j).unwrap();
        }
        drain(&mut d);
        d.expand(1024).unwrap();
        for _ in 0..1000 {
            let _ = d.find(&0);
        }
        assert!(!d.is_rehashing());
        assert_eq!(d.dict_slots(), 1024);
        println!("PASS");
    }

    fn full_scan<P>(d: &mut Dict<i64, i64, P>, mut between: impl FnMut(&mut Dict<i64, i64, P>, usize)) -> HashMap<i64, usize> {
        let mut seen = HashMap::new();
        let mut cursor = 0;
        let mut calls = 0;
        loop {
            cursor = d.scan(cursor, |entry| {
                *seen.entry(*entry.get_key()).or_insert(0) += 1;
            });
            calls += 1;
            if cursor == 0 {
                break;
            }
            between(d, calls);
        }
        seen
    }

    #[test]
    fn scan_test() {
        print!("[TEST] Scan on an empty dict: ");
        let empty: Dict<i64, i64> = Dict::new();
        assert_eq!(empty.scan(0, |_| panic!("no entries")), 0);
        println!("PASS");

        print!("[TEST] Scan a stable table: ");
        let mut d = int_dict(200);
        let seen = full_scan(&mut d, |_, _| {});
        assert_eq!(seen.len(), 200);
        assert!(seen.values().all(|&n| n == 1));
        println!("PASS");

        print!("[TEST] Scan across a growth: ");
        let seen = full_scan(&mut d, |d, calls| {
            if calls == 3 {
                d.expand(4096).unwrap();
            } else {
                d.rehash(1);
            }
        });
        assert_eq!(seen.len(), 200);
        println!("PASS");

        print!("[TEST] Scan across a shrink: ");
        drain(&mut d);
        for j in 0..150 {
            d.delete(&j).unwrap();
        }
        let seen = full_scan(&mut d, |d, calls| {
            if calls == 5 {
                d.resize().unwrap();
            } else {
                d.rehash(1);
            }
        });
        assert_eq!(seen.len(), 50);
        assert!((150..200).all(|j| seen.contains_key(&j)));
        println!("PASS");
    }

    #[test]
    fn scan_buckets_test() {
        print!("[TEST] Bucket callback runs before the entries of its bucket: ");
        let mut d = int_dict(300);
        d.expand(2048).unwrap();
        d.rehash(10);
        assert!(d.is_rehashing());

        let mut buckets = 0;
        let mut seen = HashMap::new();
        let mut cursor = 0;
        loop {
            cursor = d.scan_buckets(
                cursor,
                |entry| {
                    assert_eq!(entry.get_signed_integer_val(), Some(-*entry.get_key()));
                    *seen.entry(*entry.get_key()).or_insert(0) += 1;
                },
                |bucket| {
                    buckets += 1;
                    let mut he = bucket.as_deref_mut();
                    while let Some(entry) = he {
                        let key = *entry.get_key();
                        entry.set_signed_integer_val(-key);
                        he = entry.next.as_deref_mut();
                    }
                },
            );
            if cursor == 0 {
                break;
            }
        }
        assert_eq!(seen.len(), 300);
        assert!(buckets >= d.ht[0].size().min(d.ht[1].size()));
        assert_eq!(d.fetch_value(&7), Some(&DictValue::Signed(-7)));
        println!("PASS");

        print!("[TEST] Bucket scan on an empty dict: ");
        let mut empty: Dict<i64, i64> = Dict::new();
        assert_eq!(empty.scan_buckets(0, |_| panic!("no entries"), |_| panic!("no buckets")), 0);
        println!("PASS");
    }

    #[test]
    fn random_keys_test() {
        print!("[TEST] Random key on empty and single entry dicts: ");
        let mut d: Dict<i64, i64> = Dict::new();
        assert!(d.get_random_key().is_none());
        assert!(d.get_fair_random_key().is_none());
        assert!(d.get_some_keys(5).is_empty());
        d.add(42, 1).unwrap();
        assert_eq!(d.get_random_key().map(|e| *e.get_key()), Some(42));
        assert_eq!(d.get_fair_random_key().map(|e| *e.get_key()), Some(42));
        println!("PASS");

        print!("[TEST] Random keys while rehashing: ");
        let mut d = int_dict(500);
        d.expand(4096).unwrap();
        for _ in 0..1000 {
            let key = *d.get_random_key().unwrap().get_key();
            assert!((0..500).contains(&key));
        }
        println!("PASS");

        print!("[TEST] Some keys are distinct: ");
        let mut d = int_dict(500);
        d.expand(2048).unwrap();
        for _ in 0..100 {
            let keys: Vec<i64> = d.get_some_keys(20).iter().map(|e| *e.get_key()).collect();
            assert!(keys.len() <= 20);
            let unique: HashSet<_> = keys.iter().collect();
            assert_eq!(unique.len(), keys.len());
        }
        let all = d.get_some_keys(1000).len();
        assert!(all <= 500);
        println!("PASS");

        print!("[TEST] Some keys are distinct on a sparse table: ");
        let mut d = int_dict(40);
        d.expand(16384).unwrap();
        drain(&mut d);
        for _ in 0..2000 {
            let keys: Vec<i64> = d.get_some_keys(20).iter().map(|e| *e.get_key()).collect();
            let unique: HashSet<_> = keys.iter().collect();
            assert_eq!(unique.len(), keys.len());
        }
        println!("PASS");
    }

    fn fair_draws<P>(d: &mut Dict<i64, i64, P>, keys: usize, draws: usize) -> HashMap<i64, usize> {
        let mut counts = HashMap::new();
        for _ in 0..draws {
            let key = *d.get_fair_random_key().unwrap().get_key();
            *counts.entry(key).or_insert(0usize) += 1;
        }
        assert_eq!(counts.len(), keys);
        counts
    }

    #[test]
    fn fair_random_key_test() {
        print!("[TEST] Fair random key frequency, keys much more than the sample: ");
        let keys = 200;
        let draws = 200_000;
        let mut d = int_dict(keys as i64);
        assert!(keys > d.config().fair_sample_size * 10);
        let expected = draws / keys;
        for (key, n) in fair_draws(&mut d, keys, draws) {
            assert!(
                n > expected * 8 / 10 && n < expected * 12 / 10,
                "key {} drawn {} times, expected {}",
                key,
                n,
                expected
            );
        }
        println!("PASS");

        print!("[TEST] Fair random key frequency on a sparse table: ");
        let mut d = int_dict(keys as i64);
        d.expand(4096).unwrap();
        drain(&mut d);
        for (key, n) in fair_draws(&mut d, keys, draws) {
            assert!(
                n > expected * 8 / 10 && n < expected * 12 / 10,
                "key {} drawn {} times, expected {}",
                key,
                n,
                expected
            );
        }
        println!("PASS");
    }

    #[test]
    fn find_by_ptr_test() {
        print!("[TEST] Find an entry by key address: ");
        let mut d: Dict<String, i64> = Dict::new();
        for j in 0..50 {
            d.add(format!("k{}", j), j).unwrap();
        }
        let key = "k7".to_string();
        let hash = d.get_hash(&key);
        let ptr = d.find(&key).map(|e| e.get_key() as *const String).unwrap();
        let found = d.find_entry_ref_by_ptr_and_hash(ptr, hash).map(|e| e.get_key().clone());
        assert_eq!(found, Some(key.clone()));
        assert!(d.find_entry_ref_by_ptr_and_hash(&key as *const String, hash).is_none());
        println!("PASS");
    }

    #[test]
    fn stats_test() {
        print!("[TEST] Stats report: ");
        let d: Dict<i64, i64> = Dict::new();
        assert!(d.get_stats().contains("No stats available"));

        let mut d = int_dict(5);
        let stats = d.stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].ht_used, 5);
        assert_eq!(stats[0].ht_size, 8);
        assert_eq!(stats[0].cl_vector.len(), DICT_STATS_VECTLEN);
        assert_eq!(stats[0].cl_vector.iter().sum::<usize>(), 8);
        assert!(d.mem_usage() >= 5 * std::mem::size_of::<i64>() * 2);
        let report = d.get_stats();
        assert!(report.contains("Hash table 0 stats (main hash table):"));
        assert!(report.contains(" number of elements: 5"));

        d.expand(64).unwrap();
        d.rehash(1);
        if d.is_rehashing() {
            assert_eq!(d.stats().len(), 2);
            assert!(d.get_stats().contains("Hash table 1 stats (rehashing target):"));
        }
        println!("PASS");
    }

    #[test]
    fn shared_resize_gate_test() {
        print!("[TEST] Dicts sharing a resize gate: ");
        let a: Dict<i64, i64> = Dict::new();
        let b: Dict<i64, i64> = Dict::with_resize_gate(
            Arc::new(DictType::default()),
            (),
            DictConfig::default(),
            a.resize_gate().clone(),
        );
        a.disable_resize();
        assert!(!b.resize_gate().is_enabled());
        b.enable_resize();
        assert!(a.resize_gate().is_enabled());
        println!("PASS");

        print!("[TEST] Config disables resizing: ");
        let config = DictConfig {
            resize_enabled: false,
            ..DictConfig::default()
        };
        let mut c: Dict<i64, i64> = Dict::with_config(Arc::new(DictType::default()), (), config);
        c.add(1, 1).unwrap();
        assert_eq!(c.resize(), Err(HashError::ResizeForbidden));
        println!("PASS");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, u32),
        Replace(u8, u32),
        Delete(u8),
        Find(u8),
        Rehash(usize),
        Resize,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Add(k, v)),
            (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Replace(k, v)),
            any::<u8>().prop_map(Op::Delete),
            any::<u8>().prop_map(Op::Find),
            (1usize..8).prop_map(Op::Rehash),
            Just(Op::Resize),
        ]
    }

    proptest! {
        #[test]
        fn behaves_like_hash_map(ops in prop::collection::vec(op_strategy(), 1..400)) {
            let mut d: Dict<u8, u32> = Dict::new();
            let mut model = HashMap::new();
            for op in ops {
                match op {
                    Op::Add(k, v) => {
                        let res = d.add(k, v);
                        if model.contains_key(&k) {
                            prop_assert_eq!(res, Err(HashError::DictEntryDup));
                        } else {
                            prop_assert!(res.is_ok());
                            model.insert(k, v);
                        }
                    }
                    Op::Replace(k, v) => {
                        prop_assert_eq!(d.replace(k, v), model.insert(k, v).is_none());
                    }
                    Op::Delete(k) => {
                        prop_assert_eq!(d.delete(&k).is_ok(), model.remove(&k).is_some());
                    }
                    Op::Find(k) => {
                        let found = d.fetch_value(&k).and_then(|v| v.as_val().copied());
                        prop_assert_eq!(found, model.get(&k).copied());
                    }
                    Op::Rehash(n) => {
                        d.rehash(n);
                    }
                    Op::Resize => {
                        let _ = d.resize();
                    }
                }
                prop_assert_eq!(d.dict_size(), model.len());
                prop_assert!(d.ht[0].size() == 0 || d.ht[0].size().is_power_of_two());
            }
            let mut keys: Vec<u8> = d.iter().map(|e| *e.get_key()).collect();
            keys.sort();
            let mut expected: Vec<u8> = model.keys().copied().collect();
            expected.sort();
            prop_assert_eq!(keys, expected);
        }
    }
}
