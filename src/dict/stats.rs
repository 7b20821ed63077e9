use std::fmt::{Display, Formatter};

use crate::dict::dict::{Dict, DictTable};
use crate::dict::lib::DICT_STATS_VECTLEN;

/// Chain length statistics of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct DictStats {
    pub ht_idx: usize,
    /// non-empty buckets
    pub buckets: usize,
    pub max_chain_len: usize,
    pub total_chain_len: usize,
    pub ht_size: usize,
    pub ht_used: usize,
    /// number of buckets per chain length, the last slot counts every
    /// chain at least that long
    pub cl_vector: [usize; DICT_STATS_VECTLEN],
}

impl DictStats {
    fn from_table<K, V>(ht_idx: usize, t: &DictTable<K, V>) -> Self {
        let mut stats = DictStats {
            ht_idx,
            buckets: 0,
            max_chain_len: 0,
            total_chain_len: 0,
            ht_size: t.size(),
            ht_used: t.used,
            cl_vector: [0; DICT_STATS_VECTLEN],
        };
        if t.used == 0 {
            return stats;
        }
        for bucket in &t.table {
            let mut chain_len = 0;
            let mut he = bucket.as_deref();
            while let Some(entry) = he {
                chain_len += 1;
                he = entry.next.as_deref();
            }
            if chain_len == 0 {
                stats.cl_vector[0] += 1;
                continue;
            }
            stats.buckets += 1;
            stats.cl_vector[chain_len.min(DICT_STATS_VECTLEN - 1)] += 1;
            stats.max_chain_len = stats.max_chain_len.max(chain_len);
            stats.total_chain_len += chain_len;
        }
        stats
    }

    fn table_type(&self) -> &'static str {
        if self.ht_idx == 0 {
            "main hash table"
        } else {
            "rehashing target"
        }
    }
}

impl Display for DictStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.ht_used == 0 {
            return writeln!(f, "No stats available for empty dictionaries");
        }
        writeln!(f, "Hash table {} stats ({}):", self.ht_idx, self.table_type())?;
        writeln!(f, " table size: {}", self.ht_size)?;
        writeln!(f, " number of elements: {}", self.ht_used)?;
        writeln!(f, " different slots: {}", self.buckets)?;
        writeln!(f, " max chain length: {}", self.max_chain_len)?;
        writeln!(
            f,
            " avg chain length (counted): {:.2}",
            self.total_chain_len as f64 / self.buckets as f64
        )?;
        writeln!(
            f,
            " avg chain length (computed): {:.2}",
            self.ht_used as f64 / self.buckets as f64
        )?;
        writeln!(f, " Chain length distribution:")?;
        for (i, &n) in self.cl_vector.iter().enumerate() {
            if n == 0 {
                continue;
            }
            let at_least = if i == DICT_STATS_VECTLEN - 1 { ">= " } else { "" };
            writeln!(
                f,
                "   {}{}: {} ({:.2}%)",
                at_least,
                i,
                n,
                n as f64 / self.ht_size as f64 * 100.0
            )?;
        }
        Ok(())
    }
}

impl<K, V, P> Dict<K, V, P> {
    pub fn stats(&self) -> Vec<DictStats> {
        let mut stats = vec![DictStats::from_table(0, &self.ht[0])];
        if self.is_rehashing() {
            stats.push(DictStats::from_table(1, &self.ht[1]));
        }
        stats
    }

    /// Human readable chain length report of both generations.
    pub fn get_stats(&self) -> String {
        self.stats().iter().map(|s| s.to_string()).collect()
    }
}
