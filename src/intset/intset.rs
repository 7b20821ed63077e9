use crate::dict::lib::random_ulong;
use crate::intset::error::IntSetError;
use crate::intset::lib::{intset_value_encoding, is_valid_encoding};
use crate::intset::{INTSET_ENC_INT16, INTSET_ENC_INT32, INTSET_ENC_INT64, INTSET_HEADER_SIZE};

/// Sorted set of unique integers packed in the narrowest little-endian
/// encoding (16, 32 or 64 bit) able to hold every member. Adding a value
/// outside the current range upgrades the whole set, it is never downgraded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntSet {
    encoding: u32,
    length: u32,
    contents: Vec<u8>,
}

impl Default for IntSet {
    fn default() -> Self {
        Self::new()
    }
}

impl IntSet {
    pub fn new() -> Self {
        Self {
            encoding: INTSET_ENC_INT16 as u32,
            length: 0,
            contents: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Width in bytes of one member.
    #[inline]
    pub fn encoding(&self) -> u8 {
        self.encoding as u8
    }

    /// Size of the serialized form.
    pub fn blob_len(&self) -> usize {
        INTSET_HEADER_SIZE + self.len() * self.encoding as usize
    }

    fn resize(&mut self, len: u32) {
        self.contents.resize(len as usize * self.encoding as usize, 0);
    }

    fn get_encoded(&self, pos: usize, enc: u8) -> i64 {
        let offset = pos * enc as usize;
        match enc {
            INTSET_ENC_INT64 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&self.contents[offset..offset + 8]);
                i64::from_le_bytes(bytes)
            }
            INTSET_ENC_INT32 => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(&self.contents[offset..offset + 4]);
                i32::from_le_bytes(bytes) as i64
            }
            _ => {
                let mut bytes = [0u8; 2];
                bytes.copy_from_slice(&self.contents[offset..offset + 2]);
                i16::from_le_bytes(bytes) as i64
            }
        }
    }

    #[inline]
    fn value_at(&self, pos: usize) -> i64 {
        self.get_encoded(pos, self.encoding as u8)
    }

    fn set(&mut self, pos: usize, value: i64) {
        let width = self.encoding as usize;
        let offset = pos * width;
        // little endian: the low `width` bytes carry the narrowed value
        let bytes = value.to_le_bytes();
        self.contents[offset..offset + width].copy_from_slice(&bytes[..width]);
    }

    /// Member at `pos` in ascending order.
    pub fn get(&self, pos: usize) -> Option<i64> {
        if pos < self.len() {
            Some(self.value_at(pos))
        } else {
            None
        }
    }

    /// Binary search. `Ok(pos)` when found, otherwise `Err(pos)` with the
    /// position where `value` would be inserted.
    pub fn search(&self, value: i64) -> Result<usize, usize> {
        if self.length == 0 {
            return Err(0);
        }
        // fast paths for values outside the stored range
        if value > self.value_at(self.len() - 1) {
            return Err(self.len());
        }
        if value < self.value_at(0) {
            return Err(0);
        }

        let (mut min, mut max) = (0usize, self.len());
        while min < max {
            let mid = min + (max - min) / 2;
            let cur = self.value_at(mid);
            if value > cur {
                min = mid + 1;
            } else if value < cur {
                max = mid;
            } else {
                return Ok(mid);
            }
        }
        Err(min)
    }

    pub fn find(&self, value: i64) -> bool {
        intset_value_encoding(value) <= self.encoding as u8 && self.search(value).is_ok()
    }

    /// Widens every member to the encoding of `value` and inserts it. The
    /// value is out of the current range so it becomes either the new
    /// minimum or the new maximum.
    fn upgrade_and_add(&mut self, value: i64) {
        let cur_encoding = self.encoding as u8;
        let length = self.len();
        let prepend = usize::from(value < 0);

        self.encoding = intset_value_encoding(value) as u32;
        self.resize(self.length + 1);

        // back to front so no member is overwritten before it was moved
        for i in (0..length).rev() {
            let v = self.get_encoded(i, cur_encoding);
            self.set(i + prepend, v);
        }

        if prepend == 1 {
            self.set(0, value);
        } else {
            self.set(length, value);
        }
        self.length += 1;
    }

    /// Shifts the members from `from` to the end so they start at `to`.
    fn move_tail(&mut self, from: usize, to: usize) {
        let width = self.encoding as usize;
        let bytes = (self.len() - from) * width;
        let src = from * width;
        self.contents.copy_within(src..src + bytes, to * width);
    }

    /// Inserts `value`. Returns false if it was already a member.
    pub fn add(&mut self, value: i64) -> bool {
        if intset_value_encoding(value) > self.encoding as u8 {
            self.upgrade_and_add(value);
            return true;
        }
        let pos = match self.search(value) {
            Ok(_) => return false,
            Err(pos) => pos,
        };
        self.resize(self.length + 1);
        if pos < self.len() {
            self.move_tail(pos, pos + 1);
        }
        self.set(pos, value);
        self.length += 1;
        true
    }

    /// Removes `value`. Returns false if it was not a member.
    pub fn remove(&mut self, value: i64) -> bool {
        if intset_value_encoding(value) > self.encoding as u8 {
            return false;
        }
        let pos = match self.search(value) {
            Ok(pos) => pos,
            Err(_) => return false,
        };
        if pos + 1 < self.len() {
            self.move_tail(pos + 1, pos);
        }
        self.resize(self.length - 1);
        self.length -= 1;
        true
    }

    /// Uniformly drawn member.
    pub fn random(&self) -> Option<i64> {
        if self.length == 0 {
            return None;
        }
        let pos = (random_ulong() % self.length as u64) as usize;
        Some(self.value_at(pos))
    }

    pub fn get_min(&self) -> Option<i64> {
        self.get(0)
    }

    pub fn get_max(&self) -> Option<i64> {
        self.len().checked_sub(1).and_then(|pos| self.get(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len()).map(move |pos| self.value_at(pos))
    }

    /// Serialized form: encoding (u32 LE), length (u32 LE), then the
    /// members in the current encoding.
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.blob_len());
        blob.extend_from_slice(&self.encoding.to_le_bytes());
        blob.extend_from_slice(&self.length.to_le_bytes());
        blob.extend_from_slice(&self.contents);
        blob
    }

    /// Checks the header and size of a serialized set. In `deep` mode the
    /// members are also checked to be strictly ascending.
    pub fn validate_integrity(blob: &[u8], deep: bool) -> Result<(), IntSetError> {
        if blob.len() < INTSET_HEADER_SIZE {
            return Err(IntSetError::TooShort(blob.len()));
        }
        let mut word = [0u8; 4];
        word.copy_from_slice(&blob[0..4]);
        let encoding = u32::from_le_bytes(word);
        if !is_valid_encoding(encoding) {
            return Err(IntSetError::InvalidEncoding(encoding));
        }
        word.copy_from_slice(&blob[4..8]);
        let length = u32::from_le_bytes(word) as usize;
        let expected = INTSET_HEADER_SIZE + length * encoding as usize;
        if expected != blob.len() {
            return Err(IntSetError::LengthMismatch {
                expected,
                actual: blob.len(),
            });
        }
        if length == 0 {
            return Err(IntSetError::Empty);
        }
        if !deep {
            return Ok(());
        }

        let set = IntSet {
            encoding,
            length: length as u32,
            contents: blob[INTSET_HEADER_SIZE..].to_vec(),
        };
        let mut prev = set.value_at(0);
        for pos in 1..length {
            let cur = set.value_at(pos);
            if cur <= prev {
                return Err(IntSetError::Unsorted(pos));
            }
            prev = cur;
        }
        Ok(())
    }

    /// Decodes a blob produced by `to_blob`, validating it deeply first.
    pub fn from_blob(blob: &[u8]) -> Result<IntSet, IntSetError> {
        Self::validate_integrity(blob, true)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&blob[0..4]);
        let encoding = u32::from_le_bytes(word);
        word.copy_from_slice(&blob[4..8]);
        let length = u32::from_le_bytes(word);
        Ok(IntSet {
            encoding,
            length,
            contents: blob[INTSET_HEADER_SIZE..].to_vec(),
        })
    }
}

impl FromIterator<i64> for IntSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut set = IntSet::new();
        for value in iter {
            set.add(value);
        }
        set
    }
}
