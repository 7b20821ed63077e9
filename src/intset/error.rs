#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IntSetError {
    #[error("[IntSet]Blob Too Short: {0} bytes")]
    TooShort(usize),
    #[error("[IntSet]Invalid Encoding: {0}")]
    InvalidEncoding(u32),
    #[error("[IntSet]Length Mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("[IntSet]Empty Set")]
    Empty,
    #[error("[IntSet]Not Sorted At Position {0}")]
    Unsorted(usize),
}
