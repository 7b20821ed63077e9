use std::fmt::Debug;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("[Dict]Dict Key Has Exist")]
    DictEntryDup,
    #[error("[Dict]Key Is Not Exist")]
    DictNoKey,
    #[error("[Dict]Expand Error: {0}!")]
    ExpandErr(String),
    #[error("[Dict]Dict Is Rehashing")]
    IsRehashing,
    #[error("[Dict]Resize Is Disabled")]
    ResizeForbidden,
    #[error("[Dict]Unsafe iterator fingerprint mismatch: {expected:#x} != {actual:#x}")]
    FingerprintMismatch { expected: u64, actual: u64 },
}
