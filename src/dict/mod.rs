mod test;
pub mod dict;
pub mod dict_type;
pub mod error;
pub mod hash;
pub mod iter;
pub mod lib;
pub mod random;
pub mod scan;
pub mod stats;

pub use dict::{Bucket, Dict, DictEntry, DictValue};
pub use dict_type::DictType;
pub use error::HashError;
pub use iter::DictIterator;
pub use lib::{DictResizeFlag, ResizeGate};
