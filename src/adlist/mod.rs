pub mod adlist;

pub use adlist::{Direction, List, ListIter, Node};
