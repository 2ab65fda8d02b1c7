pub mod classifier;
pub mod walker;

pub use classifier::{classify, Classification};
pub use walker::{DirectoryWalker, Entry, EntryKind, Walk, WalkError};
