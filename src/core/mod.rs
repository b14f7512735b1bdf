pub mod identity;
pub mod path_table;

pub use identity::Identity;
pub use path_table::{PathTable, INODE_ROOT};
