pub mod file;
pub mod kv;
pub mod shows;

pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use shows::{SHOWS_KEY, ShowRepository};
