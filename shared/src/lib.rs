pub mod config;
pub mod constants;
pub mod error;
pub mod session;
pub mod settings;
pub mod shared_ambient;
pub mod shared_coin_game;
pub mod shared_playlist;
pub mod shared_wheel_game;
pub mod storage;

pub use config::PageConfig;
pub use error::PageError;
pub use session::{CopySource, Effect, PageEvent, Session};
pub use storage::{KeyValueStore, MemoryStore};
