pub mod config_io;
pub mod lock;
pub mod store_io;
pub mod watcher;
pub mod workspace;
