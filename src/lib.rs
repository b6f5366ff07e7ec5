pub mod cli_interface;
pub mod device;
mod fs;
pub mod mkfs;
pub mod mount;
pub mod ops;
pub mod utils;
pub use fs::*;
