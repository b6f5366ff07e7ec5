//! command line arguments of the `flatfs` binary
mod cli_struct;
pub use cli_struct::*;
