mod commands;
mod util;

pub use commands::{handle_fetch, handle_files, handle_verify};
