#[macro_use]
mod macros;
mod parse;
pub use parse::{parse, Item};

mod config;
pub use config::{Config, Error, DEFAULT_SECTION};
