mod command;
mod runner;
mod util;

pub use command::Command;
pub use runner::{OutputMode, run, seed_store};
pub use util::{parse_method, parse_seed_spec};
