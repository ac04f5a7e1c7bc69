//! Library surface of the `freeze` command

pub mod report;
pub mod settings;
pub mod util;
