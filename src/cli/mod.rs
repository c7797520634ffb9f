pub mod commands;
pub mod ui;

pub use commands::generate::{GenerateOptions, OutputFormat};
pub use ui::Output;
