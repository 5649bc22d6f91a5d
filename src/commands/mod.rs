//! Command implementations

pub mod generate;
pub mod serve;

pub use generate::execute as generate;
pub use serve::execute as serve;
