//! stroketype
pub mod compiler;
pub mod core;
pub mod font_source;
pub mod logging;
#[cfg(test)]
mod tests;
