pub mod config;
pub mod media_type;
pub mod session;

#[cfg(test)]
mod config_test;

pub use config::*;
pub use media_type::*;
pub use session::*;
