pub mod decoder;
pub mod error;
pub mod extractor;
pub mod probe;

pub use decoder::*;
pub use error::*;
pub use extractor::*;
pub use probe::*;
