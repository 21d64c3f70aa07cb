pub mod dates;
pub mod labels;
pub mod normalizer;
pub mod values;

pub use dates::*;
pub use labels::*;
pub use normalizer::*;
pub use values::*;
