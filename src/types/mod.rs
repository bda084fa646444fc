pub mod identifiers;

pub use identifiers::{FunctionName, FunctionVersion, NameError};
