pub mod defaults;
pub mod diagram;
pub mod error;
pub mod generate;
pub mod graph;
pub mod io;
pub mod manifest;
pub mod namespace;
pub mod paths;
pub mod sync;
pub mod types;
pub mod validate;

pub use error::{MethodError, Result};
