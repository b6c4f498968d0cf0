//! Tools module

pub mod completion;
pub mod dtos;
pub mod options;

pub use completion::*;
pub use dtos::*;
pub use options::*;
