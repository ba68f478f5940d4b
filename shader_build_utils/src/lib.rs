//! Compiles a tree of shader sources with the platform toolchain and links the results into a
//! single shader library.

mod classify;
mod compiler;
mod error;
mod library;
mod target_directory;
mod toolchain;

#[cfg(test)]
mod test_support;

pub use classify::*;
pub use compiler::*;
pub use error::*;
pub use library::*;
pub use target_directory::*;
pub use toolchain::*;
