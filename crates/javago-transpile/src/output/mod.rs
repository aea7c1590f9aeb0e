//! Output writers - render lowered files as source code.

#[cfg(feature = "write-go")]
pub mod go;

#[cfg(feature = "write-go")]
pub use go::{GO_WRITER, GoWriter, GoWriterImpl};
