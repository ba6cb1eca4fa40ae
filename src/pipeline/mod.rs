//! Byte transforms applied to the repository archive.
//!
//! Embed order is encrypt then compress; extract runs the exact inverse.

pub mod cipher;
pub mod compress;

pub use cipher::{decrypt, encrypt};
pub use compress::{compress, decompress};
