//! Forward error correction support
//!
//! Only the bit interleaver lives here; the block code it feeds is external.

pub mod interleave;

pub use interleave::{deinterleave, interleave, BlockLength};
