//! Wire types of the x402 proof protocol.

mod common;
mod proof;

pub use common::*;
pub use proof::*;
