//! The public operations of [`crate::Surety`], one file per component.

mod airlines;
mod escrow;
mod gate;
mod oracles;
