pub mod airlines;
pub mod escrow;
pub mod gate;
pub mod oracles;
pub mod state;
