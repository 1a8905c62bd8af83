use rand::{rngs::OsRng, RngCore};

/// Fresh 32 bytes of OS randomness for seeding index assignment.
pub fn generate_entropy() -> [u8; 32] {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    seed
}
