use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed pseudo-random key tables for position hashing.
///
/// The keys are generated from a fixed seed so the scheme is reproducible
/// bit-for-bit: opening book files built with the same convention stay
/// compatible across runs and builds.
pub struct Zobrist {
    pub piece_keys: [[[u64; 64]; 7]; 2], // [color][piece][square]
    pub castle_keys: [u64; 16],          // one key per castling-rights state
    pub ep_keys: [u64; 8],               // en-passant file
    pub side_key: u64,                   // black to move
}

const KEY_SEED: u64 = 0x1C55_01D5;

impl Zobrist {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(KEY_SEED);

        let mut piece_keys = [[[0u64; 64]; 7]; 2];
        for color in piece_keys.iter_mut() {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let mut castle_keys = [0u64; 16];
        for key in castle_keys.iter_mut() {
            *key = rng.gen();
        }

        let mut ep_keys = [0u64; 8];
        for key in ep_keys.iter_mut() {
            *key = rng.gen();
        }

        Zobrist {
            piece_keys,
            castle_keys,
            ep_keys,
            side_key: rng.gen(),
        }
    }
}

lazy_static::lazy_static! {
    pub static ref ZOBRIST: Zobrist = Zobrist::new();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_reproducible() {
        let a = Zobrist::new();
        assert_eq!(a.piece_keys[0][1][0], ZOBRIST.piece_keys[0][1][0]);
        assert_eq!(a.side_key, ZOBRIST.side_key);
        assert_eq!(a.castle_keys, ZOBRIST.castle_keys);
    }

    #[test]
    fn test_keys_distinct() {
        assert_ne!(ZOBRIST.piece_keys[0][1][0], ZOBRIST.piece_keys[1][1][0]);
        assert_ne!(ZOBRIST.ep_keys[0], ZOBRIST.ep_keys[7]);
    }
}
