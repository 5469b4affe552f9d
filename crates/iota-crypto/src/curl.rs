//! The Curl sponge.
//!
//! 729-trit state permuted by a two-trit S-box; absorbs and squeezes in
//! 243-trit blocks. The production round count is 81; the 27-round variant
//! is used by the MAC stamper.

use crate::{CryptoError, Sponge};
use iota_types::constants::HASH_TRITS;

/// State width in trits (three hash lengths).
pub const STATE_TRITS: usize = 3 * HASH_TRITS;

/// S-box lookup, indexed by `a + 4b + 5` for trits `a`, `b`.
const TRUTH_TABLE: [i8; 11] = [1, 0, -1, 2, 1, -1, 0, 2, -1, 0, 1];

/// Pure-ternary sponge with a configurable round count.
#[derive(Clone)]
pub struct Curl {
    state: [i8; STATE_TRITS],
    rounds: usize,
}

impl Curl {
    /// The standard 81-round variant.
    pub fn p81() -> Self {
        Curl::with_rounds(81)
    }

    /// The reduced 27-round variant used for MAC stamping.
    pub fn p27() -> Self {
        Curl::with_rounds(27)
    }

    pub fn with_rounds(rounds: usize) -> Self {
        Curl {
            state: [0; STATE_TRITS],
            rounds,
        }
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    fn transform(&mut self) {
        let mut scratch = [0i8; STATE_TRITS];
        for _ in 0..self.rounds {
            scratch.copy_from_slice(&self.state);
            let mut index = 0usize;
            for trit in self.state.iter_mut() {
                let a = scratch[index];
                if index < 365 {
                    index += 364;
                } else {
                    index -= 365;
                }
                let b = scratch[index];
                *trit = TRUTH_TABLE[(a + (b << 2) + 5) as usize];
            }
        }
    }
}

impl Sponge for Curl {
    /// Absorb trits in chunks of up to 243, permuting after each chunk.
    fn absorb(&mut self, trits: &[i8]) -> Result<(), CryptoError> {
        if trits.is_empty() {
            return Err(CryptoError::BlockLength(0));
        }
        for chunk in trits.chunks(HASH_TRITS) {
            self.state[..chunk.len()].copy_from_slice(chunk);
            self.transform();
        }
        Ok(())
    }

    fn squeeze_into(&mut self, out: &mut [i8]) -> Result<(), CryptoError> {
        if out.is_empty() {
            return Err(CryptoError::BlockLength(0));
        }
        for chunk in out.chunks_mut(HASH_TRITS) {
            chunk.copy_from_slice(&self.state[..chunk.len()]);
            self.transform();
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.state = [0; STATE_TRITS];
    }
}
