//! The Kerl sponge: Keccak-384 over 243-trit blocks.
//!
//! Each block crosses into the byte domain through the 48-byte balanced
//! ternary bridge, with trit 242 pinned to zero on both sides. Squeezing
//! chains: after reading a digest the sponge is re-initialized with the
//! bitwise complement of the bytes just produced, so repeated squeezes
//! yield distinct, deterministic blocks.

use crate::{CryptoError, Sponge};
use iota_types::constants::{HASH_TRITS, KERL_BYTES};
use iota_types::ternary::{bytes_to_trits, trits_to_bytes};
use tiny_keccak::{Hasher, Keccak};

#[derive(Clone)]
pub struct Kerl {
    keccak: Keccak,
}

impl Kerl {
    pub fn new() -> Self {
        Kerl {
            keccak: Keccak::v384(),
        }
    }

    /// One-shot convenience: absorb `trits` into a fresh sponge and squeeze
    /// a single 243-trit block.
    pub fn hash(trits: &[i8]) -> Result<Vec<i8>, CryptoError> {
        let mut kerl = Kerl::new();
        kerl.absorb(trits)?;
        kerl.squeeze(HASH_TRITS)
    }
}

impl Default for Kerl {
    fn default() -> Self {
        Kerl::new()
    }
}

impl Sponge for Kerl {
    /// Absorb trits; the length must be a positive multiple of 243.
    fn absorb(&mut self, trits: &[i8]) -> Result<(), CryptoError> {
        if trits.is_empty() || trits.len() % HASH_TRITS != 0 {
            return Err(CryptoError::BlockLength(trits.len()));
        }
        for chunk in trits.chunks_exact(HASH_TRITS) {
            let mut block = [0i8; HASH_TRITS];
            block.copy_from_slice(chunk);
            block[HASH_TRITS - 1] = 0;
            let bytes = trits_to_bytes(&block)?;
            self.keccak.update(&bytes);
        }
        Ok(())
    }

    fn squeeze_into(&mut self, out: &mut [i8]) -> Result<(), CryptoError> {
        if out.is_empty() || out.len() % HASH_TRITS != 0 {
            return Err(CryptoError::BlockLength(out.len()));
        }
        for chunk in out.chunks_exact_mut(HASH_TRITS) {
            let mut digest = [0u8; KERL_BYTES];
            self.keccak.clone().finalize(&mut digest);
            chunk.copy_from_slice(&bytes_to_trits(&digest)?);

            // Chain the sponge on the complemented digest.
            for byte in digest.iter_mut() {
                *byte ^= 0xFF;
            }
            self.keccak = Keccak::v384();
            self.keccak.update(&digest);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.keccak = Keccak::v384();
    }
}
