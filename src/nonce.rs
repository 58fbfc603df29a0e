//! Nonce formatting and the Ktop/stretch/bottom derivation (RFC 7253 §4.2).

use aes::block_cipher_trait::BlockCipher;
use aead::generic_array::typenum::U16;
use zeroize::Zeroize;

use crate::error::Error;
use crate::util::Block;

/// Caches the formatted nonce (`N'`) whose Ktop was last computed, together
/// with the resulting 24-byte `stretch`. A hit saves one block-cipher call
/// whenever successive nonces only change in their low 6 bits.
pub(crate) struct NonceCache {
    ktop_input: Option<Block>,
    stretch: [u8; 24],
}

impl NonceCache {
    pub(crate) fn new() -> Self {
        Self {
            ktop_input: None,
            stretch: [0u8; 24],
        }
    }

    /// Derives `Offset_0` from `nonce` and `tag_len` (bytes), using `cipher`
    /// in the forward direction for Ktop when the cache misses.
    pub(crate) fn derive_offset0<C>(
        &mut self,
        cipher: &C,
        nonce: &[u8],
        tag_len: usize,
    ) -> Result<Block, Error>
    where
        C: BlockCipher<BlockSize = U16>,
    {
        if nonce.is_empty() || nonce.len() >= 16 {
            return Err(Error::InvalidNonce);
        }
        let len = nonce.len();

        let mut n_prime = Block::default();
        n_prime[16 - len..].copy_from_slice(nonce);
        n_prime[0] = (((tag_len * 8) << 4) & 0xFF) as u8;
        n_prime[15 - len] |= 0x01;

        let bottom = (n_prime[15] & 0x3F) as usize;
        n_prime[15] &= 0xC0;

        if self.ktop_input.as_ref() != Some(&n_prime) {
            let mut ktop = n_prime;
            cipher.encrypt_block(&mut ktop);
            self.stretch[..16].copy_from_slice(ktop.as_slice());
            for i in 0..8 {
                self.stretch[16 + i] = ktop[i] ^ ktop[i + 1];
            }
            self.ktop_input = Some(n_prime);
        }

        Ok(self.shift_stretch(bottom))
    }

    fn shift_stretch(&self, bottom: usize) -> Block {
        let byte_shift = bottom / 8;
        let bit_shift = bottom % 8;
        let mut offset = Block::default();
        if bit_shift == 0 {
            offset.copy_from_slice(&self.stretch[byte_shift..byte_shift + 16]);
        } else {
            for i in 0..16 {
                offset[i] = ((self.stretch[byte_shift + i] << bit_shift)
                    | (self.stretch[byte_shift + i + 1] >> (8 - bit_shift)))
                    & 0xFF;
            }
        }
        offset
    }

    pub(crate) fn zeroize(&mut self) {
        if let Some(ktop_input) = self.ktop_input.as_mut() {
            ktop_input.as_mut_slice().zeroize();
        }
        self.stretch.zeroize();
    }
}
