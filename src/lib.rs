//! [OCB3][1] ([RFC 7253][2]): an [Authenticated Encryption with Associated
//! Data (AEAD)][3] mode of operation for 128-bit block ciphers.
//!
//! OCB turns a keyed block-cipher permutation into a single-pass AEAD:
//! confidentiality for the plaintext, authenticity for both plaintext and
//! associated data, a single tag appended to (or verified against) the
//! ciphertext.
//!
//! This crate exposes two layers:
//!
//! - [`Ocb3`], a one-shot [`aead::Aead`]/[`aead::AeadInPlace`] wrapper for
//!   a 15-byte nonce and a 16-byte tag, the common case.
//! - [`session::Ocb3Core`], the underlying streaming session, for callers
//!   (chunked framing layers, packet formats) that need non-default tag
//!   lengths, incremental feeding, or session reuse via `reset`.
//!
//! # ⚠️ Security Warning
//!
//! OCB is **not** nonce-misuse resistant: reusing a nonce under a fixed key
//! is catastrophic for both confidentiality and authenticity. Callers are
//! responsible for nonce uniqueness; this crate does not attempt recovery
//! from nonce reuse and will not detect it.
//!
//! [1]: https://en.wikipedia.org/wiki/OCB_mode
//! [2]: https://tools.ietf.org/html/rfc7253
//! [3]: https://en.wikipedia.org/wiki/Authenticated_encryption

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub use aead;

mod error;
mod gf;
mod nonce;
pub mod session;
mod util;

pub use error::Error;
pub use session::{Direction, Ocb3Core};

use aead::generic_array::{
    typenum::{U0, U15, U16},
    GenericArray,
};
use aead::{Aead, AeadInPlace, Error as AeadError, NewAead};
use aes::block_cipher_trait::BlockCipher;
use aes::{Aes128, Aes192, Aes256};
use alloc::vec::Vec;

/// OCB3 over AES-128.
pub type Aes128Ocb = Ocb3<Aes128>;
/// OCB3 over AES-192.
pub type Aes192Ocb = Ocb3<Aes192>;
/// OCB3 over AES-256.
pub type Aes256Ocb = Ocb3<Aes256>;

/// The tag length the `aead`-trait wrapper uses: 16 bytes / 128 bits.
///
/// Callers who need a different tag length drive [`Ocb3Core`] directly.
const DEFAULT_TAG_LEN_BITS: usize = 128;
const DEFAULT_TAG_LEN: usize = DEFAULT_TAG_LEN_BITS / 8;

/// OCB3: an AEAD mode of operation over any 16-byte-block permutation `C`.
///
/// Holds only the key; each `encrypt`/`decrypt` call builds a transient
/// [`Ocb3Core`], runs it through one `init`/`feed_aad`/`feed_message`/
/// `finalize` cycle, and discards it — the same lifecycle `aes-gcm-siv`'s
/// `Cipher` follows for its one-shot operations.
///
/// Accepts nonces of up to 15 bytes (OCB's maximum) and always produces a
/// 16-byte tag.
#[derive(Clone)]
pub struct Ocb3<C: BlockCipher<BlockSize = U16>> {
    key: GenericArray<u8, C::KeySize>,
}

impl<C> NewAead for Ocb3<C>
where
    C: BlockCipher<BlockSize = U16>,
{
    type KeySize = C::KeySize;

    fn new(key: GenericArray<u8, C::KeySize>) -> Self {
        Self { key }
    }
}

impl<C> Ocb3<C>
where
    C: BlockCipher<BlockSize = U16>,
{
    fn core(&self) -> Ocb3Core<C> {
        Ocb3Core::new(C::new(&self.key))
    }
}

impl<C> AeadInPlace for Ocb3<C>
where
    C: BlockCipher<BlockSize = U16>,
{
    type NonceSize = U15;
    type TagSize = U16;
    type CiphertextOverhead = U0;

    fn encrypt_in_place_detached(
        &self,
        nonce: &GenericArray<u8, Self::NonceSize>,
        associated_data: &[u8],
        buffer: &mut [u8],
    ) -> Result<GenericArray<u8, Self::TagSize>, AeadError> {
        let mut session = self.core();
        session
            .init(
                Direction::Encrypt,
                nonce.as_slice(),
                DEFAULT_TAG_LEN_BITS,
                associated_data,
            )
            .map_err(Error::into)?;

        let plaintext: Vec<u8> = buffer.to_vec();
        let full_len = session.update_output_size(plaintext.len());
        let written = session
            .feed_message(&plaintext, &mut buffer[..full_len])
            .map_err(Error::into)?;
        debug_assert_eq!(written, full_len);

        let remainder = plaintext.len() - full_len;
        let mut tail = [0u8; 15 + 16];
        session
            .finalize(&mut tail[..remainder + DEFAULT_TAG_LEN])
            .map_err(Error::into)?;

        buffer[full_len..].copy_from_slice(&tail[..remainder]);
        Ok(GenericArray::clone_from_slice(
            &tail[remainder..remainder + DEFAULT_TAG_LEN],
        ))
    }

    fn decrypt_in_place_detached(
        &self,
        nonce: &GenericArray<u8, Self::NonceSize>,
        associated_data: &[u8],
        buffer: &mut [u8],
        tag: &GenericArray<u8, Self::TagSize>,
    ) -> Result<(), AeadError> {
        let mut session = self.core();
        session
            .init(
                Direction::Decrypt,
                nonce.as_slice(),
                DEFAULT_TAG_LEN_BITS,
                associated_data,
            )
            .map_err(Error::into)?;

        let mut input: Vec<u8> = buffer.to_vec();
        input.extend_from_slice(tag.as_slice());

        let full_len = session.update_output_size(input.len());
        let written = session
            .feed_message(&input, &mut buffer[..full_len])
            .map_err(Error::into)?;
        debug_assert_eq!(written, full_len);

        let remainder = buffer.len() - full_len;
        let mut tail = [0u8; 15];
        session
            .finalize(&mut tail[..remainder])
            .map_err(Error::into)?;
        buffer[full_len..].copy_from_slice(&tail[..remainder]);

        Ok(())
    }
}

impl<C> Aead for Ocb3<C> where C: BlockCipher<BlockSize = U16> {}

#[cfg(test)]
mod tests {
    use super::*;
    use aead::Payload;
    use hex_literal::hex;

    #[test]
    fn rfc7253_vector_1_empty_aad_and_plaintext() {
        let key = hex!("000102030405060708090A0B0C0D0E0F");
        let nonce = hex!("BBAA99887766554433221100");
        let expected_tag = hex!("785407BFFFC8AD9EDCC5520AC9111EE6");

        let cipher = Aes128Ocb::new(*GenericArray::from_slice(&key));
        let nonce = GenericArray::from_slice(&nonce);
        let ciphertext = cipher
            .encrypt(nonce, Payload { msg: &[], aad: &[] })
            .unwrap();
        assert_eq!(ciphertext, expected_tag);

        let recovered = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &ciphertext,
                    aad: &[],
                },
            )
            .unwrap();
        assert!(recovered.is_empty());
    }

    #[test]
    fn rfc7253_vector_2_eight_byte_message() {
        let key = hex!("000102030405060708090A0B0C0D0E0F");
        let nonce = hex!("BBAA99887766554433221101");
        let data = hex!("0001020304050607");
        let expected = hex!("6820B3657B6F615A5725BDA0D3B4EB3A257C9AF1F8F03009");
        assert_eq!(expected.len(), 8 + 16);

        let cipher = Aes128Ocb::new(*GenericArray::from_slice(&key));
        let nonce = GenericArray::from_slice(&nonce);
        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: &data,
                    aad: &data,
                },
            )
            .unwrap();
        assert_eq!(ciphertext.len(), 8 + 16);
        assert_eq!(&ciphertext[..], &expected[..]);

        let recovered = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &ciphertext,
                    aad: &data,
                },
            )
            .unwrap();
        assert_eq!(recovered, data);
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let key = hex!("000102030405060708090A0B0C0D0E0F");
        let nonce = hex!("BBAA99887766554433221101");
        let data = hex!("0001020304050607");

        let cipher = Aes128Ocb::new(*GenericArray::from_slice(&key));
        let nonce = GenericArray::from_slice(&nonce);
        let mut ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: &data,
                    aad: &data,
                },
            )
            .unwrap();
        ciphertext[0] ^= 0x01;

        assert!(cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &ciphertext,
                    aad: &data,
                },
            )
            .is_err());
    }
}
