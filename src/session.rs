//! The OCB3 streaming engine: HashLane, CryptLane, Finalizer and the
//! SessionController that orchestrates them (RFC 7253 §4 / spec.md §4).

use alloc::vec::Vec;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use aes::block_cipher_trait::BlockCipher;
use aead::generic_array::typenum::U16;

use crate::error::Error;
use crate::gf::Ladder;
use crate::nonce::NonceCache;
use crate::util::{ntz, xor_block, Block, MAIN_BUF_CAP, MAX_TAG_LEN};

/// Which direction the main (payload) permutation runs in. The hash
/// permutation always runs forward, in both directions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// A reusable OCB3 session bound to one key.
///
/// `Ocb3Core` owns the single block-permutation instance used both as the
/// "hash cipher" (always forward) and the "main cipher" (forward on
/// encrypt, inverse on decrypt) — see `DESIGN.md` for why the reference's
/// two separate permutation handles collapse into one here.
///
/// Lifecycle: `new` once per key, then any number of
/// `init` → (`feed_aad` | `feed_message`)* → `finalize` → (`reset`) cycles.
pub struct Ocb3Core<C: BlockCipher<BlockSize = U16>> {
    cipher: C,
    ladder: Ladder,
    nonce_cache: NonceCache,

    direction: Option<Direction>,
    tag_len: usize,

    offset_main_0: Block,
    offset_main: Block,
    offset_hash: Block,

    checksum: Block,
    sum: Block,

    hash_buf: Block,
    hash_pos: usize,
    hash_count: u64,

    main_buf: [u8; MAIN_BUF_CAP],
    main_pos: usize,
    main_count: u64,

    initial_aad: Vec<u8>,
    mac_block: Option<Vec<u8>>,
}

impl<C: BlockCipher<BlockSize = U16>> Ocb3Core<C> {
    /// Builds a fresh session around `cipher`. `cipher` serves both the
    /// hash lane (`encrypt_block`, always) and the main lane
    /// (`encrypt_block`/`decrypt_block`, by direction).
    pub fn new(cipher: C) -> Self {
        let mut l_star = Block::default();
        cipher.encrypt_block(&mut l_star);
        let ladder = Ladder::new(l_star);

        Self {
            cipher,
            ladder,
            nonce_cache: NonceCache::new(),
            direction: None,
            tag_len: 0,
            offset_main_0: Block::default(),
            offset_main: Block::default(),
            offset_hash: Block::default(),
            checksum: Block::default(),
            sum: Block::default(),
            hash_buf: Block::default(),
            hash_pos: 0,
            hash_count: 0,
            main_buf: [0u8; MAIN_BUF_CAP],
            main_pos: 0,
            main_count: 0,
            initial_aad: Vec::new(),
            mac_block: None,
        }
    }

    /// Establishes mode, tag length, and nonce, and feeds `initial_aad`
    /// through the hash lane as if by `feed_aad`.
    ///
    /// `tag_len_bits` must be in `[32, 256]` and a multiple of 8.
    pub fn init(
        &mut self,
        direction: Direction,
        nonce: &[u8],
        tag_len_bits: usize,
        initial_aad: &[u8],
    ) -> Result<(), Error> {
        if tag_len_bits < 32 || tag_len_bits > 256 || tag_len_bits % 8 != 0 {
            return Err(Error::InvalidTagLength);
        }
        let tag_len = tag_len_bits / 8;
        let offset0 = self
            .nonce_cache
            .derive_offset0(&self.cipher, nonce, tag_len)?;

        self.direction = Some(direction);
        self.tag_len = tag_len;
        self.offset_main_0 = offset0;
        self.offset_main = offset0;
        self.offset_hash = Block::default();
        self.checksum = Block::default();
        self.sum = Block::default();
        self.hash_buf = Block::default();
        self.hash_pos = 0;
        self.hash_count = 0;
        self.main_buf = [0u8; MAIN_BUF_CAP];
        self.main_pos = 0;
        self.main_count = 0;
        self.mac_block = None;
        self.initial_aad = initial_aad.to_vec();

        self.feed_aad(initial_aad);
        Ok(())
    }

    /// Absorbs `aad` into `Sum` via the hash lane.
    pub fn feed_aad(&mut self, mut aad: &[u8]) {
        if self.hash_pos > 0 {
            let n = core::cmp::min(16 - self.hash_pos, aad.len());
            self.hash_buf[self.hash_pos..self.hash_pos + n].copy_from_slice(&aad[..n]);
            self.hash_pos += n;
            aad = &aad[n..];
            if self.hash_pos == 16 {
                self.process_full_hash_block();
            }
        }
        while aad.len() >= 16 {
            self.hash_buf.copy_from_slice(&aad[..16]);
            self.process_full_hash_block();
            aad = &aad[16..];
        }
        if !aad.is_empty() {
            self.hash_buf[..aad.len()].copy_from_slice(aad);
            self.hash_pos = aad.len();
        }
    }

    fn process_full_hash_block(&mut self) {
        self.hash_count += 1;
        let l = self.ladder.get(ntz(self.hash_count) as usize);
        xor_block(&mut self.offset_hash, &l);
        xor_block(&mut self.hash_buf, &self.offset_hash);
        self.cipher.encrypt_block(&mut self.hash_buf);
        xor_block(&mut self.sum, &self.hash_buf);
        self.hash_pos = 0;
    }

    fn finalize_hash(&mut self) {
        if self.hash_pos == 0 {
            return;
        }
        self.hash_buf[self.hash_pos] = 0x80;
        for b in self.hash_buf[self.hash_pos + 1..16].iter_mut() {
            *b = 0;
        }
        let l_star = *self.ladder.l_star();
        xor_block(&mut self.offset_hash, &l_star);
        xor_block(&mut self.hash_buf, &self.offset_hash);
        self.cipher.encrypt_block(&mut self.hash_buf);
        xor_block(&mut self.sum, &self.hash_buf);
    }

    fn main_buf_len(&self) -> usize {
        match self.direction {
            Some(Direction::Decrypt) => 16 + self.tag_len,
            _ => 16,
        }
    }

    /// Worst-case number of bytes `feed_message` will write for `input_len`
    /// more input bytes, given whatever is already buffered.
    pub fn update_output_size(&self, input_len: usize) -> usize {
        let total = self.main_pos + input_len;
        let total = match self.direction {
            Some(Direction::Decrypt) => total.saturating_sub(self.tag_len),
            _ => total,
        };
        total - (total % 16)
    }

    /// Total bytes `finalize` will write for `input_len` more trailing
    /// input bytes.
    pub fn final_output_size(&self, input_len: usize) -> usize {
        let total = self.main_pos + input_len;
        match self.direction {
            Some(Direction::Encrypt) => total + self.tag_len,
            Some(Direction::Decrypt) => total.saturating_sub(self.tag_len),
            None => 0,
        }
    }

    /// Feeds message bytes through the crypt lane, writing completed
    /// blocks to `out`. `out` must have room for
    /// `update_output_size(input.len())` bytes. Returns the number of
    /// bytes written.
    pub fn feed_message(&mut self, mut input: &[u8], mut out: &mut [u8]) -> Result<usize, Error> {
        let direction = self.direction.ok_or(Error::Configuration)?;
        let buf_len = self.main_buf_len();
        let mut written = 0;

        while !input.is_empty() {
            let space = buf_len - self.main_pos;
            let n = core::cmp::min(space, input.len());
            self.main_buf[self.main_pos..self.main_pos + n].copy_from_slice(&input[..n]);
            self.main_pos += n;
            input = &input[n..];

            if self.main_pos == buf_len {
                if out.len() < 16 {
                    return Err(Error::BufferTooSmall);
                }
                self.process_full_main_block(direction, &mut out[..16]);
                out = &mut out[16..];
                written += 16;
            }
        }
        Ok(written)
    }

    fn process_full_main_block(&mut self, direction: Direction, out: &mut [u8]) {
        self.main_count += 1;

        if let Direction::Encrypt = direction {
            let plaintext = Block::clone_from_slice(&self.main_buf[..16]);
            xor_block(&mut self.checksum, &plaintext);
        }

        let l = self.ladder.get(ntz(self.main_count) as usize);
        xor_block(&mut self.offset_main, &l);

        let mut block = Block::clone_from_slice(&self.main_buf[..16]);
        xor_block(&mut block, &self.offset_main);
        match direction {
            Direction::Encrypt => self.cipher.encrypt_block(&mut block),
            Direction::Decrypt => self.cipher.decrypt_block(&mut block),
        }
        xor_block(&mut block, &self.offset_main);

        out.copy_from_slice(&block);

        if let Direction::Decrypt = direction {
            xor_block(&mut self.checksum, &block);
            let tag_len = self.tag_len;
            self.main_buf.copy_within(16..16 + tag_len, 0);
            self.main_pos = tag_len;
        } else {
            self.main_pos = 0;
        }
    }

    fn pad_main_buf(&mut self) {
        self.main_buf[self.main_pos] = 0x80;
        for b in self.main_buf[self.main_pos + 1..16].iter_mut() {
            *b = 0;
        }
    }

    /// Consumes remaining buffered bytes, computes the tag, and either
    /// appends it (encrypt) or verifies it in constant time (decrypt).
    /// Returns the number of bytes written to `out`. Leaves the session
    /// ready for `reset`.
    pub fn finalize(&mut self, out: &mut [u8]) -> Result<usize, Error> {
        let direction = self.direction.ok_or(Error::Configuration)?;
        let mut written = 0;
        let mut stored_tag = [0u8; MAX_TAG_LEN];

        if let Direction::Decrypt = direction {
            if self.main_pos < self.tag_len {
                return Err(Error::DataTooShort);
            }
            let start = self.main_pos - self.tag_len;
            stored_tag[..self.tag_len].copy_from_slice(&self.main_buf[start..self.main_pos]);
            self.main_pos -= self.tag_len;
        }

        self.finalize_hash();

        if self.main_pos > 0 {
            if out.len() < self.main_pos {
                return Err(Error::BufferTooSmall);
            }

            if let Direction::Encrypt = direction {
                self.pad_main_buf();
                let padded = Block::clone_from_slice(&self.main_buf[..16]);
                xor_block(&mut self.checksum, &padded);
            }

            let l_star = *self.ladder.l_star();
            xor_block(&mut self.offset_main, &l_star);
            let mut pad = self.offset_main;
            self.cipher.encrypt_block(&mut pad);

            for i in 0..self.main_pos {
                let p = self.main_buf[i] ^ pad[i];
                out[i] = p;
                self.main_buf[i] = p;
            }
            written = self.main_pos;

            if let Direction::Decrypt = direction {
                // main_buf now holds the recovered plaintext (written
                // above), not the ciphertext it held on entry — Checksum
                // must fold in P*, matching the encrypt branch which
                // folds in plaintext too.
                self.pad_main_buf();
                let padded = Block::clone_from_slice(&self.main_buf[..16]);
                xor_block(&mut self.checksum, &padded);
            }
        }

        xor_block(&mut self.checksum, &self.offset_main);
        let l_dollar = *self.ladder.l_dollar();
        xor_block(&mut self.checksum, &l_dollar);
        self.cipher.encrypt_block(&mut self.checksum);
        xor_block(&mut self.checksum, &self.sum);

        let tag_len = self.tag_len;
        self.mac_block = Some(self.checksum[..tag_len].to_vec());

        let result = match direction {
            Direction::Encrypt => {
                if out.len() < written + tag_len {
                    return Err(Error::BufferTooSmall);
                }
                out[written..written + tag_len].copy_from_slice(&self.checksum[..tag_len]);
                written += tag_len;
                Ok(written)
            }
            Direction::Decrypt => {
                let tags_match = self.checksum[..tag_len]
                    .ct_eq(&stored_tag[..tag_len])
                    .unwrap_u8()
                    == 1;
                if tags_match {
                    Ok(written)
                } else {
                    Err(Error::AuthenticationFailed)
                }
            }
        };

        self.reset(true);
        result
    }

    /// Clears lane state and, if `preserve_mac` is false, the computed
    /// tag. The L ladder, `stretch`/Ktop cache, and key-dependent
    /// constants survive, as does the ability to resume the same nonce's
    /// offset — `initial_aad`, if any, is replayed into the hash lane.
    pub fn reset(&mut self, preserve_mac: bool) {
        self.offset_main = self.offset_main_0;
        self.offset_hash = Block::default();
        self.checksum = Block::default();
        self.sum = Block::default();
        self.hash_buf = Block::default();
        self.hash_pos = 0;
        self.hash_count = 0;
        self.main_buf = [0u8; MAIN_BUF_CAP];
        self.main_pos = 0;
        self.main_count = 0;
        if !preserve_mac {
            self.mac_block = None;
        }
        if !self.initial_aad.is_empty() {
            let aad = self.initial_aad.clone();
            self.feed_aad(&aad);
        }
    }

    /// The computed tag, or `None` before `finalize` has run.
    pub fn mac(&self) -> Option<&[u8]> {
        self.mac_block.as_deref()
    }
}

impl<C: BlockCipher<BlockSize = U16>> Drop for Ocb3Core<C> {
    fn drop(&mut self) {
        self.offset_main_0.as_mut_slice().zeroize();
        self.offset_main.as_mut_slice().zeroize();
        self.offset_hash.as_mut_slice().zeroize();
        self.checksum.as_mut_slice().zeroize();
        self.sum.as_mut_slice().zeroize();
        self.hash_buf.as_mut_slice().zeroize();
        self.main_buf.zeroize();
        self.ladder.zeroize();
        self.nonce_cache.zeroize();
        self.initial_aad.zeroize();
        if let Some(mac) = self.mac_block.as_mut() {
            mac.zeroize();
        }
    }
}
