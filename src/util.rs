use aead::generic_array::{typenum::U16, GenericArray};

/// A single 128-bit block, the unit OCB operates on throughout.
pub(crate) type Block = GenericArray<u8, U16>;

/// Largest tag length OCB3 supports, in bytes (256 bits).
pub(crate) const MAX_TAG_LEN: usize = 32;

/// Capacity of the decrypt-side main buffer: one block plus the largest
/// possible reserved tag window.
pub(crate) const MAIN_BUF_CAP: usize = 16 + MAX_TAG_LEN;

/// Number of trailing zero bits in `n`.
///
/// Only ever called with `n >= 1` (message/AAD block counters start at 1),
/// so the `ntz(0)` case the spec leaves undefined never arises here.
pub(crate) fn ntz(n: u64) -> u32 {
    debug_assert_ne!(n, 0, "ntz is only defined for block counters, which start at 1");
    n.trailing_zeros()
}

/// `a ^= b`, block-sized.
pub(crate) fn xor_block(a: &mut Block, b: &Block) {
    for i in 0..16 {
        a[i] ^= b[i];
    }
}
