//! Bit unpacking helpers shared by the BMP decoder.

/// Unpack 1/2/4-bit palette indices, most significant bits first.
///
/// `out` receives one index per byte; unpacking stops at whichever of
/// `input` or `out` runs out first.
pub(crate) fn unpack_indices(depth: usize, input: &[u8], out: &mut [u8]) {
    let per_byte = 8 / depth;
    let mask = (1u8 << depth) - 1;
    for (chunk, &byte) in out.chunks_mut(per_byte).zip(input) {
        for (i, slot) in chunk.iter_mut().enumerate() {
            let shift = 8 - depth * (i + 1);
            *slot = (byte >> shift) & mask;
        }
    }
}

/// Scale factors taking an n-bit value to 8 bits by bit replication.
const MUL_TABLE: [u32; 9] = [0, 0xff, 0x55, 0x49, 0x11, 0x21, 0x41, 0x81, 0x01];
const SHIFT_TABLE: [i32; 9] = [0, 0, 0, 1, 0, 2, 4, 6, 0];

/// Extract a bitfield value already masked from `v` and scale it to 0..=255.
///
/// `shift` aligns the field's top bit to bit 7 (negative shifts left).
pub(crate) fn shift_signed(mut v: u32, shift: i32, bits: u32) -> u32 {
    if shift < 0 {
        v <<= -shift;
    } else {
        v >>= shift;
    }
    let bits = bits.min(8);
    v >>= 8 - bits;
    (v.wrapping_mul(MUL_TABLE[bits as usize])) >> SHIFT_TABLE[bits as usize]
}

/// Shift that aligns the top bit of `mask` with bit 7.
pub(crate) fn mask_shift(mask: u32) -> i32 {
    (32 - mask.leading_zeros() as i32) - 8
}
