//! Utility functions for layout arithmetic and byte order.

use crate::models::Dtype;

/// Aligns an offset up to the given alignment boundary.
/// Returns (aligned_offset, padding_bytes).
#[inline]
pub fn align_offset_to(current_offset: u64, alignment: u64) -> (u64, u64) {
    if alignment == 0 {
        return (current_offset, 0);
    }
    let remainder = current_offset % alignment;
    if remainder == 0 {
        (current_offset, 0)
    } else {
        let padding = alignment - remainder;
        (current_offset + padding, padding)
    }
}

/// Returns true if the host system is little-endian.
#[inline]
pub const fn is_little_endian() -> bool {
    cfg!(target_endian = "little")
}

/// Swaps byte order of multi-byte elements in place.
pub fn swap_endianness_in_place(buffer: &mut [u8], element_size: usize) {
    if element_size <= 1 {
        return;
    }
    for chunk in buffer.chunks_exact_mut(element_size) {
        chunk.reverse();
    }
}

/// Product of the dimensions (1 for a scalar), or `None` on overflow.
pub fn checked_num_elements(shape: &[u64]) -> Option<u64> {
    shape.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
}

/// `product(shape) * dtype.size()`, or `None` on overflow.
pub fn checked_byte_len(shape: &[u64], dtype: Dtype) -> Option<u64> {
    checked_num_elements(shape)?.checked_mul(dtype.size() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_offset_to() {
        assert_eq!(align_offset_to(0, 32), (0, 0));
        assert_eq!(align_offset_to(1, 32), (32, 31));
        assert_eq!(align_offset_to(31, 32), (32, 1));
        assert_eq!(align_offset_to(32, 32), (32, 0));
        assert_eq!(align_offset_to(33, 32), (64, 31));
        assert_eq!(align_offset_to(0, 0), (0, 0));
    }

    #[test]
    fn test_swap_endianness() {
        let mut buf = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_endianness_in_place(&mut buf, 4);
        assert_eq!(buf, vec![4, 3, 2, 1, 8, 7, 6, 5]);
        swap_endianness_in_place(&mut buf, 1);
        assert_eq!(buf, vec![4, 3, 2, 1, 8, 7, 6, 5]);
    }

    #[test]
    fn test_checked_byte_len() {
        assert_eq!(checked_num_elements(&[]), Some(1));
        assert_eq!(checked_num_elements(&[2, 0, 5]), Some(0));
        assert_eq!(checked_byte_len(&[1, 2, 2], Dtype::F32), Some(16));
        assert_eq!(checked_byte_len(&[u64::MAX, 2], Dtype::U8), None);
        assert_eq!(checked_byte_len(&[u64::MAX], Dtype::F64), None);
    }
}
