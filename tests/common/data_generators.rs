//! Deterministic tensor contents for tests.

use half::{bf16, f16};

pub fn make_f64_data(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 * 0.25 - 1.0).collect()
}
pub fn make_f32_data(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32 * 0.5 - 1.0).collect()
}
pub fn make_f16_data(n: usize) -> Vec<f16> {
    make_f32_data(n).into_iter().map(f16::from_f32).collect()
}
pub fn make_bf16_data(n: usize) -> Vec<bf16> {
    make_f32_data(n).into_iter().map(bf16::from_f32).collect()
}
pub fn make_i64_data(n: usize) -> Vec<i64> {
    (0..n).map(|i| i as i64 - (n / 2) as i64).collect()
}
pub fn make_i32_data(n: usize) -> Vec<i32> {
    (0..n).map(|i| i as i32 - (n / 2) as i32).collect()
}
pub fn make_i16_data(n: usize) -> Vec<i16> {
    (0..n).map(|i| (i as i16).wrapping_mul(-7)).collect()
}
pub fn make_i8_data(n: usize) -> Vec<i8> {
    (0..n).map(|i| (i as u8).wrapping_sub(64) as i8).collect()
}
pub fn make_u64_data(n: usize) -> Vec<u64> {
    (0..n).map(|i| u64::MAX - i as u64).collect()
}
pub fn make_u32_data(n: usize) -> Vec<u32> {
    (0..n).map(|i| 0xDEAD_0000 + i as u32).collect()
}
pub fn make_u16_data(n: usize) -> Vec<u16> {
    (0..n).map(|i| (i as u16) << 8 | 0x01).collect()
}
pub fn make_u8_data(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 256) as u8).collect()
}
/// Alternating `false, true, ...` encoded as one byte per element.
pub fn make_bool_data(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 2) as u8).collect()
}

/// Little-endian bytes of a `u32` slice.
pub fn u32_le_bytes(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
