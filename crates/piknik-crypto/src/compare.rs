//! Constant-time comparison of authentication tags

use subtle::ConstantTimeEq;

/// Compare two byte strings without leaking the position of the first
/// difference. Slices of different length compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
