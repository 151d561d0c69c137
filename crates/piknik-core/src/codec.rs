//! Fixed-width little-endian integers and byte concatenation for the wire format

use crate::error::{PiknikError, PiknikResult};
use crate::U64_SIZE;

/// Encode a value as a little-endian u64 (8 bytes).
pub fn encode_u64_le(value: u64) -> [u8; U64_SIZE] {
    value.to_le_bytes()
}

/// Decode a little-endian u64 starting at `offset`.
///
/// Fails when fewer than 8 bytes are available at `offset`.
pub fn decode_u64_le(bytes: &[u8], offset: usize) -> PiknikResult<u64> {
    let raw: [u8; U64_SIZE] = offset
        .checked_add(U64_SIZE)
        .and_then(|end| bytes.get(offset..end))
        .and_then(|field| field.try_into().ok())
        .ok_or(PiknikError::Truncated {
            offset,
            needed: U64_SIZE,
            available: bytes.len().saturating_sub(offset),
        })?;
    Ok(u64::from_le_bytes(raw))
}

/// Concatenate byte slices in order. Empty parts are allowed.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_is_little_endian() {
        let buf = encode_u64_le(1);
        assert_eq!(buf[0], 1);
        assert_eq!(buf[7], 0);
        assert_eq!(encode_u64_le(0x0102_0304_0506_0708), [8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_decode_known_values() {
        for v in [0u64, 1, 255, 65535, 1_000_000, (1 << 32) - 1, 1 << 48] {
            assert_eq!(decode_u64_le(&encode_u64_le(v), 0).unwrap(), v);
        }
    }

    #[test]
    fn test_decode_at_offset() {
        let mut header = vec![0xEEu8; 32];
        header.extend_from_slice(&encode_u64_le(4242));
        header.extend_from_slice(&[0xAA; 8]);
        assert_eq!(decode_u64_le(&header, 32).unwrap(), 4242);
    }

    #[test]
    fn test_decode_truncated() {
        let result = decode_u64_le(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 4);
        match result {
            Err(PiknikError::Truncated {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 4);
                assert_eq!(needed, 8);
                assert_eq!(available, 5);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
        assert!(decode_u64_le(&[0u8; 8], usize::MAX).is_err());
    }

    #[test]
    fn test_concat_preserves_order() {
        let c = concat(&[&[1u8, 2][..], &[3u8, 4, 5][..]]);
        assert_eq!(c, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_concat_empty_parts() {
        let empty: &[u8] = &[];
        assert_eq!(concat(&[empty, &[1u8][..]]).len(), 1);
        assert!(concat(&[empty, empty]).is_empty());
        assert!(concat(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(v in any::<u64>(), prefix in 0usize..16) {
            let mut buf = vec![0u8; prefix];
            buf.extend_from_slice(&encode_u64_le(v));
            prop_assert_eq!(decode_u64_le(&buf, prefix).unwrap(), v);
        }

        #[test]
        fn concat_length_is_sum(parts in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..32), 0..8)) {
            let slices: Vec<&[u8]> = parts.iter().map(|p| p.as_slice()).collect();
            let joined = concat(&slices);
            prop_assert_eq!(joined.len(), parts.iter().map(|p| p.len()).sum::<usize>());
            prop_assert_eq!(joined, parts.concat());
        }
    }
}
