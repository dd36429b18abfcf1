/// Deterministic index selection seeded from a string id.
///
/// Uses the classic `hash * 31 + c` character hash over UTF-16 code units with
/// 32-bit wrapping arithmetic. This is NOT cryptographic and the distribution is
/// only as good as the hash; what matters is that the same id always maps to the
/// same index.
pub fn seeded_index(id: &str, salt: u64, modulus: usize) -> usize {
    if modulus == 0 {
        return 0;
    }
    let seed = u64::from(string_hash(id).unsigned_abs()) + salt;
    (seed % modulus as u64) as usize
}

/// Order-dependent 32-bit hash: `h = (h << 5) - h + c` per UTF-16 code unit.
pub fn string_hash(id: &str) -> i32 {
    id.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}
