//! Comparison of fixed-length packet fields.

/// Return true if `a` and `b` have the same length and the same content.
///
/// Every byte is visited when the lengths match, so the time taken does not
/// depend on where the first difference is.
///
/// ```
/// use rewritecap::matcher::fields_equal;
///
/// assert!(fields_equal(&[10, 0, 0, 1], &[10, 0, 0, 1]));
/// assert!(!fields_equal(&[10, 0, 0, 1], &[10, 0, 0, 2]));
/// assert!(!fields_equal(&[10, 0, 0, 1], &[10, 0, 0]));
/// ```
pub fn fields_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use crate::matcher::fields_equal;

    #[test]
    fn test_fields_equal() {
        let b1 = [10, 20, 30, 40, 50, 60];
        let b2 = [10, 20, 30, 40, 50, 60];
        let b3 = [10, 20, 35, 40, 50, 60];
        let b4 = [10, 20, 30, 40, 50, 60, 70];
        assert!(fields_equal(&b1, &b2));
        assert!(!fields_equal(&b1, &b3));
        assert!(!fields_equal(&b1, &b4));
        assert!(!fields_equal(&b4, &b1));
    }

    #[test]
    fn test_fields_equal_reflexive() {
        for len in 0..8 {
            let field: Vec<u8> = (0..len).map(|i| i * 37).collect();
            assert!(fields_equal(&field, &field));
        }
    }

    #[test]
    fn test_fields_equal_last_byte() {
        assert!(!fields_equal(&[0xff; 6], &[0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]));
        assert!(!fields_equal(&[0x00, 0, 0, 0], &[0x80, 0, 0, 0]));
    }

    #[test]
    fn test_fields_equal_empty() {
        assert!(fields_equal(&[], &[]));
        assert!(!fields_equal(&[], &[0]));
    }
}
