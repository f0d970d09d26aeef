use subtle::ConstantTimeEq;

/// Compare a presented shared secret against the configured value in
/// constant time. The length check leaks only the length, which is not
/// secret for a fixed-format token.
pub fn verify_shared_secret(expected: &str, presented: &str) -> bool {
    let expected = expected.as_bytes();
    let presented = presented.as_bytes();

    if expected.len() != presented.len() {
        return false;
    }

    expected.ct_eq(presented).into()
}
