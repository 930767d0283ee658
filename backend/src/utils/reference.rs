use rand::Rng;
use safari_booking_shared::{BOOKING_REFERENCE_PREFIX, PAYMENT_REFERENCE_PREFIX};

/// Generate a candidate booking reference: "TZ" followed by 8 uppercase hex
/// characters. Uniqueness is enforced by the database; callers retry on a
/// unique violation.
pub fn generate_booking_reference() -> String {
    format!("{}{}", BOOKING_REFERENCE_PREFIX, random_hex(8))
}

/// Generate a candidate payment reference: "PAY" followed by 10 uppercase
/// hex characters.
pub fn generate_payment_reference() -> String {
    format!("{}{}", PAYMENT_REFERENCE_PREFIX, random_hex(10))
}

fn random_hex(len: usize) -> String {
    const HEX: &[u8] = b"0123456789ABCDEF";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_reference_has_prefix_and_length() {
        let reference = generate_booking_reference();
        assert!(reference.starts_with("TZ"));
        assert_eq!(reference.len(), 10);
        assert!(reference[2..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn payment_reference_has_prefix_and_length() {
        let reference = generate_payment_reference();
        assert!(reference.starts_with("PAY"));
        assert_eq!(reference.len(), 13);
    }

    #[test]
    fn references_vary() {
        let a = generate_booking_reference();
        let b = generate_booking_reference();
        let c = generate_booking_reference();
        // Vanishingly unlikely to collide three times in a row
        assert!(a != b || b != c);
    }
}
