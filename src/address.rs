//! IPv4 address encoding.
//!
//! Converts a dotted-decimal IPv4 string into the integer form used by the
//! `country_code_lookups` reference table: the first octet is the most
//! significant byte, so `a.b.c.d` encodes to `d + c*256 + b*256^2 + a*256^3`.

use crate::error_handling::AddressError;

/// Encodes a dotted-decimal IPv4 address as a `u32` suitable for range comparison.
///
/// Leading and trailing whitespace is ignored. Every one of the four components
/// must be a decimal integer in `0..=255`.
///
/// # Errors
///
/// Returns `AddressError::InvalidAddressFormat` for a wrong number of components,
/// an empty or non-numeric component, or an octet above 255.
///
/// # Examples
///
/// ```
/// use country_backfill::encode_ipv4;
///
/// assert_eq!(encode_ipv4("1.2.3.4").unwrap(), 16_909_060);
/// assert!(encode_ipv4("1.2.3").is_err());
/// ```
pub fn encode_ipv4(address: &str) -> Result<u32, AddressError> {
    let invalid = |reason: String| AddressError::InvalidAddressFormat {
        address: address.to_string(),
        reason,
    };

    let parts: Vec<&str> = address.trim().split('.').collect();
    if parts.len() != 4 {
        return Err(invalid(format!("expected 4 octets, found {}", parts.len())));
    }

    let mut value: u32 = 0;
    for part in parts {
        // u8::from_str accepts a leading '+', which is not part of dotted-decimal
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(format!("'{part}' is not a decimal octet")));
        }
        let octet: u8 = part
            .parse()
            .map_err(|_| invalid(format!("octet '{part}' is out of range 0-255")))?;
        value = (value << 8) | u32::from(octet);
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted_sum(o1: u32, o2: u32, o3: u32, o4: u32) -> u32 {
        o4 + o3 * 256 + o2 * 65_536 + o1 * 16_777_216
    }

    #[test]
    fn test_encode_known_value() {
        assert_eq!(encode_ipv4("1.2.3.4"), Ok(16_909_060));
    }

    #[test]
    fn test_encode_matches_weighted_sum() {
        for (o1, o2, o3, o4) in [
            (0, 0, 0, 0),
            (8, 8, 8, 8),
            (203, 0, 113, 5),
            (192, 168, 1, 254),
            (255, 255, 255, 255),
            (10, 0, 255, 1),
        ] {
            let address = format!("{o1}.{o2}.{o3}.{o4}");
            assert_eq!(
                encode_ipv4(&address),
                Ok(weighted_sum(o1, o2, o3, o4)),
                "{address}"
            );
        }
    }

    #[test]
    fn test_encode_agrees_with_std_big_endian() {
        let ip: std::net::Ipv4Addr = "172.16.254.3".parse().unwrap();
        assert_eq!(encode_ipv4("172.16.254.3"), Ok(u32::from(ip)));
    }

    #[test]
    fn test_encode_trims_whitespace() {
        assert_eq!(encode_ipv4(" 8.8.8.8\n"), Ok(134_744_072));
    }

    #[test]
    fn test_encode_rejects_wrong_component_count() {
        for address in ["1.2.3", "1.2.3.4.5", "", "1234"] {
            assert!(
                matches!(
                    encode_ipv4(address),
                    Err(AddressError::InvalidAddressFormat { .. })
                ),
                "{address:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_encode_rejects_non_numeric() {
        for address in ["a.b.c.d", "1.2.3.x", "1..3.4", "1.2.3.-4", "1.2.+3.4", "::1"] {
            assert!(encode_ipv4(address).is_err(), "{address:?} should be rejected");
        }
    }

    #[test]
    fn test_encode_rejects_out_of_range_octet() {
        let err = encode_ipv4("1.2.3.256").unwrap_err();
        let AddressError::InvalidAddressFormat { address, reason } = err;
        assert_eq!(address, "1.2.3.256");
        assert!(reason.contains("256"));
    }
}
