//! Utility functions for the smp290-ble crate.

use btleplug::api::BDAddr;

use crate::error::{Error, Result};

/// Format a hardware address as upper-case, colon separated hex.
///
/// # Example
///
/// ```
/// use btleplug::api::BDAddr;
/// use smp290_ble::format_address;
///
/// let address = BDAddr::from([0xC0, 0xFF, 0xEE, 0x00, 0x01, 0x02]);
/// assert_eq!(format_address(&address), "C0:FF:EE:00:01:02");
/// ```
pub fn format_address(address: &BDAddr) -> String {
    address
        .into_inner()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse an operator supplied value such as `1,0` into bytes.
///
/// # Arguments
///
/// * `input` - Comma separated integers in `0..=255`
///
/// # Example
///
/// ```
/// use smp290_ble::parse_byte_list;
///
/// assert_eq!(parse_byte_list("1, 0").unwrap(), vec![1, 0]);
/// assert!(parse_byte_list("256").is_err());
/// ```
pub fn parse_byte_list(input: &str) -> Result<Vec<u8>> {
    input
        .split(',')
        .map(|part| {
            part.trim().parse::<u8>().map_err(|_| Error::InvalidValue {
                input: input.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_address() {
        let address = BDAddr::from([0x0A, 0x1B, 0x2C, 0x3D, 0x4E, 0x5F]);
        assert_eq!(format_address(&address), "0A:1B:2C:3D:4E:5F");
    }

    #[test]
    fn test_parse_byte_list() {
        assert_eq!(parse_byte_list("4").unwrap(), vec![4]);
        assert_eq!(parse_byte_list("1,0").unwrap(), vec![1, 0]);
        assert_eq!(parse_byte_list(" 2 , 1 ").unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_parse_byte_list_rejects_garbage() {
        assert!(matches!(
            parse_byte_list("1,x"),
            Err(Error::InvalidValue { .. })
        ));
        assert!(parse_byte_list("").is_err());
        assert!(parse_byte_list("-1").is_err());
        assert!(parse_byte_list("1,,2").is_err());
    }
}
