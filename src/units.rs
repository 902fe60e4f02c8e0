use alloy_primitives::U256;
use alloy_primitives::utils::format_units;

/// Whole display units of `raw`, comma grouped. The fractional part is dropped.
pub fn format_token_amount(raw: U256, decimals: u8) -> String {
    let whole = match U256::from(10u64).checked_pow(U256::from(decimals)) {
        Some(divisor) => raw / divisor,
        // 10^decimals beyond 256 bits is larger than any raw amount
        None => U256::ZERO,
    };
    group_thousands(&whole.to_string())
}

/// Native currency amount in ether-style units: `1.5`, `2.0`, `0.000000000000000001`.
pub fn format_native(raw: U256) -> String {
    let formatted = format_units(raw, 18u8).unwrap_or_else(|_| raw.to_string());
    trim_fraction(&formatted)
}

pub fn shorten_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

fn trim_fraction(value: &str) -> String {
    match value.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{value}.0"),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn token_amount_drops_decimals_and_groups() {
        let supply = U256::from_str("1000000000000000000000").unwrap();
        assert_eq!(format_token_amount(supply, 18), "1,000");

        let usdc = U256::from_str("45123456789012345").unwrap();
        assert_eq!(format_token_amount(usdc, 6), "45,123,456,789");

        assert_eq!(format_token_amount(U256::from(999u64), 0), "999");
        assert_eq!(format_token_amount(U256::from(1_500u64), 3), "1");
        assert_eq!(format_token_amount(U256::ZERO, 18), "0");
    }

    #[test]
    fn token_amount_survives_huge_decimals() {
        assert_eq!(format_token_amount(U256::MAX, 255), "0");
        assert_eq!(format_token_amount(U256::MAX, 77), "1");
    }

    #[test]
    fn native_amount_keeps_one_fraction_digit() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_native(one_and_half), "1.5");
        assert_eq!(format_native(U256::from(2_000_000_000_000_000_000u64)), "2.0");
        assert_eq!(format_native(U256::ZERO), "0.0");
        assert_eq!(format_native(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn shortens_addresses() {
        assert_eq!(
            shorten_address("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            "0xC02a...6Cc2"
        );
        assert_eq!(shorten_address("0x1234"), "0x1234");
    }
}
