/// The reserved pseudo-instrument holding uninvested cash, in base currency units.
/// It is never priced and never traded.
pub const CASH: &str = "CASH";

/// Normalises an instrument identifier the way every store keys it:
/// surrounding whitespace trimmed, inner spaces removed, upper-cased.
pub fn normalize_instrument(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_case_and_spaces() {
        assert_eq!(normalize_instrument("  brk -b "), "BRK-B");
        assert_eq!(normalize_instrument("aapl"), "AAPL");
        assert_eq!(normalize_instrument("cash"), CASH);
        assert_eq!(normalize_instrument("   "), "");
    }
}
