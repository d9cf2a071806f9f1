// =============================================================================
// Symbol alias table (C2)
// =============================================================================
//
// A handful of tickers were renamed by their issuing project after most
// providers' APIs had already shipped under the old symbol. The router
// resolves aliases to one canonical symbol before dispatching any provider
// call so a coin is never double-counted under two spellings.

const ALIASES: &[(&str, &str)] = &[
    ("MIOTA", "IOTA"),
    ("LUNA2", "LUNA"),
    ("LUNC", "LUNA"),
    ("BCC", "BCH"),
    ("XBT", "BTC"),
];

/// Resolve a provider-reported symbol to its canonical form.
/// Returns the input unchanged when no alias is registered.
pub fn canonical_symbol(symbol: &str) -> &str {
    let upper = symbol;
    ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(upper))
        .map(|(_, canon)| *canon)
        .unwrap_or(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_alias() {
        assert_eq!(canonical_symbol("MIOTA"), "IOTA");
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(canonical_symbol("miota"), "IOTA");
    }

    #[test]
    fn passes_through_unknown_symbol() {
        assert_eq!(canonical_symbol("BTC"), "BTC");
    }
}
