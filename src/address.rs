//! Wallet address handling
//!
//! Every address that enters the core goes through [`normalize_address`]
//! before it is compared or stored.

/// Trim surrounding whitespace and lower-case a wallet address
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Compare two addresses after normalization
pub fn same_address(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

/// Shortened form for log lines
pub(crate) fn short(address: &str) -> &str {
    let end = address
        .char_indices()
        .nth(10)
        .map(|(i, _)| i)
        .unwrap_or(address.len());
    &address[..end]
}
