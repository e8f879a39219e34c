//! Funding-network key normalization
//!
//! Venues spell the same network a dozen ways: `ERC20`, `ETH`,
//! `Ethereum (ERC20)`. Keys are upper-cased, stripped to alphanumerics and
//! run through a fixed alias table so equivalent networks compare equal
//! across venues.

use std::collections::HashMap;

use crate::exchanges::types::Currency;

/// Alias table applied after cleaning. Keys are already cleaned forms
/// (upper-case, alphanumeric only); values are the canonical keys routes
/// compare on.
const NETWORK_ALIASES: &[(&str, &str)] = &[
    ("ERC20", "ETHEREUM"),
    ("ETH", "ETHEREUM"),
    ("ARBITRUMONE", "ARBITRUM"),
    ("ARBONE", "ARBITRUM"),
    ("ARBEVM", "ARBITRUM"),
    ("BEP20", "BSC"),
    ("BSC", "BSC"),
    ("BSCBEP20", "BSC"),
    ("TRC20", "TRON"),
    ("TRX", "TRON"),
    ("MATIC", "POLYGON"),
    ("POLYGON", "POLYGON"),
    ("SOL", "SOLANA"),
    ("AVAXC", "AVALANCHE-C"),
    ("AVAXCCHAIN", "AVALANCHE-C"),
    ("OPTIMISM", "OPTIMISM"),
    ("OP", "OPTIMISM"),
];

/// One funding network after normalization, as indexed per exchange
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInfo {
    /// Canonical comparison key; `None` when the raw name cleans to nothing
    pub key: Option<String>,
    /// Venue-reported label, kept for display in route descriptions
    pub display: String,
    pub deposit: Option<bool>,
    pub withdraw: Option<bool>,
    pub active: Option<bool>,
}

/// Normalize a venue-reported network name into a canonical key.
///
/// Upper-case, strip everything non-alphanumeric, then alias-resolve.
/// Returns `None` when nothing usable remains.
pub fn normalize_network_key(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    for (alias, canonical) in NETWORK_ALIASES {
        if *alias == cleaned {
            return Some((*canonical).to_string());
        }
    }
    Some(cleaned)
}

/// Build the per-exchange base-code → networks index from raw currency
/// metadata. Currencies that declare no networks are omitted.
pub fn build_network_index(currencies: &[Currency]) -> HashMap<String, Vec<NetworkInfo>> {
    let mut index = HashMap::new();
    for currency in currencies {
        if currency.networks.is_empty() {
            continue;
        }
        let networks: Vec<NetworkInfo> = currency
            .networks
            .iter()
            .map(|net| NetworkInfo {
                key: normalize_network_key(&net.id),
                display: net.id.clone(),
                deposit: net.deposit,
                withdraw: net.withdraw,
                active: net.active,
            })
            .collect();
        index.insert(currency.code.to_uppercase(), networks);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::types::CurrencyNetwork;

    #[test]
    fn test_aliases_collapse_to_canonical_keys() {
        assert_eq!(normalize_network_key("ERC20"), Some("ETHEREUM".into()));
        assert_eq!(normalize_network_key("eth"), Some("ETHEREUM".into()));
        assert_eq!(normalize_network_key("Arbitrum One"), Some("ARBITRUM".into()));
        assert_eq!(normalize_network_key("BSC (BEP20)"), Some("BSC".into()));
        assert_eq!(normalize_network_key("TRC20"), Some("TRON".into()));
        assert_eq!(normalize_network_key("trx"), Some("TRON".into()));
        assert_eq!(normalize_network_key("AVAX C-Chain"), Some("AVALANCHE-C".into()));
        assert_eq!(normalize_network_key("op"), Some("OPTIMISM".into()));
    }

    #[test]
    fn test_unknown_networks_pass_through_cleaned() {
        assert_eq!(normalize_network_key("Base"), Some("BASE".into()));
        assert_eq!(normalize_network_key("ton network"), Some("TONNETWORK".into()));
    }

    #[test]
    fn test_unusable_names_yield_none() {
        assert_eq!(normalize_network_key(""), None);
        assert_eq!(normalize_network_key("   "), None);
        assert_eq!(normalize_network_key("-()-"), None);
    }

    #[test]
    fn test_index_skips_currencies_without_networks() {
        let currencies = vec![
            Currency {
                code: "btc".into(),
                networks: vec![CurrencyNetwork {
                    id: "BTC".into(),
                    deposit: Some(true),
                    withdraw: Some(true),
                    active: None,
                }],
            },
            Currency {
                code: "XYZ".into(),
                networks: vec![],
            },
        ];
        let index = build_network_index(&currencies);
        assert_eq!(index.len(), 1);
        let btc = &index["BTC"];
        assert_eq!(btc[0].key.as_deref(), Some("BTC"));
        assert_eq!(btc[0].display, "BTC");
    }

    #[test]
    fn test_index_keeps_networks_with_unusable_keys() {
        let currencies = vec![Currency {
            code: "ABC".into(),
            networks: vec![CurrencyNetwork {
                id: "???".into(),
                deposit: Some(true),
                withdraw: Some(true),
                active: Some(true),
            }],
        }];
        let index = build_network_index(&currencies);
        assert_eq!(index["ABC"][0].key, None);
        assert_eq!(index["ABC"][0].display, "???");
    }
}
