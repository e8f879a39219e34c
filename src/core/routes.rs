//! Deposit/withdraw route resolution between two venues
//!
//! A spread is only actionable when the asset can leave the cheap venue and
//! arrive at the expensive one. Network keys are normalized on ingest
//! (`exchanges::networks`), so matching here is plain key equality.

use crate::core::types::{AssetMeta, TransferRoute};

/// How unverifiable routes are treated when filtering rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutePolicy {
    /// Same-asset rows without network metadata pass through as UNVERIFIED
    #[default]
    Lenient,
    /// Only confirmed network matches survive
    Strict,
}

impl RoutePolicy {
    pub fn permits(self, route: &TransferRoute) -> bool {
        match route {
            TransferRoute::Unknown => false,
            TransferRoute::Unverified => self == RoutePolicy::Lenient,
            TransferRoute::Network(_) => true,
        }
    }
}

/// Find a transfer route from the withdraw side to the deposit side.
///
/// Returns `None` when the assets differ or no usable network pair exists.
/// When neither side publishes network metadata the route is `Unverified`:
/// the asset codes match but transferability cannot be confirmed.
pub fn resolve_route(src: &AssetMeta, dst: &AssetMeta) -> Option<TransferRoute> {
    let src_code = src.base_code.trim().to_uppercase();
    let dst_code = dst.base_code.trim().to_uppercase();
    if src_code.is_empty() || dst_code.is_empty() || src_code != dst_code {
        return None;
    }

    if src.networks.is_empty() && dst.networks.is_empty() {
        return Some(TransferRoute::Unverified);
    }

    for out in &src.networks {
        if out.withdraw == Some(false) || out.active == Some(false) {
            continue;
        }
        let Some(out_key) = out.key.as_deref() else {
            continue;
        };
        for inn in &dst.networks {
            if inn.deposit == Some(false) || inn.active == Some(false) {
                continue;
            }
            if inn.key.as_deref() == Some(out_key) {
                let label = if out.display.is_empty() {
                    out_key.to_string()
                } else {
                    out.display.clone()
                };
                return Some(TransferRoute::Network(label));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::networks::NetworkInfo;

    fn net(key: &str, display: &str, deposit: Option<bool>, withdraw: Option<bool>) -> NetworkInfo {
        NetworkInfo {
            key: Some(key.to_string()),
            display: display.to_string(),
            deposit,
            withdraw,
            active: None,
        }
    }

    #[test]
    fn test_shared_network_confirms_route() {
        let src = AssetMeta::new(
            "USDT",
            vec![net("TRON", "TRC20", Some(true), Some(true))],
        );
        let dst = AssetMeta::new(
            "USDT",
            vec![net("TRON", "TRX", Some(true), Some(true))],
        );
        assert_eq!(
            resolve_route(&src, &dst),
            Some(TransferRoute::Network("TRC20".to_string()))
        );
    }

    #[test]
    fn test_withdraw_disabled_source_is_skipped() {
        let src = AssetMeta::new(
            "XRP",
            vec![
                net("XRP", "XRP", Some(true), Some(false)),
                net("BSC", "BEP20", Some(true), Some(true)),
            ],
        );
        let dst = AssetMeta::new(
            "XRP",
            vec![
                net("XRP", "XRP", Some(true), Some(true)),
                net("BSC", "BSC", Some(true), Some(true)),
            ],
        );
        assert_eq!(
            resolve_route(&src, &dst),
            Some(TransferRoute::Network("BEP20".to_string()))
        );
    }

    #[test]
    fn test_deposit_disabled_destination_is_skipped() {
        let src = AssetMeta::new("SOL", vec![net("SOLANA", "SOL", None, Some(true))]);
        let dst = AssetMeta::new("SOL", vec![net("SOLANA", "SOL", Some(false), None)]);
        assert_eq!(resolve_route(&src, &dst), None);
    }

    #[test]
    fn test_inactive_network_is_skipped() {
        let mut out = net("ETHEREUM", "ERC20", Some(true), Some(true));
        out.active = Some(false);
        let src = AssetMeta::new("PEPE", vec![out]);
        let dst = AssetMeta::new(
            "PEPE",
            vec![net("ETHEREUM", "ERC20", Some(true), Some(true))],
        );
        assert_eq!(resolve_route(&src, &dst), None);
    }

    #[test]
    fn test_unknown_flags_do_not_block() {
        let src = AssetMeta::new("ADA", vec![net("CARDANO", "ADA", None, None)]);
        let dst = AssetMeta::new("ADA", vec![net("CARDANO", "ADA", None, None)]);
        assert_eq!(
            resolve_route(&src, &dst),
            Some(TransferRoute::Network("ADA".to_string()))
        );
    }

    #[test]
    fn test_no_metadata_either_side_is_unverified() {
        let src = AssetMeta::new("DOGE", vec![]);
        let dst = AssetMeta::new("DOGE", vec![]);
        assert_eq!(resolve_route(&src, &dst), Some(TransferRoute::Unverified));
    }

    #[test]
    fn test_one_sided_metadata_without_match_fails() {
        let src = AssetMeta::new("DOGE", vec![net("DOGE", "DOGE", None, Some(true))]);
        let dst = AssetMeta::new("DOGE", vec![]);
        assert_eq!(resolve_route(&src, &dst), None);
    }

    #[test]
    fn test_mismatched_assets_never_route() {
        let src = AssetMeta::new("BTC", vec![]);
        let dst = AssetMeta::new("ETH", vec![]);
        assert_eq!(resolve_route(&src, &dst), None);
    }

    #[test]
    fn test_nameless_network_falls_back_to_key() {
        let src = AssetMeta::new("TON", vec![net("TON", "", None, Some(true))]);
        let dst = AssetMeta::new("TON", vec![net("TON", "The Open Network", Some(true), None)]);
        assert_eq!(
            resolve_route(&src, &dst),
            Some(TransferRoute::Network("TON".to_string()))
        );
    }

    #[test]
    fn test_policy_permits() {
        assert!(!RoutePolicy::Lenient.permits(&TransferRoute::Unknown));
        assert!(RoutePolicy::Lenient.permits(&TransferRoute::Unverified));
        assert!(RoutePolicy::Lenient.permits(&TransferRoute::Network("X".into())));
        assert!(!RoutePolicy::Strict.permits(&TransferRoute::Unverified));
        assert!(RoutePolicy::Strict.permits(&TransferRoute::Network("X".into())));
    }
}
