//! Spot trade-page deep links
//!
//! URL templates keyed by venue id, filled from a unified `BASE/QUOTE`
//! symbol. The table intentionally covers more venues than ship with a
//! client so rows keep their links as coverage grows.

use crate::exchanges::types::split_symbol;

/// Build the venue's spot trade-page URL for a unified symbol.
///
/// Returns `None` for unknown venues or malformed symbols.
pub fn trade_link(venue: &str, symbol: &str) -> Option<String> {
    let (base, quote) = split_symbol(symbol);
    if base.is_empty() || quote.is_empty() {
        return None;
    }
    let b = base.to_uppercase();
    let q = quote.to_uppercase();
    let bl = base.to_lowercase();
    let ql = quote.to_lowercase();

    let url = match venue {
        "binance" => format!("https://www.binance.com/en/trade/{}_{}", b, q),
        "bybit" => format!("https://www.bybit.com/trade/spot/{}/{}", b, q),
        "coinbase" => format!("https://www.coinbase.com/advanced-trade/spot/{}-{}", b, q),
        "okx" => format!("https://www.okx.com/trade-spot/{}-{}", bl, ql),
        "kraken" => format!("https://pro.kraken.com/app/trade/{}-{}", bl, ql),
        "gateio" => format!("https://www.gate.io/trade/{}_{}", b, q),
        "mexc" => format!("https://www.mexc.com/exchange/{}_{}", b, q),
        "bitget" => format!("https://www.bitget.com/spot/{}{}", b, q),
        "htx" => format!("https://www.htx.com/trade/{}_{}", bl, ql),
        "upbit" => format!("https://upbit.com/exchange?code=CRIX.UPBIT.{}-{}", q, b),
        "kucoin" => format!("https://www.kucoin.com/trade/{}-{}", b, q),
        "bingx" => format!("https://bingx.com/en/spot/{}{}/", b, q),
        "cryptocom" => format!("https://crypto.com/exchange/trade/spot/{}_{}", b, q),
        "bitmart" => format!("https://www.bitmart.com/trade/en-US?symbol={}_{}", b, q),
        "lbank" => format!("https://www.lbank.com/trade/{}_{}/", bl, ql),
        "whitebit" => format!("https://whitebit.com/trade/{}-{}", b, q),
        "poloniex" => format!("https://poloniex.com/trade/{}_{}/?type=spot", b, q),
        "bitstamp" => format!("https://www.bitstamp.net/trade/{}/{}/", bl, ql),
        "coinex" => format!("https://www.coinex.com/exchange/{}-{}", bl, ql),
        "btse" => format!("https://www.btse.com/en/trading/{}-{}", b, q),
        "bitfinex" => format!("https://trading.bitfinex.com/t/{}:{}?type=exchange", b, q),
        _ => return None,
    };
    Some(url)
}
