// =============================================================================
// Pair catalog: tracked JPY pairs, display names, demo base prices
// =============================================================================

/// Demo base price for pairs missing from the catalog.
pub const DEFAULT_BASE_PRICE: f64 = 1000.0;

/// Static metadata for one tradeable pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairInfo {
    pub pair: &'static str,
    pub name: &'static str,
    /// Centre of the demo price walk.
    pub base_price: f64,
}

const fn info(pair: &'static str, name: &'static str, base_price: f64) -> PairInfo {
    PairInfo {
        pair,
        name,
        base_price,
    }
}

/// Every pair the overview tracks, in display order.
pub const CATALOG: &[PairInfo] = &[
    // majors
    info("btc_jpy", "Bitcoin", 8_500_000.0),
    info("eth_jpy", "Ethereum", 450_000.0),
    info("xrp_jpy", "XRP", 95.0),
    // trending
    info("shib_jpy", "Shiba Inu", 0.003),
    info("pepe_jpy", "Pepe", 0.0015),
    info("matic_jpy", "Polygon", 120.0),
    info("link_jpy", "Chainlink", 2_800.0),
    info("dot_jpy", "Polkadot", 1_200.0),
    info("avax_jpy", "Avalanche", 6_500.0),
    // gaming / metaverse
    info("sand_jpy", "The Sandbox", 85.0),
    info("mana_jpy", "Decentraland", 75.0),
    info("axs_jpy", "Axie Infinity", 1_200.0),
    info("enj_jpy", "Enjin Coin", 68.0),
    info("imx_jpy", "Immutable X", 350.0),
    info("ape_jpy", "ApeCoin", 280.0),
    info("chz_jpy", "Chiliz", 18.0),
    // established
    info("ltc_jpy", "Litecoin", 12_000.0),
    info("bch_jpy", "Bitcoin Cash", 65_000.0),
    info("etc_jpy", "Ethereum Classic", 4_500.0),
    info("xlm_jpy", "Stellar Lumens", 19.0),
    info("xem_jpy", "NEM", 8.5),
    info("lsk_jpy", "Lisk", 185.0),
    // defi / utility
    info("bat_jpy", "BAT", 42.0),
    info("iost_jpy", "IOST", 1.8),
    info("qtum_jpy", "Qtum", 550.0),
    info("fnct_jpy", "Fnality", 35.0),
    info("grt_jpy", "The Graph", 38.0),
    info("mask_jpy", "Mask Network", 620.0),
    // other
    info("mona_jpy", "Monacoin", 95.0),
    info("wbtc_jpy", "Wrapped Bitcoin", 8_500_000.0),
    info("fpl_jpy", "Flare", 8.2),
    info("doge_jpy", "Dogecoin", 22.0),
    info("bril_jpy", "Brilliance", 145.0),
];

pub fn lookup(pair: &str) -> Option<&'static PairInfo> {
    CATALOG.iter().find(|p| p.pair == pair)
}

pub fn is_known(pair: &str) -> bool {
    lookup(pair).is_some()
}

/// All catalog pair codes as owned strings.
pub fn all_pairs() -> Vec<String> {
    CATALOG.iter().map(|p| p.pair.to_string()).collect()
}

/// Human-readable name, falling back to the upper-cased base asset.
pub fn display_name(pair: &str) -> String {
    match lookup(pair) {
        Some(p) => p.name.to_string(),
        None => pair
            .split('_')
            .next()
            .unwrap_or(pair)
            .to_ascii_uppercase(),
    }
}

pub fn base_price(pair: &str) -> f64 {
    lookup(pair).map_or(DEFAULT_BASE_PRICE, |p| p.base_price)
}

/// Yen price with precision scaled to magnitude.
///
/// `>= 1000` no decimals, `>= 10` two, `>= 0.01` four, else six. Integer
/// parts of values from 1000 up are grouped with commas.
pub fn format_price(price: f64) -> String {
    if price >= 1000.0 {
        format!("¥{}", group_thousands(&format!("{price:.0}")))
    } else if price >= 10.0 {
        format!("¥{price:.2}")
    } else if price >= 0.01 {
        format!("¥{price:.4}")
    } else {
        format!("¥{price:.6}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
