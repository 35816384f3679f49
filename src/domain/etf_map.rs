//! Fund code to regional/sector ETF mapping.
//!
//! Funds publish only a close price, so liquidity signals are borrowed from a
//! representative exchange-traded fund.

use std::collections::BTreeMap;

/// Pairs used by the scorer.
pub const DEFAULT_PAIRS: [(&str, &str); 6] = [
    ("SHK126", "EWH"),  // Hong Kong equity
    ("SHK128", "EPP"),  // Asia Pacific ex-Japan
    ("SHK129", "EZU"),  // Eurozone
    ("SHK130", "SPY"),  // North America
    ("SHK131", "EWJ"),  // Japan
    ("SHK136", "MCHI"), // China
];

/// Additional pairs covered by the download list.
pub const EXTENDED_PAIRS: [(&str, &str); 3] = [
    ("SHK127", "SPY"), // International equity
    ("SHK137", "XLV"), // Healthcare
    ("SHK145", "EWH"), // Hang Seng ESG
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundEtfMap {
    entries: BTreeMap<String, String>,
}

impl FundEtfMap {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_uppercase(), v.into().to_uppercase()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn extended() -> Self {
        Self::new(DEFAULT_PAIRS.into_iter().chain(EXTENDED_PAIRS))
    }

    pub fn resolve(&self, fund_code: &str) -> Option<&str> {
        self.entries.get(fund_code).map(String::as_str)
    }

    /// Adds or replaces a mapping.
    pub fn insert(&mut self, fund_code: &str, ticker: &str) {
        self.entries
            .insert(fund_code.to_uppercase(), ticker.to_uppercase());
    }

    /// Distinct tickers, sorted.
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.entries.values().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers.dedup();
        tickers
    }

    pub fn fund_codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FundEtfMap {
    fn default() -> Self {
        Self::new(DEFAULT_PAIRS)
    }
}
