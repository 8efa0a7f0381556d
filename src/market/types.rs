use crate::state::Contract;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

// ── Chart (spot + history) ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub chart: Option<ChartEnvelope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    pub meta: Option<ChartMeta>,
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicators {
    pub quote: Option<Vec<QuoteSeries>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSeries {
    /// Null entries mark sessions without a close.
    pub close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("unknown"),
            self.description.as_deref().unwrap_or("")
        )
    }
}

impl ChartResponse {
    fn first_result(&self) -> Option<&ChartResult> {
        self.chart.as_ref()?.result.as_ref()?.first()
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        self.chart.as_ref()?.error.as_ref()
    }

    #[inline]
    pub fn regular_market_price(&self) -> Option<f64> {
        self.first_result()?.meta.as_ref()?.regular_market_price
    }

    /// (date, close) pairs in timestamp order, skipping null closes.
    pub fn daily_closes(&self) -> Vec<(NaiveDate, f64)> {
        let Some(result) = self.first_result() else {
            return Vec::new();
        };
        let timestamps = result.timestamp.as_deref().unwrap_or(&[]);
        let closes = result
            .indicators
            .as_ref()
            .and_then(|i| i.quote.as_ref())
            .and_then(|q| q.first())
            .and_then(|q| q.close.as_deref())
            .unwrap_or(&[]);

        let mut out: Vec<(NaiveDate, f64)> = timestamps
            .iter()
            .zip(closes)
            .filter_map(|(&ts, close)| Some((epoch_to_date(ts)?, (*close)?)))
            .collect();
        out.sort_by_key(|(d, _)| *d);
        out
    }
}

// ── Options ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsResponse {
    pub option_chain: Option<OptionChainEnvelope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChainEnvelope {
    pub result: Option<Vec<OptionChainResult>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainResult {
    pub underlying_symbol: Option<String>,
    pub expiration_dates: Option<Vec<i64>>,
    pub options: Option<Vec<OptionSet>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    pub expiration_date: Option<i64>,
    pub calls: Option<Vec<OptionQuote>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuote {
    pub contract_symbol: Option<String>,
    pub strike: Option<f64>,
    pub last_price: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub expiration: Option<i64>,
}

impl OptionQuote {
    /// Ask price, falling back to the last trade when no positive ask is quoted.
    pub fn premium(&self) -> Option<f64> {
        match (self.ask, self.last_price) {
            (Some(ask), _) if ask > 0.0 => Some(ask),
            (_, Some(last)) if last > 0.0 => {
                tracing::warn!(
                    contract = self.contract_symbol.as_deref().unwrap_or(""),
                    last,
                    "no positive ask, using last price as premium"
                );
                Some(last)
            }
            (ask, _) => ask,
        }
    }

    pub fn to_contract(&self, expiration: NaiveDate) -> Option<Contract> {
        let strike = self.strike.filter(|s| s.is_finite())?;
        let premium = self.premium()?;
        Some(Contract {
            symbol: self.contract_symbol.clone(),
            strike,
            premium,
            expiration: self.expiration.and_then(epoch_to_date).unwrap_or(expiration),
        })
    }
}

impl OptionsResponse {
    fn first_result(&self) -> Option<&OptionChainResult> {
        self.option_chain.as_ref()?.result.as_ref()?.first()
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        self.option_chain.as_ref()?.error.as_ref()
    }

    pub fn expiration_dates(&self) -> Vec<NaiveDate> {
        self.first_result()
            .and_then(|r| r.expiration_dates.as_ref())
            .map(|dates| dates.iter().filter_map(|&ts| epoch_to_date(ts)).collect())
            .unwrap_or_default()
    }

    /// Calls listed for `expiration`; quotes without strike or price are dropped.
    pub fn calls(&self, expiration: NaiveDate) -> Vec<Contract> {
        self.first_result()
            .and_then(|r| r.options.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|set| set.calls.as_ref())
            .flatten()
            .filter_map(|q| q.to_contract(expiration))
            .collect()
    }
}

#[inline]
pub fn epoch_to_date(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "AAPL", "currency": "USD", "regularMarketPrice": 189.84 },
                "timestamp": [1717421400, 1717507800, 1717594200],
                "indicators": { "quote": [{ "close": [194.03, null, 195.87] }] }
            }],
            "error": null
        }
    }"#;

    const OPTIONS: &str = r#"{
        "optionChain": {
            "result": [{
                "underlyingSymbol": "AAPL",
                "expirationDates": [1718323200, 1718928000],
                "options": [{
                    "expirationDate": 1718323200,
                    "calls": [
                        { "contractSymbol": "AAPL240614C00190000", "strike": 190.0, "lastPrice": 3.1, "bid": 2.9, "ask": 3.0, "expiration": 1718323200 },
                        { "contractSymbol": "AAPL240614C00200000", "strike": 200.0, "lastPrice": 0.4, "bid": 0.0, "ask": 0.0, "expiration": 1718323200 },
                        { "contractSymbol": "AAPL240614C00210000", "lastPrice": 0.1, "ask": 0.1, "expiration": 1718323200 }
                    ]
                }]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_chart_price_and_closes() {
        let resp: ChartResponse = serde_json::from_str(CHART).unwrap();
        assert_eq!(resp.regular_market_price(), Some(189.84));
        let closes = resp.daily_closes();
        assert_eq!(closes.len(), 2, "null close skipped");
        assert_eq!(closes[0], (NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), 194.03));
        assert_eq!(closes[1].1, 195.87);
        assert!(resp.api_error().is_none());
    }

    #[test]
    fn test_options_expirations_and_calls() {
        let resp: OptionsResponse = serde_json::from_str(OPTIONS).unwrap();
        let exp = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        assert_eq!(resp.expiration_dates(), vec![exp, NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()]);

        let calls = resp.calls(exp);
        assert_eq!(calls.len(), 2, "quote without strike dropped");
        assert_eq!(calls[0].premium, 3.0);
        assert_eq!(calls[1].premium, 0.4, "falls back to last price");
        assert_eq!(calls[1].expiration, exp);
    }

    #[test]
    fn test_api_error_surfaces() {
        let body = r#"{ "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found" } } }"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(resp.regular_market_price().is_none());
        assert_eq!(resp.api_error().unwrap().to_string(), "Not Found: No data found");
    }
}
