//! Records flowing through the trend stage.
//!
//! Field names on the wire are the column headers shared by every stage
//! artifact ("Symbol", "Company Name", ...).

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the upstream (liquidity) artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRecord {
    #[serde(rename = "Symbol")]
    pub symbol: String,

    #[serde(rename = "Company Name", default)]
    pub company_name: String,

    #[serde(rename = "Industry", default)]
    pub industry: Option<String>,

    /// Relative strength computed by an earlier stage
    #[serde(rename = "RS", default = "nan", deserialize_with = "nan_if_null")]
    pub rs: f64,

    /// Price; a missing value reads as NaN
    #[serde(rename = "Price", default = "nan", deserialize_with = "nan_if_null")]
    pub price: f64,

    #[serde(rename = "Market Cap", default)]
    pub market_cap: Option<f64>,

    #[serde(rename = "50-day Average Volume", default)]
    pub average_volume: Option<f64>,
}

fn nan() -> f64 {
    f64::NAN
}

fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Moving averages and 52-week high scraped for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendMetrics {
    pub ema_10: f64,
    pub ema_21: f64,
    pub sma_50: f64,
    pub sma_200: f64,
    pub high_52_week: f64,
}

/// A symbol that passed the trend screen, as written to the output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    #[serde(flatten)]
    pub record: SymbolRecord,

    #[serde(rename = "% Below 52-week High")]
    pub percent_below_high: f64,

    #[serde(rename = "10-day EMA")]
    pub ema_10: f64,

    #[serde(rename = "21-day EMA")]
    pub ema_21: f64,

    #[serde(rename = "50-day SMA")]
    pub sma_50: f64,

    #[serde(rename = "200-day SMA")]
    pub sma_200: f64,

    #[serde(rename = "52-week high")]
    pub high_52_week: f64,
}

impl TrendRecord {
    /// Merge an input row with its fetched metrics.
    pub fn new(record: SymbolRecord, metrics: &TrendMetrics, percent_below_high: f64) -> Self {
        Self {
            record,
            percent_below_high,
            ema_10: metrics.ema_10,
            ema_21: metrics.ema_21,
            sma_50: metrics.sma_50,
            sma_200: metrics.sma_200,
            high_52_week: metrics.high_52_week,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.record.symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_symbol_record_from_stage_columns() {
        let row = json!({
            "Symbol": "NVDA",
            "Company Name": "NVIDIA Corporation",
            "Industry": "Semiconductors",
            "RS": 97.0,
            "Price": 450.25,
            "Market Cap": 1.1e12,
            "50-day Average Volume": 4.2e7
        });

        let record: SymbolRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.symbol, "NVDA");
        assert_eq!(record.industry.as_deref(), Some("Semiconductors"));
        assert_eq!(record.price, 450.25);
        assert_eq!(record.average_volume, Some(4.2e7));
    }

    #[test]
    fn test_null_price_reads_as_nan() {
        let row = json!({ "Symbol": "BAD", "Price": null });
        let record: SymbolRecord = serde_json::from_value(row).unwrap();
        assert!(record.price.is_nan());
        assert!(record.rs.is_nan());
        assert!(record.company_name.is_empty());
    }

    #[test]
    fn test_trend_record_columns() {
        let record = SymbolRecord {
            symbol: "MSFT".into(),
            company_name: "Microsoft".into(),
            industry: None,
            rs: 88.0,
            price: 300.0,
            market_cap: None,
            average_volume: None,
        };
        let metrics = TrendMetrics {
            ema_10: 295.0,
            ema_21: 290.0,
            sma_50: 280.0,
            sma_200: 250.0,
            high_52_week: 320.0,
        };

        let value = serde_json::to_value(TrendRecord::new(record, &metrics, 6.25)).unwrap();
        assert_eq!(value["Symbol"], "MSFT");
        assert_eq!(value["% Below 52-week High"], 6.25);
        assert_eq!(value["10-day EMA"], 295.0);
        assert_eq!(value["200-day SMA"], 250.0);
        assert_eq!(value["52-week high"], 320.0);
    }
}
