use crate::config::SourceConfig;
use crate::types::StoreRecord;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;

/// Envelope the feed wraps its rows in.
#[derive(Debug, Deserialize)]
pub struct StoreFeed {
    pub query_results: Vec<RawStoreRecord>,
}

/// One row in the fixed source schema. The feed encodes numbers
/// inconsistently (sometimes as JSON strings), so the numeric fields are
/// coerced in `into_record`.
#[derive(Debug, Deserialize)]
pub struct RawStoreRecord {
    #[serde(rename = "MAIL_ST_PROV_C")]
    pub state: String,
    #[serde(rename = "LNGTD_I")]
    pub long: RawNumber,
    #[serde(rename = "LATTD_I")]
    pub lat: RawNumber,
    #[serde(rename = "co_loc_n")]
    pub location: String,
    #[serde(rename = "mail_city_n")]
    pub city: String,
    pub count: RawNumber,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Num(f64),
    Str(String),
}

impl RawNumber {
    fn as_f64(&self) -> Option<f64> {
        match self {
            RawNumber::Num(n) if n.is_finite() => Some(*n),
            RawNumber::Num(_) => None,
            RawNumber::Str(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    fn as_u64(&self) -> Option<u64> {
        self.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64)
    }
}

impl RawStoreRecord {
    /// None if any numeric field fails to coerce; the row is unusable.
    pub fn into_record(self) -> Option<StoreRecord> {
        Some(StoreRecord {
            long: self.long.as_f64()?,
            lat: self.lat.as_f64()?,
            count: self.count.as_u64()?,
            state: self.state,
            location: self.location,
            city: self.city,
        })
    }
}

pub async fn load_stores(config: &SourceConfig) -> Result<Vec<StoreRecord>> {
    let feed: StoreFeed = match &config.cache_file {
        Some(path) => {
            println!("Loading store feed from cache {:?}...", path);
            let file = File::open(path)
                .with_context(|| format!("Failed to open feed cache file: {:?}", path))?;
            serde_json::from_reader(BufReader::new(file))
                .context("Failed to parse cached store feed")?
        }
        None => {
            println!("Fetching store feed from {}...", config.url);
            reqwest::get(&config.url)
                .await
                .with_context(|| format!("Failed to fetch store feed from {}", config.url))?
                .error_for_status()
                .context("Store feed endpoint returned an error status")?
                .json()
                .await
                .context("Failed to decode store feed JSON")?
        }
    };

    let total = feed.query_results.len();
    let records: Vec<StoreRecord> = feed
        .query_results
        .into_iter()
        .filter_map(RawStoreRecord::into_record)
        .collect();

    if records.len() < total {
        tracing::warn!(
            skipped = total - records.len(),
            "dropped rows with uncoercible coordinates or counts"
        );
    }
    println!("Loaded {} store records", records.len());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_feed_with_string_numbers() {
        let json = r#"{
            "query_results": [
                {
                    "MAIL_ST_PROV_C": "MN",
                    "LNGTD_I": "-93.2650",
                    "LATTD_I": "44.9778",
                    "co_loc_n": "Minneapolis Downtown",
                    "mail_city_n": "Minneapolis",
                    "count": "3"
                },
                {
                    "MAIL_ST_PROV_C": "CA",
                    "LNGTD_I": -118.2437,
                    "LATTD_I": 34.0522,
                    "co_loc_n": "LA Central",
                    "mail_city_n": "Los Angeles",
                    "count": 7
                }
            ]
        }"#;
        let feed: StoreFeed = serde_json::from_str(json).unwrap();
        let records: Vec<_> = feed
            .query_results
            .into_iter()
            .filter_map(RawStoreRecord::into_record)
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state, "MN");
        assert_eq!(records[0].long, -93.2650);
        assert_eq!(records[0].count, 3);
        assert_eq!(records[1].city, "Los Angeles");
        assert_eq!(records[1].count, 7);
    }

    #[test]
    fn drops_row_with_uncoercible_count() {
        let json = r#"{
            "MAIL_ST_PROV_C": "TX",
            "LNGTD_I": "-97.7431",
            "LATTD_I": "30.2672",
            "co_loc_n": "Austin North",
            "mail_city_n": "Austin",
            "count": "n/a"
        }"#;
        let raw: RawStoreRecord = serde_json::from_str(json).unwrap();
        assert!(raw.into_record().is_none());
    }

    #[test]
    fn drops_row_with_negative_count() {
        let json = r#"{
            "MAIL_ST_PROV_C": "TX",
            "LNGTD_I": "-97.7431",
            "LATTD_I": "30.2672",
            "co_loc_n": "Austin North",
            "mail_city_n": "Austin",
            "count": -2
        }"#;
        let raw: RawStoreRecord = serde_json::from_str(json).unwrap();
        assert!(raw.into_record().is_none());
    }
}
