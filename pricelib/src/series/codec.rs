use chrono::{FixedOffset, NaiveDateTime};

use crate::series::errors::StoreError;
use crate::series::objects::{
    Asset, Observation, Prices, RetentionPolicy, Series, TIMESTAMP_FORMAT,
};

pub const TIMESTAMP_COLUMN: &str = "Timestamp";

pub fn expected_headers() -> Vec<String> {
    let mut headers = vec![TIMESTAMP_COLUMN.to_string()];
    headers.extend(Asset::ALL.iter().map(|asset| asset.column().to_string()));
    headers
}

// Serializes a series to CSV bytes, header first.
// Timestamps are written as local wall-clock time in the observation's offset.
pub fn encode(series: &Series) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(expected_headers())?;

    for observation in series.observations() {
        let mut record = vec![observation.timestamp.format(TIMESTAMP_FORMAT).to_string()];
        for asset in Asset::ALL {
            record.push(observation.prices.get(asset).to_string());
        }
        writer.write_record(record)?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| StoreError::Io(err.into_error()))
}

// Parses CSV bytes back into a series, validating the schema and every row.
// The decoded series is passed through the retention policy before it is returned.
pub fn decode(
    contents: &[u8],
    offset: FixedOffset,
    policy: &RetentionPolicy,
) -> Result<Series, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents);

    let found: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let expected = expected_headers();
    if found != expected {
        return Err(StoreError::SchemaMismatch { expected, found });
    }

    let mut observations = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let row = line + 2;

        let raw_timestamp = record
            .get(0)
            .ok_or_else(|| StoreError::Corrupt(format!("row {} has no timestamp", row)))?;
        let naive = NaiveDateTime::parse_from_str(raw_timestamp, TIMESTAMP_FORMAT).map_err(|e| {
            StoreError::Corrupt(format!("row {}: bad timestamp {:?}: {}", row, raw_timestamp, e))
        })?;
        let timestamp = naive
            .and_local_timezone(offset)
            .single()
            .ok_or_else(|| StoreError::Corrupt(format!("row {}: ambiguous timestamp", row)))?;

        let mut prices = Prices::default();
        for (index, asset) in Asset::ALL.iter().enumerate() {
            let raw = record.get(index + 1).ok_or_else(|| {
                StoreError::Corrupt(format!("row {} is missing {}", row, asset.column()))
            })?;
            let price: f64 = raw.trim().parse().map_err(|e| {
                StoreError::Corrupt(format!("row {}: bad {} {:?}: {}", row, asset.column(), raw, e))
            })?;
            if !price.is_finite() {
                return Err(StoreError::Corrupt(format!(
                    "row {}: non-finite {}",
                    row,
                    asset.column()
                )));
            }
            prices.set(*asset, price);
        }

        observations.push(Observation::new(timestamp, prices));
    }

    if observations
        .windows(2)
        .any(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        return Err(StoreError::Corrupt(
            "timestamps are not in non-decreasing order".to_string(),
        ));
    }

    let mut series = Series::new();
    for observation in observations {
        series.push(observation, policy);
    }
    Ok(series)
}
