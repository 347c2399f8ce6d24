use chrono::{DateTime, TimeZone, Utc};

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

// Index values arrive either as JSON numbers or as numeric strings: 44 or "44"
pub fn deserialize_u8_from_number_or_string<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = match serde::Deserialize::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom)?,
    };
    u8::try_from(value).map_err(serde::de::Error::custom)
}

pub fn deserialize_optional_time_from_unix_string<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    let s = match s {
        Some(s) => s,
        None => return Ok(None),
    };

    // Sentiment timestamps arrive as seconds since the UNIX epoch, encoded as a string: "1709251200"
    let seconds = s.trim().parse::<i64>().map_err(serde::de::Error::custom)?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("Timestamp out of range: {}", seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Reading {
        #[serde(deserialize_with = "deserialize_u8_from_number_or_string")]
        value: u8,
        #[serde(default, deserialize_with = "deserialize_optional_time_from_unix_string")]
        timestamp: Option<DateTime<Utc>>,
    }

    #[test]
    fn parses_string_encoded_fields() {
        let reading: Reading =
            serde_json::from_str(r#"{"value": "44", "timestamp": "1709251200"}"#).unwrap();
        assert_eq!(reading.value, 44);
        assert_eq!(reading.timestamp.unwrap().timestamp(), 1_709_251_200);
    }

    #[test]
    fn missing_timestamp_is_none() {
        let reading: Reading = serde_json::from_str(r#"{"value": "7"}"#).unwrap();
        assert!(reading.timestamp.is_none());
    }

    #[test]
    fn accepts_plain_numbers() {
        let reading: Reading = serde_json::from_str(r#"{"value": 44}"#).unwrap();
        assert_eq!(reading.value, 44);
    }

    #[test]
    fn rejects_non_numeric_and_out_of_range_values() {
        assert!(serde_json::from_str::<Reading>(r#"{"value": "fear"}"#).is_err());
        assert!(serde_json::from_str::<Reading>(r#"{"value": "300"}"#).is_err());
        assert!(serde_json::from_str::<Reading>(r#"{"value": 300}"#).is_err());
        assert!(serde_json::from_str::<Reading>(r#"{"value": -4}"#).is_err());
        assert!(serde_json::from_str::<Reading>(r#"{"value": 44.5}"#).is_err());
    }
}
