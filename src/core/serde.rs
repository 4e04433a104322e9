use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

use super::types::Address;

/// Serializes Duration as whole milliseconds
pub fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    (duration.as_millis() as u64).serialize(serializer)
}

/// Deserializes Duration from milliseconds
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

/// Serializes an Address as a `0xNN` hex string
pub fn serialize_address<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    format!("{:#04x}", address.0).serialize(serializer)
}

/// Deserializes an Address from a `0xNN` hex string
pub fn deserialize_address<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(&text);
    u8::from_str_radix(digits, 16)
        .map(Address)
        .map_err(|e| D::Error::custom(format!("invalid address {:?}: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[derive(Serialize, Deserialize)]
    struct Test {
        #[serde(serialize_with = "serialize_duration")]
        #[serde(deserialize_with = "deserialize_duration")]
        timeout: Duration,
        #[serde(serialize_with = "serialize_address")]
        #[serde(deserialize_with = "deserialize_address")]
        address: Address,
    }

    #[test]
    fn test_duration_and_address_serialization() {
        let original = Test {
            timeout: Duration::from_millis(250),
            address: Address::PANEL2,
        };

        let serialized = serde_json::to_string(&original).unwrap();
        assert_eq!(serialized, r#"{"timeout":250,"address":"0x22"}"#);

        let deserialized: Test = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.timeout, original.timeout);
        assert_eq!(deserialized.address, original.address);
    }

    #[test]
    fn test_address_without_prefix() {
        let parsed: Test = serde_json::from_str(r#"{"timeout":0,"address":"29"}"#).unwrap();
        assert_eq!(parsed.address, Address::PANEL8);
    }

    #[test]
    fn test_invalid_address_rejected() {
        let parsed: Result<Test, _> = serde_json::from_str(r#"{"timeout":0,"address":"0xZZ"}"#);
        assert!(parsed.is_err());
    }
}
