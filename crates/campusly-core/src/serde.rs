//! Lenient deserializers for query-string filters.
//!
//! Query parameters arrive as strings, and flattened filter structs lose the
//! type hints `serde_urlencoded` would otherwise use. Empty strings are
//! treated as absent.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.trim().is_empty()))
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(deserializer)? {
        Some(s) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(deserializer)? {
        Some(s) => s.trim().parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(deserializer)?.as_deref().map(str::trim) {
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid boolean value: {}",
            other
        ))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        class_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        active: Option<bool>,
    }

    #[test]
    fn test_empty_strings_are_none() {
        let f: Filter = serde_json::from_str(r#"{"class_id":"","active":""}"#).unwrap();
        assert!(f.class_id.is_none());
        assert!(f.active.is_none());
    }

    #[test]
    fn test_values_parse() {
        let id = Uuid::new_v4();
        let f: Filter =
            serde_json::from_str(&format!(r#"{{"class_id":"{}","active":"true"}}"#, id)).unwrap();
        assert_eq!(f.class_id, Some(id));
        assert_eq!(f.active, Some(true));
    }

    #[test]
    fn test_missing_fields_default() {
        let f: Filter = serde_json::from_str("{}").unwrap();
        assert!(f.class_id.is_none());
        assert!(f.active.is_none());
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let result: Result<Filter, _> = serde_json::from_str(r#"{"active":"maybe"}"#);
        assert!(result.is_err());
    }
}
