use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};

/// A list that clients may send either as JSON or as a JSON-encoded string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonList<T> {
    List(Vec<T>),
    Encoded(String),
}

impl<T> Default for JsonList<T> {
    fn default() -> Self {
        JsonList::List(Vec::new())
    }
}

impl<T: serde::de::DeserializeOwned> JsonList<T> {
    /// Resolves the list, decoding the string form. `field` names the input in
    /// the validation message.
    pub fn into_vec(self, field: &str) -> Result<Vec<T>> {
        match self {
            JsonList::List(items) => Ok(items),
            JsonList::Encoded(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            JsonList::Encoded(raw) => serde_json::from_str(&raw)
                .map_err(|e| AppError::Validation(format!("Invalid {}: {}", field, e))),
        }
    }
}

/// Trims an optional text input, treating blank as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Requires a non-blank text input
pub fn required(value: Option<String>, field: &str) -> Result<String> {
    non_blank(value).ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

/// Accepts an optional absolute http(s) URL
pub fn optional_url(value: Option<String>, field: &str) -> Result<Option<String>> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Some(url.to_string())),
        _ => Err(AppError::Validation(format!("{} must be a valid http(s) URL", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    #[test]
    fn test_list_and_string_forms_agree() {
        let list: JsonList<Item> =
            serde_json::from_value(serde_json::json!([{ "name": "Badge" }])).unwrap();
        let encoded: JsonList<Item> =
            serde_json::from_value(serde_json::json!("[{\"name\":\"Badge\"}]")).unwrap();

        assert_eq!(
            list.into_vec("items").unwrap(),
            encoded.into_vec("items").unwrap()
        );
    }

    #[test]
    fn test_optional_url() {
        assert_eq!(optional_url(None, "website").unwrap(), None);
        assert_eq!(optional_url(Some("  ".to_string()), "website").unwrap(), None);
        assert_eq!(
            optional_url(Some("https://acme.example".to_string()), "website").unwrap(),
            Some("https://acme.example/".to_string())
        );
        assert!(optional_url(Some("acme.example".to_string()), "website").is_err());
        assert!(optional_url(Some("ftp://acme.example".to_string()), "website").is_err());
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required(Some(" Acme ".to_string()), "name").unwrap(), "Acme");
        assert!(matches!(
            required(Some("".to_string()), "name"),
            Err(AppError::Validation(m)) if m == "name is required"
        ));
    }

    #[test]
    fn test_bad_string_is_validation_error() {
        let encoded: JsonList<Item> = JsonList::Encoded("not json".to_string());
        assert!(matches!(
            encoded.into_vec("attendees"),
            Err(AppError::Validation(m)) if m.starts_with("Invalid attendees")
        ));
    }
}
