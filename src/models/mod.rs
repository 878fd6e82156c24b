use serde::{Deserialize, Deserializer, Serialize};
pub mod bank;
pub mod ft;

/// `{"Details": ...}` wrapper used by every FT API document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Details<T> {
    #[serde(rename = "Details")]
    pub details: T,
}

/// The FT API returns a bare object when there is one record and an array
/// when there are several.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Keeps numeric fields as text whether the API quoted them or not.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
