//! Credential properties and API key resolution.
//!
//! A provider property holds either one key or a JSON array of keys
//! (`["key1","key2"]`). Order defines retry precedence.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use serde_json::Value;

/// Read-only source of named configuration properties.
pub trait PropertySource: Send + Sync {
    fn get_property(&self, name: &str) -> Option<String>;
}

/// Properties read from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProperties;

impl PropertySource for EnvProperties {
    fn get_property(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory properties.
#[derive(Clone, Default)]
pub struct MapProperties {
    values: BTreeMap<String, String>,
}

impl MapProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl Debug for MapProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.values
                    .iter()
                    .map(|(name, value)| (name, mask_property(name, value))),
            )
            .finish()
    }
}

impl PropertySource for MapProperties {
    fn get_property(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// First source holding a property wins.
#[derive(Default)]
pub struct LayeredProperties {
    layers: Vec<Box<dyn PropertySource>>,
}

impl LayeredProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, source: impl PropertySource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl PropertySource for LayeredProperties {
    fn get_property(&self, name: &str) -> Option<String> {
        self.layers
            .iter()
            .find_map(|layer| layer.get_property(name))
    }
}

/// One API key with the label used to refer to it in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    label: String,
    secret: String,
}

impl Credential {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.secret)
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("label", &self.label)
            .field("secret", &self.masked())
            .finish()
    }
}

/// Ordered API keys for one provider property.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialSet {
    property: String,
    credentials: Vec<Credential>,
}

impl CredentialSet {
    /// Reads and parses `property` from `source`. A missing property yields an empty set.
    pub fn resolve(source: &dyn PropertySource, property: &str) -> Self {
        let secrets = source
            .get_property(property)
            .map(|raw| parse_secrets(&raw))
            .unwrap_or_default();
        Self::from_secrets(property, secrets)
    }

    pub fn from_secrets(property: &str, secrets: Vec<String>) -> Self {
        let credentials = secrets
            .into_iter()
            .enumerate()
            .map(|(index, secret)| Credential {
                label: format!("{property}[{index}]"),
                secret,
            })
            .collect();
        Self {
            property: property.to_owned(),
            credentials,
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Credential> {
        self.credentials.iter()
    }
}

impl<'a> IntoIterator for &'a CredentialSet {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Accepts a JSON array of strings, a JSON string, or a bare key.
pub fn parse_secrets(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let candidates = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(secret) => Some(secret),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .collect(),
        Ok(Value::String(secret)) => vec![secret],
        _ => vec![trimmed.to_owned()],
    };

    candidates
        .into_iter()
        .map(|secret| secret.trim().to_owned())
        .filter(|secret| !secret.is_empty())
        .collect()
}

/// `abc****yz` for secrets longer than six characters; shorter values are returned as-is.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 6 {
        return secret.to_owned();
    }

    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}****{tail}")
}

/// Masks a property value when its name looks sensitive. Key arrays are masked per item.
pub fn mask_property(name: &str, value: &str) -> String {
    const SENSITIVE: [&str; 5] = ["KEY", "TOKEN", "AUTH", "PASSWORD", "SECRET"];

    let upper = name.to_ascii_uppercase();
    if !SENSITIVE.iter().any(|keyword| upper.contains(keyword)) {
        return value.to_owned();
    }

    if let Ok(Value::Array(_)) = serde_json::from_str::<Value>(value.trim()) {
        return parse_secrets(value)
            .iter()
            .map(|secret| mask_secret(secret))
            .collect::<Vec<_>>()
            .join(", ");
    }

    mask_secret(value)
}
