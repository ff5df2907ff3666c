//! Query-string codec for reloading a submission from the address bar.
//!
//! Uses `application/x-www-form-urlencoded` rules (the same ones browsers
//! apply to `URLSearchParams`): `+` decodes to a space and values are
//! percent-encoded on the way out.

use url::form_urlencoded;

/// Ordered string mapping decoded from a query string.
///
/// Keys keep the position of their first occurrence; inserting an existing
/// key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_query_string(&self) -> String {
        encode(self.iter().map(|(k, v)| (k, Some(v))))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Parse a raw query string. A single leading `?` is ignored; the last
/// occurrence of a repeated key wins.
pub fn decode(raw: &str) -> QueryParams {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Serialize entries in iteration order, skipping `None` and empty values.
/// The result has no leading `?`.
pub fn encode<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in entries {
        match value {
            Some(value) if !value.is_empty() => {
                serializer.append_pair(key, value);
            }
            _ => {}
        }
    }
    serializer.finish()
}
