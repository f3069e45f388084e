//! Records returned by resource queries
//!
//! Listings produce fixed-field records; `show` commands produce ordered
//! key/value detail records.

use std::fmt;

/// One line of a fixed-field listing, as named fields in wire order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    fields: Vec<(&'static str, String)>,
}

impl ListingRecord {
    pub(crate) fn new(fields: Vec<(&'static str, String)>) -> Self {
        ListingRecord { fields }
    }

    /// Get a field by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over fields in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(n, v)| (*n, v.as_str()))
    }

    fn take(&mut self, name: &str) -> String {
        self.fields
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| std::mem::take(v))
            .unwrap_or_default()
    }
}

/// Key/value description of one resource
///
/// Keys are unique. Insertion order is kept for display; re-inserting a key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    entries: Vec<(String, String)>,
}

impl DetailRecord {
    /// Create a new empty record
    pub fn new() -> Self {
        DetailRecord {
            entries: Vec::new(),
        }
    }

    /// Insert a value, replacing any earlier value for the same key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Get the value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over all entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the record is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for DetailRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

/// One entry of `tunnel list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunnel {
    pub tunnel_id: String,
    pub ipv6_endpoint: String,
    pub ipv4_endpoint: String,
    pub pop_name: String,
}

impl Tunnel {
    /// Listing field names, in wire order
    pub const FIELDS: [&'static str; 4] = ["tunnel_id", "ipv6_endpoint", "ipv4_endpoint", "pop_name"];
}

impl From<ListingRecord> for Tunnel {
    fn from(mut record: ListingRecord) -> Self {
        Tunnel {
            tunnel_id: record.take("tunnel_id"),
            ipv6_endpoint: record.take("ipv6_endpoint"),
            ipv4_endpoint: record.take("ipv4_endpoint"),
            pop_name: record.take("pop_name"),
        }
    }
}

/// One entry of `route list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub route_id: String,
    pub tunnel_id: String,
    pub route_prefix: String,
}

impl Route {
    /// Listing field names, in wire order
    pub const FIELDS: [&'static str; 3] = ["route_id", "tunnel_id", "route_prefix"];
}

impl From<ListingRecord> for Route {
    fn from(mut record: ListingRecord) -> Self {
        Route {
            route_id: record.take("route_id"),
            tunnel_id: record.take("tunnel_id"),
            route_prefix: record.take("route_prefix"),
        }
    }
}
