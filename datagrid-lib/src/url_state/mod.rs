//! Conditional state store.
//!
//! Each piece of query state is read and written through a [`StateStore`].
//! Whether the store is backed by URL query parameters (shareable, survives
//! reload) or by plain memory scoped to the grid instance is decided once,
//! when the store is built, and never changes afterwards.

mod codec;

pub use codec::UrlValue;

use std::collections::HashMap;

use url::Url;

use crate::config::TableConfig;

/// Raw string storage behind a [`StateStore`].
pub trait StateBacking: Send {
    /// Returns the raw value for a key.
    fn read(&self, key: &str) -> Option<String>;

    /// Sets or removes the raw value for a key.
    fn write(&mut self, key: &str, value: Option<String>);

    /// The shareable location, for backings that have one.
    fn location(&self) -> Option<&Url> {
        None
    }
}

/// Keeps state in the query string of a URL.
///
/// Unrelated parameters are preserved, and a key keeps its position when it
/// is rewritten.
#[derive(Debug, Clone)]
pub struct UrlBacking {
    url: Url,
}

impl UrlBacking {
    /// Wraps the current location.
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl StateBacking for UrlBacking {
    fn read(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn write(&mut self, key: &str, value: Option<String>) {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut replaced = false;
        for (k, v) in self.url.query_pairs() {
            if k != key {
                pairs.push((k.into_owned(), v.into_owned()));
            } else if !replaced {
                replaced = true;
                if let Some(value) = &value {
                    pairs.push((k.into_owned(), value.clone()));
                }
            }
        }
        if !replaced
            && let Some(value) = value
        {
            pairs.push((key.to_string(), value));
        }

        if pairs.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }

    fn location(&self) -> Option<&Url> {
        Some(&self.url)
    }
}

/// Keeps state in memory for the lifetime of the grid.
#[derive(Debug, Clone, Default)]
pub struct MemoryBacking {
    values: HashMap<String, String>,
}

impl MemoryBacking {
    /// Creates an empty backing.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBacking for MemoryBacking {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(value) => {
                self.values.insert(key.to_string(), value);
            }
            None => {
                self.values.remove(key);
            }
        }
    }
}

/// Typed get/set over a backing chosen at construction.
///
/// # Example
///
/// ```
/// use datagrid_lib::url_state::StateStore;
/// use url::Url;
///
/// let mut store = StateStore::url(Url::parse("https://app.example/users")?);
/// store.set("search", &"alice".to_string(), &String::new());
/// assert_eq!(store.location().unwrap().as_str(), "https://app.example/users?search=alice");
///
/// let reloaded = StateStore::url(store.location().unwrap().clone());
/// assert_eq!(reloaded.get("search", String::new()), "alice");
/// # Ok::<(), url::ParseError>(())
/// ```
pub struct StateStore {
    backing: Box<dyn StateBacking>,
}

impl StateStore {
    /// Creates a store over any backing.
    pub fn new(backing: impl StateBacking + 'static) -> Self {
        Self {
            backing: Box::new(backing),
        }
    }

    /// Creates a URL-backed store starting from `location`.
    pub fn url(location: Url) -> Self {
        Self::new(UrlBacking::new(location))
    }

    /// Creates a memory-backed store.
    pub fn memory() -> Self {
        Self::new(MemoryBacking::new())
    }

    /// Picks the backing from the configuration. `location` is only used in
    /// URL mode.
    pub fn from_config(config: &TableConfig, location: Url) -> Self {
        if config.enable_url_state {
            Self::url(location)
        } else {
            Self::memory()
        }
    }

    /// Reads a value, falling back to `default` when the key is missing or
    /// its value does not decode.
    pub fn get<T: UrlValue>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.backing.read(key) else {
            return default;
        };
        match T::decode(&raw) {
            Some(value) => value,
            None => {
                log::debug!("ignoring malformed state value for '{}': {:?}", key, raw);
                default
            }
        }
    }

    /// Writes a value. A value equal to `default` removes the key.
    pub fn set<T: UrlValue>(&mut self, key: &str, value: &T, default: &T) {
        if value == default {
            self.backing.write(key, None);
        } else {
            self.backing.write(key, Some(value.encode()));
        }
    }

    /// Reads, transforms and writes back a value. Returns the new value.
    pub fn update<T: UrlValue>(&mut self, key: &str, default: T, f: impl FnOnce(T) -> T) -> T {
        let next = f(self.get(key, default.clone()));
        self.set(key, &next, &default);
        next
    }

    /// The shareable location when URL-backed.
    pub fn location(&self) -> Option<&Url> {
        self.backing.location()
    }

    /// Returns `true` when state is mirrored into a URL.
    pub fn is_url_backed(&self) -> bool {
        self.backing.location().is_some()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("location", &self.location().map(Url::as_str))
            .finish()
    }
}
