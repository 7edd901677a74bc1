use serde::{Deserialize, Serialize};

/// Ordered key–value environment carried by an execution context.
///
/// Entries are stored in insertion order and serialized as a transparent
/// array of pairs. Lookups scan from the end, so later entries override
/// earlier ones.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(Vec<(String, String)>);

impl Env {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create an environment containing a single entry.
    pub fn single<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(vec![(key.into(), value.into())])
    }

    /// Number of entries, including shadowed ones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the environment has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Get the value for a key, returning the last matching entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append an entry.
    ///
    /// Later entries override earlier ones when queried via [`Env::get`].
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push((key.into(), value.into()));
    }

    /// Combine two environments by concatenation, entries from `other`
    /// overriding earlier ones through the scan-from-the-end lookup.
    pub fn merged(&self, other: &Env) -> Env {
        let mut out = self.0.clone();
        out.extend(other.0.iter().cloned());
        Env(out)
    }
}

impl<K, V> FromIterator<(K, V)> for Env
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Env;

    #[test]
    fn new_is_empty() {
        let env = Env::new();
        assert!(env.is_empty());
        assert!(env.get("FOO").is_none());
    }

    #[test]
    fn single_creates_one_entry() {
        let env = Env::single("FOO", "bar");
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("FOO"), Some("bar"));
    }

    #[test]
    fn set_and_override_last_wins() {
        let mut env = Env::new();
        env.set("FOO", "one");
        env.set("BAR", "x");
        env.set("FOO", "two");

        assert_eq!(env.get("FOO"), Some("two"));
        assert_eq!(env.get("BAR"), Some("x"));
        assert!(env.get("BAZ").is_none());
    }

    #[test]
    fn merged_other_overrides_base() {
        let base: Env = [("FOO", "base"), ("BAR", "bar")].into_iter().collect();
        let other: Env = [("FOO", "override"), ("BAZ", "baz")].into_iter().collect();

        let merged = base.merged(&other);

        assert_eq!(merged.get("FOO"), Some("override"));
        assert_eq!(merged.get("BAR"), Some("bar"));
        assert_eq!(merged.get("BAZ"), Some("baz"));
    }

    #[test]
    fn serde_transparent_roundtrip_json() {
        let mut env = Env::new();
        env.set("FOO", "bar");
        env.set("BAZ", "qux");

        let json = serde_json::to_string(&env).unwrap();
        assert!(json.starts_with('['));

        let back: Env = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("FOO"), Some("bar"));
        assert_eq!(back.get("BAZ"), Some("qux"));
    }
}
