//! Environment store
//!
//! A process-lifetime mapping from string keys to values, seeded at startup
//! and touched only by command handlers. Keys may be created ad hoc; nothing
//! is persisted across runs.

use indexmap::IndexMap;

use crate::data::Value;

/// Shared mutable state read and written by command handlers
#[derive(Debug, Clone, Default)]
pub struct EnvStore {
    vars: IndexMap<String, Value>,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated from `(key, value)` pairs
    pub fn seeded(vars: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.vars.get_mut(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_get() {
        let mut env = EnvStore::new();
        env.set("name", "ada");
        assert_eq!(env.get("name"), Some(&Value::from("ada")));
        assert!(env.contains("name"));
    }

    #[test]
    fn test_seeded_preserves_order() {
        let env = EnvStore::seeded([
            ("username".to_string(), Value::Nil),
            ("age".to_string(), Value::Nil),
            ("tabwidth".to_string(), Value::Int(4)),
        ]);
        let keys: Vec<&str> = env.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["username", "age", "tabwidth"]);
    }

    #[test]
    fn test_overwrite_and_remove() {
        let mut env = EnvStore::new();
        env.set("age", 30i64);
        env.set("age", 31i64);
        assert_eq!(env.get("age"), Some(&Value::Int(31)));
        assert_eq!(env.remove("age"), Some(Value::Int(31)));
        assert_eq!(env.get("age"), None);
    }
}
