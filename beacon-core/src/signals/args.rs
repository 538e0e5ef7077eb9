//! Dynamic invocation payload.
//!
//! The registry is generic over its payload type. Hosts that route signals
//! from a scripting layer, or that don't want one payload enum per game,
//! can use [`SignalArgs`]: positional values plus ordered keyword values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalArgs {
    #[serde(default)]
    pub positional: Vec<Value>,
    #[serde(default)]
    pub keywords: IndexMap<String, Value>,
}

impl SignalArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument, replacing any previous value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_keeps_order() {
        let args = SignalArgs::new()
            .arg(1)
            .arg("two")
            .kwarg("z", true)
            .kwarg("a", 3.5);

        assert_eq!(args.get(1), Some(&json!("two")));
        assert_eq!(args.keyword("a"), Some(&json!(3.5)));
        let names: Vec<_> = args.keywords.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn parse_from_json() {
        let args = SignalArgs::from_json(r#"{"positional": [1, 2], "keywords": {"latency": 40}}"#)
            .unwrap();
        assert_eq!(args.positional.len(), 2);
        assert_eq!(args.keyword("latency"), Some(&json!(40)));

        let empty = SignalArgs::from_json("{}").unwrap();
        assert_eq!(empty, SignalArgs::new());
    }
}
