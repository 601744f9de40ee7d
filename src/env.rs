use fnv::FnvHashMap;

use crate::value::Value;

/// Where variables live.
///
/// There is a single global scope for now. Nested scopes would chain environments through a
/// parent and implement this same interface.
pub trait Environment {
    /// Binds `name`, replacing any previous binding.
    fn define(&mut self, name: &str, value: Value);

    fn get(&self, name: &str) -> Option<&Value>;

    /// Rebinds `name`. Assigning a name that was never declared binds it.
    fn assign(&mut self, name: &str, value: Value);
}

/// The global scope, a flat map from names to values.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    symbols: FnvHashMap<String, Value>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Environment for Globals {
    fn define(&mut self, name: &str, value: Value) {
        self.symbols.insert(name.to_owned(), value);
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }

    fn assign(&mut self, name: &str, value: Value) {
        match self.symbols.get_mut(name) {
            Some(slot) => *slot = value,
            None => self.define(name, value),
        }
    }
}
