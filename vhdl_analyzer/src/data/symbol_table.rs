// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use fnv::FnvHashMap;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An interned identifier.
///
/// Symbols compare by id, the spelling is kept for display.
#[derive(Clone, Debug, Eq)]
pub struct Symbol {
    id: usize,
    name: Arc<str>,
}

impl Symbol {
    /// The identifier as written
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_extended(&self) -> bool {
        self.name.starts_with('\\')
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.id.hash(hasher);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Basic identifiers are case insensitive, extended identifiers (`\Foo\`) are not
fn normalize(name: &str) -> Cow<'_, str> {
    if name.starts_with('\\') || !name.chars().any(char::is_uppercase) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_lowercase())
    }
}

/// Gives every identifier an id shared by all of its spellings.
/// The table is shared between threads and only grows.
#[derive(Default)]
pub struct SymbolTable {
    ids: RwLock<FnvHashMap<Arc<str>, usize>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        let id = *self.ids.read().get(&*normalize(name))?;
        Some(Symbol {
            id,
            name: Arc::from(name),
        })
    }

    /// The symbol of `name`, allocating a new id on first use
    pub fn insert(&self, name: &str) -> Symbol {
        if let Some(symbol) = self.lookup(name) {
            return symbol;
        }
        let mut ids = self.ids.write();
        let next = ids.len();
        let id = *ids.entry(Arc::from(normalize(name))).or_insert(next);
        Symbol {
            id,
            name: Arc::from(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn spellings_share_a_symbol() {
        let symbols = SymbolTable::new();
        let first = symbols.insert("Clk");
        let second = symbols.insert("CLK");
        assert_eq!(first, second);
        assert_eq!(first.name(), "Clk");
        assert_eq!(second.to_string(), "CLK");
        assert_eq!(symbols.lookup("clk"), Some(first));
        assert_eq!(symbols.lookup("rst"), None);
    }

    #[test]
    fn extended_identifiers_keep_their_case() {
        let symbols = SymbolTable::new();
        let lower = symbols.insert("\\clk\\");
        assert!(lower.is_extended());
        assert_ne!(lower, symbols.insert("\\CLK\\"));
        assert_eq!(lower, symbols.insert("\\clk\\"));
        assert_ne!(lower, symbols.insert("clk"));
    }

    #[test]
    fn inserts_from_many_threads_agree() {
        let symbols = &SymbolTable::new();
        let found: Vec<Symbol> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["data", "DATA", "Data", "dAtA"]
                .into_iter()
                .map(|name| scope.spawn(move || symbols.insert(name)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });
        assert!(found.iter().all(|symbol| *symbol == found[0]));
    }
}
