//! Scoped symbol table used during checking.

use rive_core::types::TypeId;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub type_id: TypeId,
    pub mutable: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, type_id: TypeId, mutable: bool) -> Self {
        Self {
            name: name.into(),
            type_id,
            mutable,
        }
    }
}

/// A stack of lexical scopes; lookups walk innermost-out, shadowing is
/// allowed across scopes but not within one.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot exit the global scope");
        self.scopes.pop();
    }

    /// Defines `symbol` in the current scope; rejects redefinition within
    /// the same scope.
    pub fn define(&mut self, symbol: Symbol) -> Result<(), String> {
        let scope = self
            .scopes
            .last_mut()
            .expect("symbol table always has a scope");
        if scope.contains_key(&symbol.name) {
            return Err(format!(
                "`{}` is already defined in this scope",
                symbol.name
            ));
        }
        scope.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_across_scopes_resolves_innermost_first() {
        let mut table = SymbolTable::new();
        table
            .define(Symbol::new("x", TypeId::INT, false))
            .expect("define");

        table.enter_scope();
        table
            .define(Symbol::new("x", TypeId::TEXT, true))
            .expect("shadow");
        assert_eq!(table.lookup("x").unwrap().type_id, TypeId::TEXT);

        table.exit_scope();
        assert_eq!(table.lookup("x").unwrap().type_id, TypeId::INT);
    }

    #[test]
    fn redefinition_in_the_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        table
            .define(Symbol::new("x", TypeId::INT, false))
            .expect("define");
        assert!(table.define(Symbol::new("x", TypeId::INT, false)).is_err());
    }

    #[test]
    fn unknown_names_resolve_to_none() {
        let table = SymbolTable::new();
        assert!(table.lookup("missing").is_none());
    }
}
