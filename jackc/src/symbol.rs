//! Scoped symbol tables with per-kind offset counters.
use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::error::SymbolError;

/// Storage kind of a declared variable, deciding which VM segment
/// its offset indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Field,
    Static,
    Arg,
    Local,
}

impl VarKind {
    pub(crate) const COUNT: usize = 4;

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInfo {
    pub kind: VarKind,
    pub var_type: SmolStr,
    pub offset: u16,
}

/// A single scope: name to variable info, plus one monotonic offset
/// counter per variable kind.
#[derive(Debug, Default)]
pub struct SymbolTable {
    name: SmolStr,
    table: BTreeMap<SmolStr, VarInfo>,
    counters: [u16; VarKind::COUNT],
}

impl SymbolTable {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            table: BTreeMap::new(),
            counters: [0; VarKind::COUNT],
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a variable in this table and return its offset.
    ///
    /// Offsets are assigned per kind, starting at 0, in declaration
    /// order.
    pub fn add_var(
        &mut self,
        kind: VarKind,
        var_type: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
    ) -> Result<u16, SymbolError> {
        let name = name.into();
        if self.table.contains_key(&name) {
            return Err(SymbolError::DuplicateName {
                name,
                table: self.name.clone(),
            });
        }

        let offset = self.counters[kind.index()];
        self.counters[kind.index()] += 1;
        self.table.insert(
            name,
            VarInfo {
                kind,
                var_type: var_type.into(),
                offset,
            },
        );
        Ok(offset)
    }

    #[inline]
    pub fn var_info(&self, name: &str) -> Option<&VarInfo> {
        self.table.get(name)
    }

    /// Number of variables of the given kind declared so far.
    #[inline]
    pub fn count(&self, kind: VarKind) -> u16 {
        self.counters[kind.index()]
    }
}

/// Stack of scopes. The innermost table receives declarations;
/// lookups search innermost to outermost.
///
/// In practice the stack is two deep: the class table carrying
/// field/static offsets, and a subroutine table carrying
/// argument/local offsets.
#[derive(Debug, Default)]
pub struct SymbolTableList {
    list: Vec<SymbolTable>,
}

impl SymbolTableList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, name: impl Into<SmolStr>) {
        self.list.push(SymbolTable::new(name));
    }

    /// Pop the innermost table, discarding its declarations and
    /// counters. Popping an empty stack is a no-op.
    pub fn close_table(&mut self) {
        self.list.pop();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Name of the innermost table.
    pub fn name(&self) -> Result<&str, SymbolError> {
        self.list
            .last()
            .map(SymbolTable::name)
            .ok_or(SymbolError::EmptyScope)
    }

    /// Name of the table enclosing the innermost one.
    pub fn parent_name(&self) -> Result<&str, SymbolError> {
        if self.list.len() < 2 {
            return Err(SymbolError::NoParentScope);
        }
        Ok(self.list[self.list.len() - 2].name())
    }

    /// Declare a variable in the innermost table.
    pub fn add_var(
        &mut self,
        kind: VarKind,
        var_type: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
    ) -> Result<u16, SymbolError> {
        self.list
            .last_mut()
            .ok_or(SymbolError::EmptyScope)?
            .add_var(kind, var_type, name)
    }

    /// Look a name up, searching innermost to outermost.
    pub fn var_info(&self, name: &str) -> Result<&VarInfo, SymbolError> {
        self.find(name).ok_or_else(|| SymbolError::Undeclared {
            name: SmolStr::from(name),
        })
    }

    /// Counter of the innermost table for the given kind.
    pub fn count(&self, kind: VarKind) -> Result<u16, SymbolError> {
        self.list
            .last()
            .map(|table| table.count(kind))
            .ok_or(SymbolError::EmptyScope)
    }

    /// Lookup predicate; never fails.
    #[inline]
    pub fn is_var(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn find(&self, name: &str) -> Option<&VarInfo> {
        self.list.iter().rev().find_map(|table| table.var_info(name))
    }
}
