//! Identifiers and the symbol table that owns them.
//!
//! An [`Identifier`] is the handle the SSA builder uses as the key for
//! `current_def`/`incomplete_phis`: two declarations with the same source
//! name in different scopes get distinct [`IdentId`]s, so shadowing falls
//! out for free.

use std::cell::Cell;
use std::collections::HashMap;

use mucc_util::{Idx, IndexVec, Symbol};

use crate::types::Type;

mucc_util::define_idx!(IdentId);

/// Opaque handle to a stack allocation, written by the emitter for array
/// identifiers only. The emitter/codegen layer (`mucc-mir`) is the only
/// consumer that interprets the numeric value; this crate just stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocId(pub u32);

/// A declared name: a function parameter, a local scalar, or a local array.
///
/// Produced by the symbol table, never constructed directly by the emitter.
#[derive(Debug)]
pub struct Identifier {
    pub id: IdentId,
    pub name: Symbol,
    pub ty: Type,
    /// Stack allocation for array identifiers with a known count. `None`
    /// until the emitter installs it; scalars never get one (§3, P. array
    /// invariant).
    address: Cell<Option<AllocId>>,
}

impl Identifier {
    pub fn is_array(&self) -> bool {
        self.ty.is_array()
    }

    pub fn array_count(&self) -> Option<u32> {
        self.ty.array_count()
    }

    /// Placeholder produced during parser error recovery; the emitter skips
    /// semantic checks against it. Modeled here as an identifier named with
    /// the empty symbol and `Type::Void`.
    pub fn is_dummy(&self) -> bool {
        self.name.is_empty() && self.ty == Type::Void
    }

    pub fn address(&self) -> Option<AllocId> {
        self.address.get()
    }

    /// Record the identifier's stack allocation. Only meaningful for array
    /// identifiers; called exactly once, by the entry-block emission step.
    pub fn set_address(&self, alloc: AllocId) {
        debug_assert!(self.is_array(), "only arrays get a stack allocation");
        self.address.set(Some(alloc));
    }
}

/// A single lexical scope ("rib"), chained to its parent.
struct Rib {
    bindings: HashMap<Symbol, IdentId>,
    parent: Option<usize>,
}

/// Owns every [`Identifier`] declared while compiling one translation unit,
/// plus the scope chain used to resolve names to identifiers while building
/// test/debug ASTs (the real parser would have already done this resolution
/// before handing the emitter its AST).
pub struct SymbolTable {
    idents: IndexVec<IdentId, Identifier>,
    ribs: Vec<Rib>,
    current: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            idents: IndexVec::new(),
            ribs: vec![Rib {
                bindings: HashMap::new(),
                parent: None,
            }],
            current: 0,
        }
    }

    pub fn enter_scope(&mut self) {
        self.ribs.push(Rib {
            bindings: HashMap::new(),
            parent: Some(self.current),
        });
        self.current = self.ribs.len() - 1;
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.ribs[self.current].parent {
            self.current = parent;
        }
    }

    /// Declare a new identifier in the current scope, shadowing any outer
    /// binding of the same name.
    pub fn declare(&mut self, name: Symbol, ty: Type) -> IdentId {
        let id = IdentId::from_usize(self.idents.len());
        let pushed = self.idents.push(Identifier {
            id,
            name,
            ty,
            address: Cell::new(None),
        });
        debug_assert_eq!(id, pushed);
        self.ribs[self.current].bindings.insert(name, id);
        id
    }

    /// Resolve a name by walking outward through enclosing scopes.
    pub fn lookup(&self, name: Symbol) -> Option<IdentId> {
        let mut rib = self.current;
        loop {
            if let Some(&id) = self.ribs[rib].bindings.get(&name) {
                return Some(id);
            }
            match self.ribs[rib].parent {
                Some(parent) => rib = parent,
                None => return None,
            }
        }
    }

    /// `get_identifier` from the external interface contract (§6): resolve
    /// by name, returning the dummy-equivalent `None` only if the parser
    /// never declared this name (a compiler bug in this crate's tests, since
    /// the real parser guarantees resolution before invoking the emitter).
    pub fn get_identifier(&self, name: Symbol) -> Option<&Identifier> {
        self.lookup(name).map(|id| &self.idents[id])
    }

    pub fn get(&self, id: IdentId) -> &Identifier {
        &self.idents[id]
    }
}
