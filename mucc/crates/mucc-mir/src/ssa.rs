//! On-the-fly SSA construction (Braun, Buchwald, Hack — "Simple and
//! Efficient Construction of Static Single Assignment Form").
//!
//! The builder tracks, per (identifier, block), the reaching definition of
//! that identifier at the end of the block. Reads that cross block
//! boundaries insert PHIs lazily; PHIs created in a not-yet-sealed block are
//! left with deferred operands until [`SsaBuilder::seal_block`] fills them
//! in, at which point the back-edge (if any) is finally known.

use mucc_util::FxHashMap;

use mucc_sem::{IdentId, SymbolTable};

use crate::ir::{BlockId, Function, InstId, InstKind, Value};

#[derive(Default)]
pub struct SsaBuilder {
    current_def: FxHashMap<(IdentId, BlockId), Value>,
    sealed: std::collections::HashSet<BlockId>,
    incomplete_phis: FxHashMap<BlockId, Vec<(IdentId, InstId)>>,
}

impl SsaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all state; called at the start of each function.
    pub fn reset(&mut self) {
        self.current_def.clear();
        self.sealed.clear();
        self.incomplete_phis.clear();
    }

    /// Register a new block with the builder. Blocks added sealed (the
    /// common case: single-predecessor blocks whose predecessor is already
    /// known) commit their PHIs immediately; everything else defers until
    /// [`seal_block`](Self::seal_block).
    pub fn add_block(&mut self, func: &mut Function, sealed: bool) -> BlockId {
        let block = func.add_block();
        if sealed {
            self.sealed.insert(block);
        }
        block
    }

    pub fn write_variable(&mut self, v: IdentId, b: BlockId, value: Value) {
        self.current_def.insert((v, b), value);
    }

    pub fn read_variable(
        &mut self,
        func: &mut Function,
        table: &SymbolTable,
        v: IdentId,
        b: BlockId,
    ) -> Value {
        if let Some(&value) = self.current_def.get(&(v, b)) {
            return value;
        }
        self.read_variable_recursive(func, table, v, b)
    }

    fn read_variable_recursive(
        &mut self,
        func: &mut Function,
        table: &SymbolTable,
        v: IdentId,
        b: BlockId,
    ) -> Value {
        let ty = table.get(v).ty.clone();
        let value = if !self.sealed.contains(&b) {
            let phi = func.prepend_phi(b, ty);
            self.incomplete_phis.entry(b).or_default().push((v, phi));
            Value::Inst(phi)
        } else if func.blocks[b].preds.len() == 1 {
            let pred = func.blocks[b].preds[0];
            self.read_variable(func, table, v, pred)
        } else {
            let phi = func.prepend_phi(b, ty);
            let placeholder = Value::Inst(phi);
            // Write the placeholder first to break cycles in recursive reads
            // triggered by add_phi_operands below.
            self.write_variable(v, b, placeholder);
            self.add_phi_operands(func, table, v, phi)
        };
        self.write_variable(v, b, value);
        value
    }

    fn add_phi_operands(
        &mut self,
        func: &mut Function,
        table: &SymbolTable,
        v: IdentId,
        phi: InstId,
    ) -> Value {
        let block = func.insts[phi].block;
        let preds = func.blocks[block].preds.clone();
        let mut incoming = Vec::with_capacity(preds.len());
        for pred in preds {
            let value = self.read_variable(func, table, v, pred);
            incoming.push(crate::ir::Incoming { value, pred });
        }
        func.insts[phi].kind = InstKind::Phi(incoming);
        func.try_remove_trivial_phi(phi)
    }

    /// Finalize every PHI left incomplete in `b`, then mark it sealed. Must
    /// be called exactly once `b`'s full predecessor set is known — for a
    /// loop header, that means after the back-edge has been linked.
    pub fn seal_block(&mut self, func: &mut Function, table: &SymbolTable, b: BlockId) {
        if let Some(pending) = self.incomplete_phis.remove(&b) {
            for (v, phi) in pending {
                self.add_phi_operands(func, table, v, phi);
            }
        }
        self.sealed.insert(b);
    }

    pub fn is_sealed(&self, b: BlockId) -> bool {
        self.sealed.contains(&b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mucc_sem::{SymbolTable, Type};
    use mucc_util::Symbol;

    #[test]
    fn single_predecessor_read_needs_no_phi() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let mut ssa = SsaBuilder::new();
        let mut table = SymbolTable::new();
        let x = table.declare(Symbol::intern("x"), Type::Int);

        let entry = ssa.add_block(&mut func, true);
        ssa.write_variable(x, entry, Value::const_int(7));
        let next = ssa.add_block(&mut func, false);
        func.add_edge(entry, next);
        ssa.seal_block(&mut func, &table, next);

        let read = ssa.read_variable(&mut func, &table, x, next);
        assert_eq!(read, Value::const_int(7));
    }

    #[test]
    fn diamond_merge_inserts_phi() {
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let mut ssa = SsaBuilder::new();
        let mut table = SymbolTable::new();
        let y = table.declare(Symbol::intern("y"), Type::Int);

        let entry = ssa.add_block(&mut func, true);
        let then_b = ssa.add_block(&mut func, false);
        let else_b = ssa.add_block(&mut func, false);
        let merge = ssa.add_block(&mut func, false);

        func.add_edge(entry, then_b);
        func.add_edge(entry, else_b);
        ssa.seal_block(&mut func, &table, then_b);
        ssa.seal_block(&mut func, &table, else_b);

        ssa.write_variable(y, then_b, Value::const_int(1));
        ssa.write_variable(y, else_b, Value::const_int(2));

        func.add_edge(then_b, merge);
        func.add_edge(else_b, merge);
        ssa.seal_block(&mut func, &table, merge);

        let read = ssa.read_variable(&mut func, &table, y, merge);
        match read {
            Value::Inst(id) => match &func.insts[id].kind {
                InstKind::Phi(incoming) => {
                    assert_eq!(incoming.len(), 2);
                }
                _ => panic!("expected a PHI"),
            },
            _ => panic!("expected a PHI value"),
        }
    }

    #[test]
    fn loop_header_phi_becomes_trivial_when_unchanged() {
        // while (1) { } with a variable never written in the loop: the
        // header PHI merges the same incoming value from both predecessors
        // and must collapse.
        let mut func = Function::new(Symbol::intern("f"), vec![], Type::Int);
        let mut ssa = SsaBuilder::new();
        let mut table = SymbolTable::new();
        let z = table.declare(Symbol::intern("z"), Type::Int);

        let entry = ssa.add_block(&mut func, true);
        ssa.write_variable(z, entry, Value::const_int(5));
        let header = ssa.add_block(&mut func, false); // unsealed: back-edge pending
        func.add_edge(entry, header);

        let body = ssa.add_block(&mut func, false);
        let read_in_header = ssa.read_variable(&mut func, &table, z, header);
        assert!(matches!(read_in_header, Value::Inst(_)), "unsealed read must be a PHI placeholder");
        func.add_edge(header, body);
        ssa.seal_block(&mut func, &table, body);

        func.add_edge(body, header);
        ssa.seal_block(&mut func, &table, header);

        // once the back-edge is linked and the header sealed, the PHI only
        // ever merges the constant `5` with itself and collapses away.
        let read_after_seal = ssa.read_variable(&mut func, &table, z, header);
        assert_eq!(read_after_seal, Value::const_int(5));
    }
}
