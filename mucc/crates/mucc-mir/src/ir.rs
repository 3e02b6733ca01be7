//! The SSA-form IR: values, instructions, blocks, functions, and modules.
//!
//! Everything that can be referenced lives in an arena owned by its
//! enclosing [`Function`] (instructions, blocks) or [`Module`] (functions,
//! global strings), addressed by a stable, never-reused index. There are no
//! owning pointers between IR nodes; a "use" is just another index, and
//! removing a value means detaching it from every index that names it.

use mucc_util::{Idx, IndexVec, Symbol};

use mucc_sem::Type;

mucc_util::define_idx!(InstId);
mucc_util::define_idx!(BlockId);
mucc_util::define_idx!(FuncId);
mucc_util::define_idx!(GlobalId);

/// A use of a value. Constants and arguments are carried by value; an
/// instruction result is referenced by its arena index so replace-all-uses
/// can rewrite every occurrence without walking the whole function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Constant { ty: Type, bits: i64 },
    Argument(u32),
    Inst(InstId),
    GlobalString(GlobalId),
}

impl Value {
    pub fn const_int(bits: i64) -> Value {
        Value::Constant { ty: Type::Int, bits }
    }

    pub fn const_i1(b: bool) -> Value {
        Value::Constant { ty: Type::Int, bits: b as i64 }
    }

    pub fn as_const(&self) -> Option<i64> {
        match self {
            Value::Constant { bits, .. } => Some(*bits),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Slt,
    Sgt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
}

/// A single PHI incoming pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incoming {
    pub value: Value,
    pub pred: BlockId,
}

/// One instruction. `result_ty` is the type of the value the instruction
/// produces; instructions with no result (`Store`, `Call` to a void
/// function, the terminators) carry `Type::Void`.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub block: BlockId,
    pub result_ty: Type,
    pub kind: InstKind,
}

#[derive(Debug, Clone)]
pub enum InstKind {
    Phi(Vec<Incoming>),
    Math { op: MathOp, lhs: Value, rhs: Value },
    Cmp { op: CmpOp, lhs: Value, rhs: Value },
    /// Zero-extend an `i1` compare/logical result up to `i32`.
    ZExt(Value),
    Not(Value),
    IntCast(Value),
    CharCast(Value),
    /// Entry-block stack allocation for one array local.
    Alloca { local: LocalId, element_ty: Type, count: u32 },
    /// `array[index]`: computed address, used only for array element access.
    Gep { base: Value, index: Value },
    Load(Value),
    Store { addr: Value, value: Value },
    Call { callee: Symbol, args: Vec<Value> },
    Br(BlockId),
    CondBr { cond: Value, then_block: BlockId, else_block: BlockId },
    Ret(Option<Value>),
}

impl InstKind {
    pub fn is_terminator(&self) -> bool {
        matches!(self, InstKind::Br(_) | InstKind::CondBr { .. } | InstKind::Ret(_))
    }

    /// Operands of this instruction as uses, for invariant-checking and LICM.
    pub fn operands(&self) -> Vec<Value> {
        match self {
            InstKind::Phi(incoming) => incoming.iter().map(|i| i.value).collect(),
            InstKind::Math { lhs, rhs, .. } | InstKind::Cmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstKind::ZExt(v) | InstKind::Not(v) | InstKind::IntCast(v) | InstKind::CharCast(v) => {
                vec![*v]
            }
            InstKind::Gep { base, index } => vec![*base, *index],
            InstKind::Load(v) => vec![*v],
            InstKind::Store { addr, value } => vec![*addr, *value],
            InstKind::Call { args, .. } => args.clone(),
            InstKind::Alloca { .. } => vec![],
            InstKind::Br(_) => vec![],
            InstKind::CondBr { cond, .. } => vec![*cond],
            InstKind::Ret(v) => v.iter().copied().collect(),
        }
    }

    /// Rewrite every operand matching `from` to `to` in place.
    pub fn replace_uses(&mut self, from: Value, to: Value) {
        let swap = |v: &mut Value| {
            if *v == from {
                *v = to;
            }
        };
        match self {
            InstKind::Phi(incoming) => incoming.iter_mut().for_each(|i| swap(&mut i.value)),
            InstKind::Math { lhs, rhs, .. } | InstKind::Cmp { lhs, rhs, .. } => {
                swap(lhs);
                swap(rhs);
            }
            InstKind::ZExt(v) | InstKind::Not(v) | InstKind::IntCast(v) | InstKind::CharCast(v) => {
                swap(v)
            }
            InstKind::Gep { base, index } => {
                swap(base);
                swap(index);
            }
            InstKind::Load(v) => swap(v),
            InstKind::Store { addr, value } => {
                swap(addr);
                swap(value);
            }
            InstKind::Call { args, .. } => args.iter_mut().for_each(swap),
            InstKind::Alloca { .. } => {}
            InstKind::Br(_) => {}
            InstKind::CondBr { cond, .. } => swap(cond),
            InstKind::Ret(v) => {
                if let Some(v) = v {
                    swap(v)
                }
            }
        }
    }
}

/// A straight-line sequence of instructions ending in exactly one
/// terminator. `insts` holds every instruction including the terminator, in
/// order; PHIs (if any) are always a prefix.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    pub insts: Vec<InstId>,
    pub preds: Vec<BlockId>,
    /// Set by [`Function::remove_block`]. A dead block's arena slot stays
    /// in place (indices are never reused) but it is skipped by
    /// [`Function::block_ids`] and carries no instructions or predecessors.
    pub dead: bool,
}

impl BasicBlock {
    pub fn terminator<'a>(&self, pool: &'a IndexVec<InstId, Instruction>) -> &'a Instruction {
        let last = *self.insts.last().expect("block has no terminator");
        &pool[last]
    }
}

/// One stack-allocated local: an array identifier with a known element
/// count. Scalars never appear here (they live purely in SSA values).
#[derive(Debug, Clone)]
pub struct Local {
    pub name: Symbol,
    pub element_ty: Type,
    pub count: u32,
}

mucc_util::define_idx!(LocalId);

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub params: Vec<Type>,
    pub return_ty: Type,
    pub entry: BlockId,
    pub blocks: IndexVec<BlockId, BasicBlock>,
    pub insts: IndexVec<InstId, Instruction>,
    pub locals: IndexVec<LocalId, Local>,
    /// Stack address value for each local, set once during entry emission.
    pub local_addrs: IndexVec<LocalId, Value>,
    /// `true` for a declared-but-not-defined function (only `printf` in
    /// this crate); such a function has no blocks and is never optimized.
    pub is_extern: bool,
}

impl Function {
    pub fn new(name: Symbol, params: Vec<Type>, return_ty: Type) -> Self {
        Self {
            name,
            params,
            return_ty,
            entry: BlockId::from_usize(0),
            blocks: IndexVec::new(),
            insts: IndexVec::new(),
            locals: IndexVec::new(),
            local_addrs: IndexVec::new(),
            is_extern: false,
        }
    }

    pub fn new_extern(name: Symbol, params: Vec<Type>, return_ty: Type) -> Self {
        Self { is_extern: true, ..Self::new(name, params, return_ty) }
    }

    /// Create a new, predecessor-less block.
    pub fn add_block(&mut self) -> BlockId {
        self.blocks.push(BasicBlock::default())
    }

    /// Record a CFG edge; call once per terminator operand that names a
    /// target block.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[to].preds.push(from);
    }

    /// Append a non-PHI instruction (including terminators) to the end of
    /// `block`.
    pub fn push_inst(&mut self, block: BlockId, result_ty: Type, kind: InstKind) -> InstId {
        let id = self.insts.push(Instruction { block, result_ty, kind });
        self.blocks[block].insts.push(id);
        id
    }

    /// Insert an empty PHI at the head of `block` (ahead of any other PHIs
    /// already there, matching arbitrary insertion order — callers only
    /// depend on PHIs being a prefix of the block, not their relative
    /// order).
    pub fn prepend_phi(&mut self, block: BlockId, ty: Type) -> InstId {
        let id = self.insts.push(Instruction { block, result_ty: ty, kind: InstKind::Phi(Vec::new()) });
        self.blocks[block].insts.insert(0, id);
        id
    }

    /// Remove an instruction from its block's instruction list. The arena
    /// slot is left in place (tombstoned by no longer being referenced from
    /// any block) since `IndexVec` indices must stay stable.
    pub fn remove_inst(&mut self, id: InstId) {
        let block = self.insts[id].block;
        self.blocks[block].insts.retain(|&i| i != id);
    }

    /// Erase an unreachable block (`DeadBlocks`, §4.3.3). Callers must have
    /// already dropped `id` from every successor's predecessor list (and
    /// fixed up any PHIs there) before calling this — erasure itself just
    /// tombstones the block's own slot.
    pub fn remove_block(&mut self, id: BlockId) {
        self.blocks[id].insts.clear();
        self.blocks[id].preds.clear();
        self.blocks[id].dead = true;
    }

    /// Collapse `phi` to its single non-self incoming value if one exists,
    /// rewriting every use and recursively simplifying any PHI that used
    /// it. If every incoming is the PHI itself, it is left in place as a
    /// placeholder. Shared between the SSA builder (trivial PHIs produced
    /// during construction) and the optimizer's CFG-editing passes
    /// (trivial PHIs produced by dropping an incoming predecessor).
    pub fn try_remove_trivial_phi(&mut self, phi: InstId) -> Value {
        let incoming = match &self.insts[phi].kind {
            InstKind::Phi(incoming) => incoming.clone(),
            _ => unreachable!("try_remove_trivial_phi called on a non-PHI"),
        };
        let phi_value = Value::Inst(phi);

        let mut same: Option<Value> = None;
        for inc in &incoming {
            if inc.value == phi_value || Some(inc.value) == same {
                continue;
            }
            if same.is_some() {
                return phi_value; // merges at least two distinct values: not trivial
            }
            same = Some(inc.value);
        }
        let Some(same) = same else {
            return phi_value; // every incoming is self-referential; keep as placeholder
        };

        let phi_users: Vec<InstId> = self
            .users_of(phi)
            .into_iter()
            .filter(|id| matches!(self.insts[*id].kind, InstKind::Phi(_)))
            .collect();

        self.replace_all_uses(phi_value, same);
        self.remove_inst(phi);

        for user in phi_users {
            if user != phi {
                self.try_remove_trivial_phi(user);
            }
        }
        same
    }

    /// Replace every use of `from` with `to` across the whole function.
    pub fn replace_all_uses(&mut self, from: Value, to: Value) {
        for inst in self.insts.as_mut_slice().iter_mut() {
            inst.kind.replace_uses(from, to);
        }
    }

    /// Instructions (including PHIs and the terminator) whose operands
    /// reference `target`, paired with their id.
    pub fn users_of(&self, target: InstId) -> Vec<InstId> {
        self.insts
            .iter_enumerated()
            .filter(|(id, inst)| *id != target && inst.kind.operands().contains(&Value::Inst(target)))
            .map(|(id, _)| id)
            .collect()
    }

    /// Every live block, in arena order. Blocks erased by
    /// [`remove_block`](Self::remove_block) keep their arena slot
    /// (indices never get reused) but are skipped here, so every other
    /// traversal that starts from `block_ids` never sees them.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter_enumerated().filter(|(_, b)| !b.dead).map(|(id, _)| id)
    }

    /// Successors of a block, read off its terminator.
    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        match &self.blocks[block].terminator(&self.insts).kind {
            InstKind::Br(target) => vec![*target],
            InstKind::CondBr { then_block, else_block, .. } => vec![*then_block, *else_block],
            InstKind::Ret(_) => vec![],
            _ => unreachable!("block not terminated by a terminator instruction"),
        }
    }

    pub fn phis(&self, block: BlockId) -> impl Iterator<Item = InstId> + '_ {
        self.blocks[block]
            .insts
            .iter()
            .copied()
            .take_while(move |id| matches!(self.insts[*id].kind, InstKind::Phi(_)))
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub functions: IndexVec<FuncId, Function>,
    pub globals: IndexVec<GlobalId, Symbol>,
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl Module {
    pub fn new() -> Self {
        Self { functions: IndexVec::new(), globals: IndexVec::new() }
    }

    pub fn intern_global(&mut self, s: Symbol) -> GlobalId {
        if let Some((id, _)) = self.globals.iter_enumerated().find(|(_, g)| **g == s) {
            return id;
        }
        self.globals.push(s)
    }

    pub fn find_function(&self, name: Symbol) -> Option<FuncId> {
        self.functions.iter_enumerated().find(|(_, f)| f.name == name).map(|(id, _)| id)
    }
}
