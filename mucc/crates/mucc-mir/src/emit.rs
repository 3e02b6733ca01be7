//! Walks a validated AST and emits SSA-form IR, consulting the SSA builder
//! for every named-variable read/write.
//!
//! Scalars never get a stack slot: a scalar local is pure bookkeeping in the
//! symbol table, and every read/write of it goes through
//! [`SsaBuilder`](crate::ssa::SsaBuilder). Arrays get exactly one entry-block
//! allocation and are accessed with `Gep`/`Load`/`Store`.

use mucc_util::Symbol;

use mucc_sem::ast::{CmpOp as AstCmpOp, Expr, MathOp as AstMathOp, Program, Stmt};
use mucc_sem::{IdentId, SymbolTable, Type};

use crate::ir::{self, BlockId, CmpOp, Incoming, InstKind, MathOp, Module, Value};
use crate::ssa::SsaBuilder;

pub struct EmitContext<'a> {
    table: &'a SymbolTable,
    module: Module,
    func: ir::Function,
    ssa: SsaBuilder,
    current_block: BlockId,
    printf: Option<Symbol>,
}

/// Emit an entire program: the global string table is built lazily as
/// string literals are encountered, `printf` is declared the first time it
/// is referenced, then every function is emitted in order.
pub fn emit_program(table: &SymbolTable, program: &Program) -> Module {
    let mut module = Module::new();
    for function in &program.functions {
        let built = emit_function(table, &mut module, function);
        module.functions.push(built);
    }
    module
}

fn emit_function(
    table: &SymbolTable,
    module: &mut Module,
    function: &mucc_sem::ast::Function,
) -> ir::Function {
    let param_tys: Vec<Type> = function.args.iter().map(|a| table.get(a.ident).ty.decay()).collect();
    let mut func = ir::Function::new(function.name, param_tys, function.ret_ty.clone());
    let mut ssa = SsaBuilder::new();
    ssa.reset();

    let entry = ssa.add_block(&mut func, true);
    func.entry = entry;

    for (i, arg) in function.args.iter().enumerate() {
        ssa.write_variable(arg.ident, entry, Value::Argument(i as u32));
    }

    for decl_ident in collect_local_arrays(&function.body) {
        let ident = table.get(decl_ident);
        if !ident.is_array() {
            continue;
        }
        let element_ty = ident.ty.element_type().expect("array identifier");
        let count = ident.array_count().expect("array identifier");
        let local = func.locals.push(ir::Local { name: ident.name, element_ty: element_ty.clone(), count });
        let addr_ty = Type::pointer(element_ty.clone());
        let addr = func.push_inst(entry, addr_ty, InstKind::Alloca { local, element_ty, count });
        func.local_addrs.push(Value::Inst(addr));
        ident.set_address(mucc_sem::AllocId(local.0));
    }

    let mut ctx = EmitContext { table, module: std::mem::take(module), func, ssa, current_block: entry, printf: None };
    let current_block = ctx.emit_stmt(&function.body, entry);

    // A well-formed AST always ends every path in `return`; if control
    // reaches here unterminated (e.g. a `void` function falling off the
    // end), close the block off explicitly.
    if !ctx.block_terminated(current_block) {
        let ret = if function.ret_ty == Type::Void { None } else { Some(Value::const_int(0)) };
        ctx.func.push_inst(current_block, Type::Void, InstKind::Ret(ret));
    }

    let EmitContext { module: built_module, func: built_func, .. } = ctx;
    *module = built_module;
    built_func
}

/// Recursively collect every array identifier declared anywhere in `stmt`,
/// so its single entry-block allocation can be emitted before the body
/// walk begins.
fn collect_local_arrays(stmt: &Stmt) -> Vec<IdentId> {
    let mut out = Vec::new();
    collect_local_arrays_into(stmt, &mut out);
    out
}

fn collect_local_arrays_into(stmt: &Stmt, out: &mut Vec<IdentId>) {
    match stmt {
        Stmt::Decl { ident, .. } => {
            // The caller checks array-ness via the symbol table at the call
            // site that allocates; here we just record every declared name
            // and let `emit_function` filter by `is_array`.
            out.push(*ident);
        }
        Stmt::Compound(stmts) => stmts.iter().for_each(|s| collect_local_arrays_into(s, out)),
        Stmt::If { then_branch, else_branch, .. } => {
            collect_local_arrays_into(then_branch, out);
            if let Some(e) = else_branch {
                collect_local_arrays_into(e, out);
            }
        }
        Stmt::While { body, .. } => collect_local_arrays_into(body, out),
        Stmt::Return(_) | Stmt::ExprStmt(_) | Stmt::Assign { .. } | Stmt::AssignArray { .. } | Stmt::Null => {}
    }
}

impl<'a> EmitContext<'a> {
    fn block_terminated(&self, block: BlockId) -> bool {
        self.func.blocks[block].insts.last().is_some_and(|id| self.func.insts[*id].kind.is_terminator())
    }

    fn push(&mut self, ty: Type, kind: InstKind) -> Value {
        Value::Inst(self.func.push_inst(self.current_block, ty, kind))
    }

    fn new_block(&mut self, sealed: bool) -> BlockId {
        self.ssa.add_block(&mut self.func, sealed)
    }

    fn seal(&mut self, block: BlockId) {
        self.ssa.seal_block(&mut self.func, self.table, block);
    }

    fn br_to(&mut self, target: BlockId) {
        self.func.push_inst(self.current_block, Type::Void, InstKind::Br(target));
        self.func.add_edge(self.current_block, target);
    }

    /// Emit one statement starting in `block`; returns the block execution
    /// continues in afterward (for straight-line statements, the same
    /// block; for control-flow statements, the merge/exit block).
    fn emit_stmt(&mut self, stmt: &Stmt, block: BlockId) -> BlockId {
        self.current_block = block;
        match stmt {
            Stmt::Null => self.current_block,
            Stmt::Decl { ident, init } => {
                // Arrays already got their entry-block allocation in the
                // pre-pass; a `Decl` for one is pure bookkeeping here.
                if let (Some(init), false) = (init, self.table.get(*ident).is_array()) {
                    let value = self.emit_expr(init);
                    self.ssa.write_variable(*ident, self.current_block, value);
                }
                self.current_block
            }
            Stmt::Compound(stmts) => {
                let mut block = self.current_block;
                for s in stmts {
                    block = self.emit_stmt(s, block);
                }
                block
            }
            Stmt::ExprStmt(expr) => {
                self.emit_expr(expr);
                self.current_block
            }
            Stmt::Assign { target, value } => {
                let value = self.emit_expr(value);
                self.ssa.write_variable(*target, self.current_block, value);
                self.current_block
            }
            Stmt::AssignArray { array, index, value } => {
                let index_value = self.emit_expr(index);
                let value_value = self.emit_expr(value);
                let base = self.array_base(*array);
                let addr = self.push(Type::pointer(self.table.get(*array).ty.element_type().unwrap()), InstKind::Gep { base, index: index_value });
                self.push(Type::Void, InstKind::Store { addr, value: value_value });
                self.current_block
            }
            Stmt::Return(value) => {
                let value = value.as_ref().map(|e| self.emit_expr(e));
                self.func.push_inst(self.current_block, Type::Void, InstKind::Ret(value));
                self.current_block
            }
            Stmt::If { cond, then_branch, else_branch } => self.emit_if(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body } => self.emit_while(cond, body),
        }
    }

    fn array_base(&mut self, array: IdentId) -> Value {
        let alloc = self.table.get(array).address().expect("array identifier missing its allocation");
        self.func.local_addrs[ir::LocalId(alloc.0)]
    }

    fn emit_if(&mut self, cond: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> BlockId {
        let cond_value = self.emit_cond(cond);
        let then_block = self.new_block(false);
        let else_block = else_branch.map(|_| self.new_block(false));
        let end_block = self.new_block(false);
        let else_target = else_block.unwrap_or(end_block);

        self.func.push_inst(
            self.current_block,
            Type::Void,
            InstKind::CondBr { cond: cond_value, then_block, else_block: else_target },
        );
        self.func.add_edge(self.current_block, then_block);
        self.func.add_edge(self.current_block, else_target);
        // `then`/`else` gain exactly one predecessor (this block), known now.
        self.seal(then_block);
        if let Some(else_block) = else_block {
            self.seal(else_block);
        }

        self.current_block = then_block;
        let then_end = self.emit_stmt(then_branch, then_block);
        self.current_block = then_end;
        if !self.block_terminated(then_end) {
            self.br_to(end_block);
        }

        if let Some(else_branch) = else_branch {
            let else_block = else_block.unwrap();
            self.current_block = else_block;
            let else_end = self.emit_stmt(else_branch, else_block);
            self.current_block = else_end;
            if !self.block_terminated(else_end) {
                self.br_to(end_block);
            }
        }

        // every arrival at `end` is now installed.
        self.seal(end_block);
        self.current_block = end_block;
        end_block
    }

    fn emit_while(&mut self, cond: &Expr, body: &Stmt) -> BlockId {
        let cond_block = self.new_block(false); // gains a back-edge later
        let body_block = self.new_block(false);
        let end_block = self.new_block(false);

        self.br_to(cond_block);

        self.current_block = cond_block;
        let cond_value = self.emit_cond(cond);
        self.func.push_inst(
            cond_block,
            Type::Void,
            InstKind::CondBr { cond: cond_value, then_block: body_block, else_block: end_block },
        );
        self.func.add_edge(cond_block, body_block);
        self.func.add_edge(cond_block, end_block);
        // `end`'s only arrival (so far) is the false edge out of `cond`.
        self.seal(end_block);
        // `body`'s only predecessor is `cond`, already known; it gains no
        // further predecessors since the back edge targets `cond`, not `body`.
        self.seal(body_block);

        self.current_block = body_block;
        let body_end = self.emit_stmt(body, body_block);
        self.current_block = body_end;
        if !self.block_terminated(body_end) {
            self.br_to(cond_block);
        }
        // the back edge is now linked: `cond`'s full predecessor set is known.
        self.seal(cond_block);

        self.current_block = end_block;
        end_block
    }

    /// Emit `expr` and reduce it to an `i1`-equivalent condition (`!= 0`);
    /// callers zero-extend comparisons already, so this only needs to
    /// introduce a comparison when the expression is a plain integer value.
    fn emit_cond(&mut self, expr: &Expr) -> Value {
        let value = self.emit_expr(expr);
        self.push(Type::Int, InstKind::Cmp { op: CmpOp::Ne, lhs: value, rhs: Value::const_int(0) })
    }

    fn emit_expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Constant(v) => Value::const_int(*v),
            Expr::StringLit(sym) => {
                let id = self.module.intern_global(*sym);
                Value::GlobalString(id)
            }
            Expr::Ident(id) => {
                let ident = self.table.get(*id);
                if ident.is_array() {
                    self.array_base(*id)
                } else {
                    self.ssa.read_variable(&mut self.func, self.table, *id, self.current_block)
                }
            }
            Expr::ArrayRef { array, index } => {
                let index_value = self.emit_expr(index);
                let base = self.array_base(*array);
                let element_ty = self.table.get(*array).ty.element_type().unwrap();
                let addr = self.push(Type::pointer(element_ty.clone()), InstKind::Gep { base, index: index_value });
                self.push(element_ty, InstKind::Load(addr))
            }
            Expr::FuncCall { callee, args } => {
                let arg_values: Vec<Value> = args.iter().map(|a| self.emit_expr(a)).collect();
                let ret_ty = self.resolve_call_return_ty(*callee);
                self.push(ret_ty, InstKind::Call { callee: *callee, args: arg_values })
            }
            Expr::Inc(id) | Expr::Dec(id) => {
                let old = self.ssa.read_variable(&mut self.func, self.table, *id, self.current_block);
                let op = if matches!(expr, Expr::Inc(_)) { MathOp::Add } else { MathOp::Sub };
                let new = self.push(Type::Int, InstKind::Math { op, lhs: old, rhs: Value::const_int(1) });
                self.ssa.write_variable(*id, self.current_block, new);
                new
            }
            Expr::AddrOfArray(id) => self.array_base(*id),
            Expr::IntCast(inner) => {
                let v = self.emit_expr(inner);
                self.push(Type::Int, InstKind::IntCast(v))
            }
            Expr::CharCast(inner) => {
                let v = self.emit_expr(inner);
                self.push(Type::Char, InstKind::CharCast(v))
            }
            Expr::BinaryCmp { op, lhs, rhs } => {
                let lhs = self.emit_expr(lhs);
                let rhs = self.emit_expr(rhs);
                let cmp = self.push(Type::Int, InstKind::Cmp { op: translate_cmp(*op), lhs, rhs });
                self.push(Type::Int, InstKind::ZExt(cmp))
            }
            Expr::BinaryMath { op, lhs, rhs } => {
                let lhs = self.emit_expr(lhs);
                let rhs = self.emit_expr(rhs);
                self.push(Type::Int, InstKind::Math { op: translate_math(*op), lhs, rhs })
            }
            Expr::Not(inner) => {
                let v = self.emit_expr(inner);
                let cmp = self.push(Type::Int, InstKind::Cmp { op: CmpOp::Eq, lhs: v, rhs: Value::const_int(0) });
                self.push(Type::Int, InstKind::ZExt(cmp))
            }
            Expr::LogicalAnd(lhs, rhs) => self.emit_short_circuit(lhs, rhs, false),
            Expr::LogicalOr(lhs, rhs) => self.emit_short_circuit(lhs, rhs, true),
        }
    }

    /// `a && b` / `a || b`. `is_or` picks the short-circuit constant (`1`
    /// for `||`, `0` for `&&`) and which branch of the condition skips
    /// evaluating `rhs`.
    fn emit_short_circuit(&mut self, lhs: &Expr, rhs: &Expr, is_or: bool) -> Value {
        let lhs_value = self.emit_cond(lhs);
        let lhs_block = self.current_block;

        let rhs_block = self.new_block(true);
        let end_block = self.new_block(false);

        let (then_block, else_block) = if is_or { (end_block, rhs_block) } else { (rhs_block, end_block) };
        self.func.push_inst(
            lhs_block,
            Type::Void,
            InstKind::CondBr { cond: lhs_value, then_block, else_block },
        );
        self.func.add_edge(lhs_block, then_block);
        self.func.add_edge(lhs_block, else_block);

        self.current_block = rhs_block;
        let rhs_cond = self.emit_cond(rhs);
        self.br_to(end_block);
        let rhs_end = self.current_block;

        self.seal(end_block);
        self.current_block = end_block;

        let short_circuit_const = Value::const_i1(is_or);
        let phi = InstKind::Phi(vec![
            Incoming { value: short_circuit_const, pred: lhs_block },
            Incoming { value: rhs_cond, pred: rhs_end },
        ]);
        self.push(Type::Int, phi)
    }

    fn resolve_call_return_ty(&mut self, callee: Symbol) -> Type {
        const PRINTF: &str = "printf";
        if callee.as_str() == PRINTF {
            if self.printf.is_none() {
                let f = ir::Function::new_extern(callee, vec![Type::pointer(Type::Char)], Type::Int);
                self.module.functions.push(f);
                self.printf = Some(callee);
            }
            return Type::Int;
        }
        self.module
            .find_function(callee)
            .map(|id| self.module.functions[id].return_ty.clone())
            .unwrap_or(Type::Int)
    }
}

fn translate_cmp(op: AstCmpOp) -> CmpOp {
    match op {
        AstCmpOp::Eq => CmpOp::Eq,
        AstCmpOp::Ne => CmpOp::Ne,
        AstCmpOp::Slt => CmpOp::Slt,
        AstCmpOp::Sgt => CmpOp::Sgt,
    }
}

fn translate_math(op: AstMathOp) -> MathOp {
    match op {
        AstMathOp::Add => MathOp::Add,
        AstMathOp::Sub => MathOp::Sub,
        AstMathOp::Mul => MathOp::Mul,
        AstMathOp::SDiv => MathOp::SDiv,
        AstMathOp::SRem => MathOp::SRem,
    }
}
