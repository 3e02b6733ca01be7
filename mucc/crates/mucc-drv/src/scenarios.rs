//! The `--ast` debug input registry (§6): hand-built ASTs standing in for a
//! parsed source unit, one per end-to-end scenario from §8. Each produces a
//! symbol table (with every identifier pre-declared, as the real parser
//! would have left it) and the program AST the emitter walks.

use mucc_sem::ast::{ArgDecl, CmpOp, Expr, Function, MathOp, Program, Stmt};
use mucc_sem::{IdentId, SymbolTable, Type};
use mucc_util::Symbol;

pub const SCENARIO_NAMES: &[&str] =
    &["constant_branch", "licm_invariant", "if_merge", "loop_phi", "short_circuit_and", "dead_block"];

pub fn scenario(name: &str) -> Option<(SymbolTable, Program)> {
    match name {
        "constant_branch" => Some(constant_branch()),
        "licm_invariant" => Some(licm_invariant()),
        "if_merge" => Some(if_merge()),
        "loop_phi" => Some(loop_phi()),
        "short_circuit_and" => Some(short_circuit_and()),
        "dead_block" => Some(dead_block()),
        _ => None,
    }
}

fn func(name: &str, ret_ty: Type, args: Vec<ArgDecl>, body: Stmt) -> Function {
    Function { name: Symbol::intern(name), ret_ty, args, body }
}

fn arg(table: &mut SymbolTable, name: &str, ty: Type) -> (ArgDecl, IdentId) {
    let id = table.declare(Symbol::intern(name), ty);
    (ArgDecl { ident: id }, id)
}

/// `int main() { if (1) return 2; else return 3; }`
fn constant_branch() -> (SymbolTable, Program) {
    let table = SymbolTable::new();
    let body = Stmt::If {
        cond: Expr::Constant(1),
        then_branch: Box::new(Stmt::Return(Some(Expr::Constant(2)))),
        else_branch: Some(Box::new(Stmt::Return(Some(Expr::Constant(3))))),
    };
    (table, Program { functions: vec![func("main", Type::Int, vec![], body)] })
}

/// `int main(){ int s; int i; s=0; i=0; while(i<10){ s = s + (2*3); i = i+1; } return s; }`
fn licm_invariant() -> (SymbolTable, Program) {
    let mut table = SymbolTable::new();
    let s = table.declare(Symbol::intern("s"), Type::Int);
    let i = table.declare(Symbol::intern("i"), Type::Int);

    let body = Stmt::Compound(vec![
        Stmt::Decl { ident: s, init: None },
        Stmt::Decl { ident: i, init: None },
        Stmt::Assign { target: s, value: Expr::Constant(0) },
        Stmt::Assign { target: i, value: Expr::Constant(0) },
        Stmt::While {
            cond: Expr::BinaryCmp { op: CmpOp::Slt, lhs: Box::new(Expr::Ident(i)), rhs: Box::new(Expr::Constant(10)) },
            body: Box::new(Stmt::Compound(vec![
                Stmt::Assign {
                    target: s,
                    value: Expr::BinaryMath {
                        op: MathOp::Add,
                        lhs: Box::new(Expr::Ident(s)),
                        rhs: Box::new(Expr::BinaryMath {
                            op: MathOp::Mul,
                            lhs: Box::new(Expr::Constant(2)),
                            rhs: Box::new(Expr::Constant(3)),
                        }),
                    },
                },
                Stmt::Assign {
                    target: i,
                    value: Expr::BinaryMath { op: MathOp::Add, lhs: Box::new(Expr::Ident(i)), rhs: Box::new(Expr::Constant(1)) },
                },
            ])),
        },
        Stmt::Return(Some(Expr::Ident(s))),
    ]);
    (table, Program { functions: vec![func("main", Type::Int, vec![], body)] })
}

/// `int f(int x){ int y; if (x) y = 1; else y = 2; return y; }`
fn if_merge() -> (SymbolTable, Program) {
    let mut table = SymbolTable::new();
    let (x_arg, x) = arg(&mut table, "x", Type::Int);
    let y = table.declare(Symbol::intern("y"), Type::Int);

    let body = Stmt::Compound(vec![
        Stmt::Decl { ident: y, init: None },
        Stmt::If {
            cond: Expr::Ident(x),
            then_branch: Box::new(Stmt::Assign { target: y, value: Expr::Constant(1) }),
            else_branch: Some(Box::new(Stmt::Assign { target: y, value: Expr::Constant(2) })),
        },
        Stmt::Return(Some(Expr::Ident(y))),
    ]);
    (table, Program { functions: vec![func("f", Type::Int, vec![x_arg], body)] })
}

/// `int sum(int n){ int i; int s; i=0; s=0; while(i<n){ s=s+i; i=i+1; } return s; }`
fn loop_phi() -> (SymbolTable, Program) {
    let mut table = SymbolTable::new();
    let (n_arg, n) = arg(&mut table, "n", Type::Int);
    let i = table.declare(Symbol::intern("i"), Type::Int);
    let s = table.declare(Symbol::intern("s"), Type::Int);

    let body = Stmt::Compound(vec![
        Stmt::Decl { ident: i, init: None },
        Stmt::Decl { ident: s, init: None },
        Stmt::Assign { target: i, value: Expr::Constant(0) },
        Stmt::Assign { target: s, value: Expr::Constant(0) },
        Stmt::While {
            cond: Expr::BinaryCmp { op: CmpOp::Slt, lhs: Box::new(Expr::Ident(i)), rhs: Box::new(Expr::Ident(n)) },
            body: Box::new(Stmt::Compound(vec![
                Stmt::Assign {
                    target: s,
                    value: Expr::BinaryMath { op: MathOp::Add, lhs: Box::new(Expr::Ident(s)), rhs: Box::new(Expr::Ident(i)) },
                },
                Stmt::Assign {
                    target: i,
                    value: Expr::BinaryMath { op: MathOp::Add, lhs: Box::new(Expr::Ident(i)), rhs: Box::new(Expr::Constant(1)) },
                },
            ])),
        },
        Stmt::Return(Some(Expr::Ident(s))),
    ]);
    (table, Program { functions: vec![func("sum", Type::Int, vec![n_arg], body)] })
}

/// `int g(int a,int b){ if (a && b) return 1; return 0; }`
fn short_circuit_and() -> (SymbolTable, Program) {
    let mut table = SymbolTable::new();
    let (a_arg, a) = arg(&mut table, "a", Type::Int);
    let (b_arg, b) = arg(&mut table, "b", Type::Int);

    let body = Stmt::Compound(vec![
        Stmt::If {
            cond: Expr::LogicalAnd(Box::new(Expr::Ident(a)), Box::new(Expr::Ident(b))),
            then_branch: Box::new(Stmt::Return(Some(Expr::Constant(1)))),
            else_branch: None,
        },
        Stmt::Return(Some(Expr::Constant(0))),
    ]);
    (table, Program { functions: vec![func("g", Type::Int, vec![a_arg, b_arg], body)] })
}

/// `int h(){ if (0) return 1; return 2; }`
fn dead_block() -> (SymbolTable, Program) {
    let table = SymbolTable::new();
    let body = Stmt::Compound(vec![
        Stmt::If { cond: Expr::Constant(0), then_branch: Box::new(Stmt::Return(Some(Expr::Constant(1)))), else_branch: None },
        Stmt::Return(Some(Expr::Constant(2))),
    ]);
    (table, Program { functions: vec![func("h", Type::Int, vec![], body)] })
}
