//! The rewrite pass: walks one file's tree, consulting the uncovered-range
//! set for every node, and wraps each fully-uncovered non-binding statement
//! in a block that fires the sentinel call before the original statement.
//!
//! Traversal is pre-order with pruning: a node whose span lies entirely in
//! covered territory is returned untouched and its subtree is never visited,
//! which keeps the pass linear in the volume of uncovered code.

use std::collections::HashSet;
use std::mem;

use crate::domain::ast::{
    Block, CaseClause, Decl, Expr, ExprKind, File, ForStmt, GenDecl, IfStmt, LitKind, NodeId,
    RangeStmt, Spec, Stmt, StmtKind, SwitchStmt, TypeSwitchStmt,
};
use crate::domain::position::{CodeRange, SourcePos};
use crate::domain::ranges::{Coverage, UncoveredRanges};

/// Tag carried by every sentinel message, so crash output is attributable.
pub const SENTINEL_TAG: &str = "<[[GLINT]]>";

/// What one file's rewrite did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Statements wrapped with a sentinel call.
    pub wrapped: usize,
    /// Skip-set entries never consumed by the traversal. Always zero for a
    /// correct pass; surfaced so tests can assert the invariant.
    pub leftover_skips: usize,
}

/// One-shot rewriter for a single file. Holds the skip set: statement ids of
/// syntactically-constrained clauses (loop init/post, branch initializers,
/// type-switch subjects) that must be passed through unmodified when the
/// traversal reaches them.
pub struct Rewriter<'a> {
    ranges: &'a UncoveredRanges,
    sentinel: &'a str,
    skip: HashSet<NodeId>,
    wrapped: usize,
}

impl<'a> Rewriter<'a> {
    pub fn new(ranges: &'a UncoveredRanges, sentinel: &'a str) -> Self {
        Rewriter { ranges, sentinel, skip: HashSet::new(), wrapped: 0 }
    }

    /// Rewrite `file` in place and consume the rewriter.
    pub fn rewrite_file(mut self, file: &mut File) -> RewriteOutcome {
        if self.ranges.classify(&file.span) != Coverage::NonOverlapping {
            for decl in &mut file.decls {
                self.rewrite_decl(decl);
            }
        }
        let leftover_skips = self.skip.len();
        debug_assert_eq!(
            leftover_skips, 0,
            "constrained clauses registered but never reached: {:?}",
            self.skip
        );
        RewriteOutcome { wrapped: self.wrapped, leftover_skips }
    }

    fn rewrite_decl(&mut self, decl: &mut Decl) {
        if self.ranges.classify(&decl.span()) == Coverage::NonOverlapping {
            return;
        }
        match decl {
            Decl::Func(f) => {
                if let Some(body) = &mut f.body {
                    self.rewrite_body_block(body);
                }
            }
            Decl::Gen(g) => self.rewrite_gen_decl(g),
        }
    }

    fn rewrite_gen_decl(&mut self, decl: &mut GenDecl) {
        // Initializer expressions can carry function literals.
        for spec in &mut decl.specs {
            if let Spec::Value(v) = spec {
                for value in &mut v.values {
                    self.rewrite_expr(value);
                }
            }
        }
    }

    /// A block sitting in a body slot (function body, loop body, if arm).
    /// Classified like any other node; a fully-uncovered body is wrapped
    /// once at the top instead of statement by statement.
    fn rewrite_body_block(&mut self, block: &mut Block) {
        match self.ranges.classify(&block.span) {
            Coverage::NonOverlapping => {}
            Coverage::Contained => self.wrap_block(block),
            Coverage::Overlapping => {
                for stmt in &mut block.stmts {
                    self.rewrite_stmt(stmt);
                }
            }
        }
    }

    fn rewrite_stmt(&mut self, stmt: &mut Stmt) {
        // A registered constrained clause is passed through without being
        // classified; its sub-expressions are still visited.
        if self.skip.remove(&stmt.id) {
            self.descend_stmt(stmt);
            return;
        }

        match self.ranges.classify(&stmt.span) {
            Coverage::NonOverlapping => return,
            Coverage::Contained if !stmt.is_binding_decl() => {
                self.wrap_stmt(stmt);
                return;
            }
            // A contained binding declaration cannot be wrapped without
            // hiding the declared name, so it is treated like a partial
            // overlap: left intact, children visited.
            _ => {}
        }

        self.register_constrained(stmt);
        self.descend_stmt(stmt);
    }

    /// Register the clauses of `stmt` that occupy single-simple-statement
    /// grammar slots, so the descent leaves them unwrapped.
    fn register_constrained(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::For(f) => {
                if let Some(init) = &f.init {
                    if init.is_binding_decl() {
                        self.skip.insert(init.id);
                    }
                }
                if let Some(post) = &f.post {
                    self.skip.insert(post.id);
                }
            }
            StmtKind::TypeSwitch(ts) => {
                if let Some(init) = &ts.init {
                    if init.is_binding_decl() {
                        self.skip.insert(init.id);
                    }
                }
                self.skip.insert(ts.assign.id);
            }
            StmtKind::Switch(s) => {
                if let Some(init) = &s.init {
                    if init.is_binding_decl() {
                        self.skip.insert(init.id);
                    }
                }
            }
            StmtKind::If(i) => {
                if let Some(init) = &i.init {
                    if init.is_binding_decl() {
                        self.skip.insert(init.id);
                    }
                }
            }
            _ => {}
        }
    }

    fn descend_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Decl(g) => self.rewrite_gen_decl(g),
            StmtKind::Empty | StmtKind::Branch { .. } => {}
            StmtKind::Labeled { stmt, .. } => self.rewrite_stmt(stmt),
            StmtKind::Expr(e) | StmtKind::Go(e) | StmtKind::Defer(e) => self.rewrite_expr(e),
            StmtKind::Send { chan, value } => {
                self.rewrite_expr(chan);
                self.rewrite_expr(value);
            }
            StmtKind::IncDec { expr, .. } => self.rewrite_expr(expr),
            StmtKind::Assign { lhs, rhs, .. } => {
                for e in lhs.iter_mut().chain(rhs.iter_mut()) {
                    self.rewrite_expr(e);
                }
            }
            StmtKind::Return(exprs) => {
                for e in exprs {
                    self.rewrite_expr(e);
                }
            }
            StmtKind::Block(b) => {
                // The block and the statement are the same node; its span was
                // already classified, so go straight to the children.
                for s in &mut b.stmts {
                    self.rewrite_stmt(s);
                }
            }
            StmtKind::If(IfStmt { init, cond, then, else_branch }) => {
                if let Some(init) = init {
                    self.rewrite_stmt(init);
                }
                self.rewrite_expr(cond);
                self.rewrite_body_block(then);
                if let Some(els) = else_branch {
                    self.rewrite_stmt(els);
                }
            }
            StmtKind::Switch(SwitchStmt { init, tag, cases }) => {
                if let Some(init) = init {
                    self.rewrite_stmt(init);
                }
                if let Some(tag) = tag {
                    self.rewrite_expr(tag);
                }
                for case in cases {
                    self.rewrite_case(case);
                }
            }
            StmtKind::TypeSwitch(TypeSwitchStmt { init, assign, cases }) => {
                if let Some(init) = init {
                    self.rewrite_stmt(init);
                }
                self.rewrite_stmt(assign);
                for case in cases {
                    self.rewrite_case(case);
                }
            }
            StmtKind::For(ForStmt { init, cond, post, body }) => {
                if let Some(init) = init {
                    self.rewrite_stmt(init);
                }
                if let Some(cond) = cond {
                    self.rewrite_expr(cond);
                }
                if let Some(post) = post {
                    self.rewrite_stmt(post);
                }
                self.rewrite_body_block(body);
            }
            StmtKind::Range(RangeStmt { key, value, expr, body, .. }) => {
                if let Some(key) = key {
                    self.rewrite_expr(key);
                }
                if let Some(value) = value {
                    self.rewrite_expr(value);
                }
                self.rewrite_expr(expr);
                self.rewrite_body_block(body);
            }
        }
    }

    fn rewrite_case(&mut self, case: &mut CaseClause) {
        if self.ranges.classify(&case.span) == Coverage::NonOverlapping {
            return;
        }
        for e in &mut case.exprs {
            self.rewrite_expr(e);
        }
        for s in &mut case.body {
            self.rewrite_stmt(s);
        }
    }

    fn rewrite_expr(&mut self, expr: &mut Expr) {
        if self.ranges.classify(&expr.span) == Coverage::NonOverlapping {
            return;
        }
        // Expressions are never wrapped; the descent only needs to reach
        // statement territory again, which it does through function-literal
        // bodies.
        match &mut expr.kind {
            ExprKind::Ident(_)
            | ExprKind::BasicLit { .. }
            | ExprKind::Ellipsis(None)
            | ExprKind::StructType(_)
            | ExprKind::InterfaceType(_)
            | ExprKind::FuncType(_) => {}
            ExprKind::CompositeLit { elts, .. } => {
                for e in elts {
                    self.rewrite_expr(e);
                }
            }
            ExprKind::KeyValue { key, value } => {
                self.rewrite_expr(key);
                self.rewrite_expr(value);
            }
            ExprKind::FuncLit { body, .. } => self.rewrite_body_block(body),
            ExprKind::Paren(x)
            | ExprKind::Star(x)
            | ExprKind::Unary { x, .. }
            | ExprKind::Ellipsis(Some(x)) => self.rewrite_expr(x),
            ExprKind::Selector { x, .. } => self.rewrite_expr(x),
            ExprKind::Index { x, index } => {
                self.rewrite_expr(x);
                self.rewrite_expr(index);
            }
            ExprKind::Slice { x, low, high, max } => {
                self.rewrite_expr(x);
                for part in [low, high, max].into_iter().flatten() {
                    self.rewrite_expr(part);
                }
            }
            ExprKind::TypeAssert { x, ty } => {
                self.rewrite_expr(x);
                if let Some(ty) = ty {
                    self.rewrite_expr(ty);
                }
            }
            ExprKind::Call { fun, args, .. } => {
                self.rewrite_expr(fun);
                for a in args {
                    self.rewrite_expr(a);
                }
            }
            ExprKind::Binary { x, y, .. } => {
                self.rewrite_expr(x);
                self.rewrite_expr(y);
            }
            ExprKind::ArrayType { len, elt } => {
                if let Some(len) = len {
                    self.rewrite_expr(len);
                }
                self.rewrite_expr(elt);
            }
            ExprKind::MapType { key, value } => {
                self.rewrite_expr(key);
                self.rewrite_expr(value);
            }
            ExprKind::ChanType { elem, .. } => self.rewrite_expr(elem),
        }
    }

    fn wrap_stmt(&mut self, stmt: &mut Stmt) {
        let original = mem::replace(stmt, empty_stmt());
        let call = sentinel_stmt(self.sentinel, original.span.start);
        *stmt = Stmt {
            id: NodeId::SYNTHETIC,
            span: CodeRange::SYNTHETIC,
            kind: StmtKind::Block(Block {
                stmts: vec![call, original],
                span: CodeRange::SYNTHETIC,
            }),
        };
        self.wrapped += 1;
    }

    /// Wrap a body-slot block: the old block becomes a nested statement of a
    /// fresh block led by the sentinel call.
    fn wrap_block(&mut self, block: &mut Block) {
        let original = mem::replace(
            block,
            Block { stmts: Vec::new(), span: CodeRange::SYNTHETIC },
        );
        let call = sentinel_stmt(self.sentinel, original.span.start);
        let inner = Stmt {
            id: NodeId::SYNTHETIC,
            span: CodeRange::SYNTHETIC,
            kind: StmtKind::Block(original),
        };
        block.stmts = vec![call, inner];
        self.wrapped += 1;
    }
}

fn empty_stmt() -> Stmt {
    Stmt { id: NodeId::SYNTHETIC, span: CodeRange::SYNTHETIC, kind: StmtKind::Empty }
}

/// Build the synthetic `sentinel("<[[GLINT]]> hit uncovered statement at L:C")`
/// statement inserted ahead of a wrapped node.
pub fn sentinel_stmt(sentinel: &str, pos: SourcePos) -> Stmt {
    let msg = format!("\"{} hit uncovered statement at {}\"", SENTINEL_TAG, pos);
    let call = Expr {
        span: CodeRange::SYNTHETIC,
        kind: ExprKind::Call {
            fun: Box::new(Expr {
                span: CodeRange::SYNTHETIC,
                kind: ExprKind::Ident(sentinel.to_string()),
            }),
            args: vec![Expr {
                span: CodeRange::SYNTHETIC,
                kind: ExprKind::BasicLit { kind: LitKind::String, text: msg },
            }],
            ellipsis: false,
        },
    };
    Stmt { id: NodeId::SYNTHETIC, span: CodeRange::SYNTHETIC, kind: StmtKind::Expr(call) }
}
