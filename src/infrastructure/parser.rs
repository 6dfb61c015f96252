//! Recursive-descent parser for the Go subset.
//!
//! Produces the `domain::ast` tree with exact source spans and assigns every
//! statement a dense `NodeId`, the identity the rewrite pass's skip set keys
//! on. Types are parsed with the expression machinery and appear as
//! expressions in the tree, which is what lets type-switch case lists and
//! conversions share one grammar.
//!
//! Unsupported Go: `select` statements, generics, and type aliases. These
//! fail the parse, which is fatal for the run: instrumenting a file we cannot
//! faithfully reprint would corrupt it.

use anyhow::{bail, Context, Result};

use crate::domain::ast::{
    AssignOp, BinaryOp, Block, BranchKind, CaseClause, ChanDir, Decl, DeclKeyword, Expr, ExprKind,
    Field, File, ForStmt, FuncDecl, FuncSig, GenDecl, IfStmt, ImportSpec, LitKind, NodeId,
    RangeStmt, Spec, Stmt, StmtKind, SwitchStmt, TypeSpec, TypeSwitchStmt, UnaryOp, ValueSpec,
};
use crate::domain::position::{CodeRange, SourcePos};
use crate::infrastructure::lexer::{Lexer, TokKind, Token};

/// Parse one source file.
pub fn parse_file(src: &str) -> Result<File> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).file()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_id: u32,
    /// Set while parsing if/for/switch headers, where a `{` must open the
    /// statement body rather than a composite literal.
    no_composite: bool,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, next_id: 0, no_composite: false }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokKind {
        self.peek().kind
    }

    fn peek_at(&self, ahead: usize) -> TokKind {
        self.tokens
            .get(self.pos + ahead)
            .map_or(TokKind::Eof, |t| t.kind)
    }

    fn at(&self, kind: TokKind) -> bool {
        self.peek_kind() == kind
    }

    fn start(&self) -> SourcePos {
        self.peek().span.start
    }

    /// End position of the most recently consumed token.
    fn prev_end(&self) -> SourcePos {
        self.tokens[self.pos.saturating_sub(1)].span.end
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokKind, what: &str) -> Result<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            bail!("{}: expected {}, found `{}`", t.span.start, what, describe(t))
        }
    }

    /// Consume a statement terminator. A `}` or `)` closes the enclosing
    /// construct without one, matching Go's optional final semicolon.
    fn expect_semi(&mut self) -> Result<()> {
        if self.at(TokKind::Semi) {
            self.advance();
            return Ok(());
        }
        if self.at(TokKind::RBrace) || self.at(TokKind::RParen) {
            return Ok(());
        }
        let t = self.peek();
        bail!("{}: expected end of statement, found `{}`", t.span.start, describe(t))
    }

    fn with_composite<T>(
        &mut self,
        allowed: bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = self.no_composite;
        self.no_composite = !allowed;
        let out = f(self);
        self.no_composite = saved;
        out
    }

    fn stmt(&mut self, span: CodeRange, kind: StmtKind) -> Stmt {
        Stmt { id: self.fresh_id(), span, kind }
    }

    // ---- file & declarations -------------------------------------------

    fn file(&mut self) -> Result<File> {
        let file_start = self.start();

        self.expect(TokKind::Package, "`package`")?;
        let package = self.expect(TokKind::Ident, "package name")?.text;
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.at(TokKind::Import) || self.at(TokKind::Semi) {
            if self.at(TokKind::Semi) {
                self.advance();
                continue;
            }
            self.import_decl(&mut imports)?;
        }

        let mut decls = Vec::new();
        loop {
            // Each top-level declaration leaves its inserted terminator behind.
            while self.at(TokKind::Semi) {
                self.advance();
            }
            if self.at(TokKind::Eof) {
                break;
            }
            decls.push(self.top_level_decl()?);
        }

        let file_end = self.prev_end();
        Ok(File {
            package,
            imports,
            decls,
            span: CodeRange::new(file_start, file_end.max(file_start)),
        })
    }

    fn import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> Result<()> {
        self.expect(TokKind::Import, "`import`")?;
        if self.at(TokKind::LParen) {
            self.advance();
            while !self.at(TokKind::RParen) {
                imports.push(self.import_spec()?);
                self.expect_semi()?;
            }
            self.expect(TokKind::RParen, "`)`")?;
        } else {
            imports.push(self.import_spec()?);
        }
        self.expect_semi()
    }

    fn import_spec(&mut self) -> Result<ImportSpec> {
        let start = self.start();
        let alias = match self.peek_kind() {
            TokKind::Ident => Some(self.advance().text),
            TokKind::Dot => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        let path = self.expect(TokKind::Str, "import path")?.text;
        Ok(ImportSpec { alias, path, span: CodeRange::new(start, self.prev_end()) })
    }

    fn top_level_decl(&mut self) -> Result<Decl> {
        match self.peek_kind() {
            TokKind::Func => self.func_decl().map(Decl::Func),
            TokKind::Var | TokKind::Const | TokKind::Type => self.gen_decl().map(Decl::Gen),
            _ => {
                let t = self.peek();
                bail!("{}: expected declaration, found `{}`", t.span.start, describe(t))
            }
        }
    }

    fn func_decl(&mut self) -> Result<FuncDecl> {
        let start = self.start();
        self.expect(TokKind::Func, "`func`")?;

        let recv = if self.at(TokKind::LParen) {
            self.advance();
            let fields = self.field_list(TokKind::RParen)?;
            self.expect(TokKind::RParen, "`)`")?;
            match fields.len() {
                1 => Some(fields.into_iter().next().expect("len checked")),
                n => bail!("{}: method receiver must be a single field, found {}", start, n),
            }
        } else {
            None
        };

        let name = self.expect(TokKind::Ident, "function name")?.text;
        let sig = self.signature()?;

        let body = if self.at(TokKind::LBrace) {
            Some(self.block()?)
        } else {
            self.expect_semi()?;
            None
        };

        Ok(FuncDecl { recv, name, sig, body, span: CodeRange::new(start, self.prev_end()) })
    }

    fn signature(&mut self) -> Result<FuncSig> {
        let start = self.start();
        self.expect(TokKind::LParen, "`(`")?;
        let params = self.with_composite(true, |p| p.field_list(TokKind::RParen))?;
        self.expect(TokKind::RParen, "`)`")?;

        let results = if self.at(TokKind::LParen) {
            self.advance();
            let fields = self.with_composite(true, |p| p.field_list(TokKind::RParen))?;
            self.expect(TokKind::RParen, "`)`")?;
            fields
        } else if starts_type(self.peek_kind()) {
            let ty_start = self.start();
            let ty = self.parse_type()?;
            vec![Field {
                names: vec![],
                ty,
                tag: None,
                span: CodeRange::new(ty_start, self.prev_end()),
            }]
        } else {
            vec![]
        };

        Ok(FuncSig { params, results, span: CodeRange::new(start, self.prev_end()) })
    }

    /// Parameter-style field list: `a, b int, c ...string` or a bare type
    /// list `int, error`. Whether the leading expressions are names is only
    /// known once a type (or the terminator) follows them.
    fn field_list(&mut self, terminator: TokKind) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        let mut pending: Vec<(Expr, SourcePos)> = Vec::new();

        while !self.at(terminator) {
            let start = self.start();

            if self.at(TokKind::Ellipsis) {
                let ty = self.variadic_type()?;
                let (names, span_start) = self.drain_names(&mut pending, start)?;
                fields.push(Field {
                    names,
                    ty,
                    tag: None,
                    span: CodeRange::new(span_start, self.prev_end()),
                });
            } else {
                let expr = self.parse_type()?;
                if self.at(TokKind::Comma) {
                    self.advance();
                    pending.push((expr, start));
                    continue;
                }
                if self.at(terminator) {
                    pending.push((expr, start));
                    break;
                }
                // `expr` was the last name of a group; the type follows.
                pending.push((expr, start));
                let ty = if self.at(TokKind::Ellipsis) {
                    self.variadic_type()?
                } else {
                    self.parse_type()?
                };
                let (names, span_start) = self.drain_names(&mut pending, start)?;
                fields.push(Field {
                    names,
                    ty,
                    tag: None,
                    span: CodeRange::new(span_start, self.prev_end()),
                });
            }

            if self.at(TokKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        // Anything still pending is a bare type list, one field per type.
        for (ty, start) in pending {
            let span = CodeRange::new(start, ty.span.end);
            fields.push(Field { names: vec![], ty, tag: None, span });
        }
        Ok(fields)
    }

    fn variadic_type(&mut self) -> Result<Expr> {
        let start = self.start();
        self.expect(TokKind::Ellipsis, "`...`")?;
        let elem = self.parse_type()?;
        Ok(Expr {
            span: CodeRange::new(start, self.prev_end()),
            kind: ExprKind::Ellipsis(Some(Box::new(elem))),
        })
    }

    fn drain_names(
        &mut self,
        pending: &mut Vec<(Expr, SourcePos)>,
        fallback_start: SourcePos,
    ) -> Result<(Vec<String>, SourcePos)> {
        let span_start = pending.first().map_or(fallback_start, |(_, s)| *s);
        let mut names = Vec::with_capacity(pending.len());
        for (expr, _) in pending.drain(..) {
            match expr.kind {
                ExprKind::Ident(name) => names.push(name),
                _ => bail!("{}: expected parameter name", expr.span.start),
            }
        }
        Ok((names, span_start))
    }

    fn gen_decl(&mut self) -> Result<GenDecl> {
        let start = self.start();
        let keyword = match self.advance().kind {
            TokKind::Var => DeclKeyword::Var,
            TokKind::Const => DeclKeyword::Const,
            TokKind::Type => DeclKeyword::Type,
            _ => unreachable!("caller checked keyword"),
        };

        let mut specs = Vec::new();
        let grouped = self.at(TokKind::LParen);
        if grouped {
            self.advance();
            while !self.at(TokKind::RParen) {
                specs.push(self.spec(keyword)?);
                self.expect_semi()?;
            }
            self.expect(TokKind::RParen, "`)`")?;
        } else {
            specs.push(self.spec(keyword)?);
        }

        Ok(GenDecl { keyword, grouped, specs, span: CodeRange::new(start, self.prev_end()) })
    }

    fn spec(&mut self, keyword: DeclKeyword) -> Result<Spec> {
        let start = self.start();
        if keyword == DeclKeyword::Type {
            let name = self.expect(TokKind::Ident, "type name")?.text;
            let ty = self.parse_type()?;
            return Ok(Spec::Type(TypeSpec {
                name,
                ty,
                span: CodeRange::new(start, self.prev_end()),
            }));
        }

        let mut names = vec![self.expect(TokKind::Ident, "name")?.text];
        while self.at(TokKind::Comma) {
            self.advance();
            names.push(self.expect(TokKind::Ident, "name")?.text);
        }

        let ty = if !self.at(TokKind::Assign)
            && !self.at(TokKind::Semi)
            && !self.at(TokKind::RParen)
            && !self.at(TokKind::Eof)
        {
            Some(self.parse_type()?)
        } else {
            None
        };

        let values = if self.at(TokKind::Assign) {
            self.advance();
            self.expr_list()?
        } else {
            vec![]
        };

        Ok(Spec::Value(ValueSpec {
            names,
            ty,
            values,
            span: CodeRange::new(start, self.prev_end()),
        }))
    }

    // ---- statements ----------------------------------------------------

    fn block(&mut self) -> Result<Block> {
        let start = self.start();
        self.expect(TokKind::LBrace, "`{`")?;
        let stmts = self.with_composite(true, |p| p.stmt_list(TokKind::RBrace))?;
        self.expect(TokKind::RBrace, "`}`")?;
        Ok(Block { stmts, span: CodeRange::new(start, self.prev_end()) })
    }

    fn stmt_list(&mut self, terminator: TokKind) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.at(terminator)
            && !self.at(TokKind::Case)
            && !self.at(TokKind::Default)
            && !self.at(TokKind::Eof)
        {
            let stmt = self.statement()?;
            self.expect_semi()?;
            stmts.push(stmt);
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt> {
        let start = self.start();
        match self.peek_kind() {
            TokKind::Var | TokKind::Const | TokKind::Type => {
                let decl = self.gen_decl()?;
                let span = decl.span;
                Ok(self.stmt(span, StmtKind::Decl(decl)))
            }
            TokKind::Semi => {
                // Bare semicolon: empty statement, terminator left in place.
                let here = CodeRange::new(start, start);
                Ok(self.stmt(here, StmtKind::Empty))
            }
            TokKind::If => self.if_stmt(),
            TokKind::Switch => self.switch_stmt(),
            TokKind::For => self.for_stmt(),
            TokKind::Select => {
                bail!("{}: select statements are not supported", start)
            }
            TokKind::Return => {
                self.advance();
                let exprs = if self.at(TokKind::Semi)
                    || self.at(TokKind::RBrace)
                    || self.at(TokKind::Case)
                    || self.at(TokKind::Default)
                {
                    vec![]
                } else {
                    self.expr_list()?
                };
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::Return(exprs)))
            }
            TokKind::Break | TokKind::Continue | TokKind::Goto | TokKind::Fallthrough => {
                let keyword = match self.advance().kind {
                    TokKind::Break => BranchKind::Break,
                    TokKind::Continue => BranchKind::Continue,
                    TokKind::Goto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let label = if keyword != BranchKind::Fallthrough && self.at(TokKind::Ident) {
                    Some(self.advance().text)
                } else {
                    None
                };
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::Branch { keyword, label }))
            }
            TokKind::Go => {
                self.advance();
                let call = self.parse_expr()?;
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::Go(call)))
            }
            TokKind::Defer => {
                self.advance();
                let call = self.parse_expr()?;
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::Defer(call)))
            }
            TokKind::LBrace => {
                let block = self.block()?;
                let span = block.span;
                Ok(self.stmt(span, StmtKind::Block(block)))
            }
            _ => self.simple_stmt(),
        }
    }

    /// Expression statement, send, inc/dec, assignment, define, or label.
    fn simple_stmt(&mut self) -> Result<Stmt> {
        let start = self.start();

        // Labeled statement: `name:` not followed by `=` (which would be a
        // key in some other construct; at statement level a lone ident and a
        // colon is always a label).
        if self.at(TokKind::Ident) && self.peek_at(1) == TokKind::Colon {
            let label = self.advance().text;
            self.advance(); // colon
            let inner = self.statement()?;
            let span = CodeRange::new(start, self.prev_end());
            let inner = Box::new(inner);
            return Ok(self.stmt(span, StmtKind::Labeled { label, stmt: inner }));
        }

        let lhs = self.expr_list()?;

        if let Some(op) = assign_op(self.peek_kind()) {
            self.advance();
            let rhs = self.expr_list()?;
            let span = CodeRange::new(start, self.prev_end());
            return Ok(self.stmt(span, StmtKind::Assign { lhs, op, rhs }));
        }

        let single = |list: Vec<Expr>| -> Result<Expr> {
            let mut list = list;
            if list.len() != 1 {
                bail!("{}: unexpected expression list", start);
            }
            Ok(list.pop().expect("len checked"))
        };

        match self.peek_kind() {
            TokKind::Inc | TokKind::Dec => {
                let inc = self.advance().kind == TokKind::Inc;
                let expr = single(lhs)?;
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::IncDec { expr, inc }))
            }
            TokKind::Arrow => {
                self.advance();
                let chan = single(lhs)?;
                let value = self.parse_expr()?;
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::Send { chan, value }))
            }
            _ => {
                let expr = single(lhs)?;
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::Expr(expr)))
            }
        }
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.expect(TokKind::If, "`if`")?;

        let (init, cond) = self.with_composite(false, |p| {
            let first = p.simple_stmt()?;
            if p.at(TokKind::Semi) {
                p.advance();
                let cond = p.parse_expr()?;
                Ok((Some(Box::new(first)), cond))
            } else {
                Ok((None, stmt_to_expr(first)?))
            }
        })?;

        let then = self.block()?;

        let else_branch = if self.at(TokKind::Else) {
            self.advance();
            let els = if self.at(TokKind::If) {
                self.if_stmt()?
            } else {
                let block = self.block()?;
                let span = block.span;
                self.stmt(span, StmtKind::Block(block))
            };
            Some(Box::new(els))
        } else {
            None
        };

        let span = CodeRange::new(start, self.prev_end());
        Ok(self.stmt(span, StmtKind::If(IfStmt { init, cond, then, else_branch })))
    }

    fn switch_stmt(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.expect(TokKind::Switch, "`switch`")?;

        let mut init: Option<Box<Stmt>> = None;
        let mut subject: Option<Stmt> = None;

        if !self.at(TokKind::LBrace) {
            self.with_composite(false, |p| {
                let first = p.simple_stmt()?;
                if p.at(TokKind::Semi) {
                    p.advance();
                    init = Some(Box::new(first));
                    if !p.at(TokKind::LBrace) {
                        subject = Some(p.simple_stmt()?);
                    }
                } else {
                    subject = Some(first);
                }
                Ok(())
            })?;
        }

        if subject.as_ref().map_or(false, is_type_switch_subject) {
            let assign = Box::new(subject.expect("checked above"));
            let cases = self.case_list()?;
            let span = CodeRange::new(start, self.prev_end());
            return Ok(self.stmt(span, StmtKind::TypeSwitch(TypeSwitchStmt { init, assign, cases })));
        }

        let tag = subject.map(stmt_to_expr).transpose()?;
        let cases = self.case_list()?;
        let span = CodeRange::new(start, self.prev_end());
        Ok(self.stmt(span, StmtKind::Switch(SwitchStmt { init, tag, cases })))
    }

    fn case_list(&mut self) -> Result<Vec<CaseClause>> {
        self.expect(TokKind::LBrace, "`{`")?;
        let mut cases = Vec::new();
        while self.at(TokKind::Case) || self.at(TokKind::Default) {
            let start = self.start();
            let exprs = if self.advance().kind == TokKind::Case {
                self.with_composite(true, |p| p.expr_list())?
            } else {
                vec![]
            };
            self.expect(TokKind::Colon, "`:`")?;
            let body = self.with_composite(true, |p| p.stmt_list(TokKind::RBrace))?;
            cases.push(CaseClause { exprs, body, span: CodeRange::new(start, self.prev_end()) });
        }
        self.expect(TokKind::RBrace, "`}`")?;
        Ok(cases)
    }

    fn for_stmt(&mut self) -> Result<Stmt> {
        let start = self.start();
        self.expect(TokKind::For, "`for`")?;

        if self.at(TokKind::LBrace) {
            let body = self.block()?;
            let span = CodeRange::new(start, self.prev_end());
            return Ok(self.stmt(
                span,
                StmtKind::For(ForStmt { init: None, cond: None, post: None, body }),
            ));
        }

        // `for range x { ... }`
        if self.at(TokKind::Range) {
            let expr = self.with_composite(false, |p| {
                p.advance();
                p.parse_expr()
            })?;
            let body = self.block()?;
            let span = CodeRange::new(start, self.prev_end());
            return Ok(self.stmt(
                span,
                StmtKind::Range(RangeStmt { key: None, value: None, define: false, expr, body }),
            ));
        }

        enum Header {
            Clauses(Option<Stmt>),
            Range { key: Option<Expr>, value: Option<Expr>, define: bool, expr: Expr },
        }

        let header = self.with_composite(false, |p| {
            if p.at(TokKind::Semi) {
                return Ok(Header::Clauses(None));
            }
            let lhs_start = p.start();
            let lhs = p.expr_list()?;

            if let Some(op) = assign_op(p.peek_kind()) {
                p.advance();
                let define = op == AssignOp::Define;
                if (op == AssignOp::Define || op == AssignOp::Assign) && p.at(TokKind::Range) {
                    p.advance();
                    let expr = p.parse_expr()?;
                    let mut iter = lhs.into_iter();
                    let key = iter.next();
                    let value = iter.next();
                    return Ok(Header::Range { key, value, define, expr });
                }
                let rhs = p.expr_list()?;
                let span = CodeRange::new(lhs_start, p.prev_end());
                return Ok(Header::Clauses(Some(p.stmt(span, StmtKind::Assign { lhs, op, rhs }))));
            }

            match p.peek_kind() {
                TokKind::Inc | TokKind::Dec => {
                    let inc = p.advance().kind == TokKind::Inc;
                    let mut lhs = lhs;
                    if lhs.len() != 1 {
                        bail!("{}: unexpected expression list", lhs_start);
                    }
                    let expr = lhs.pop().expect("len checked");
                    let span = CodeRange::new(lhs_start, p.prev_end());
                    Ok(Header::Clauses(Some(p.stmt(span, StmtKind::IncDec { expr, inc }))))
                }
                _ => {
                    let mut lhs = lhs;
                    if lhs.len() != 1 {
                        bail!("{}: unexpected expression list", lhs_start);
                    }
                    let expr = lhs.pop().expect("len checked");
                    let span = CodeRange::new(lhs_start, p.prev_end());
                    Ok(Header::Clauses(Some(p.stmt(span, StmtKind::Expr(expr)))))
                }
            }
        })?;

        match header {
            Header::Range { key, value, define, expr } => {
                let body = self.block()?;
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::Range(RangeStmt { key, value, define, expr, body })))
            }
            Header::Clauses(first) => {
                let (init, cond, post) = if self.at(TokKind::Semi) {
                    self.with_composite(false, |p| {
                        p.advance();
                        let cond = if p.at(TokKind::Semi) { None } else { Some(p.parse_expr()?) };
                        p.expect(TokKind::Semi, "`;`")?;
                        let post = if p.at(TokKind::LBrace) {
                            None
                        } else {
                            Some(Box::new(p.simple_stmt()?))
                        };
                        Ok((first.map(Box::new), cond, post))
                    })?
                } else {
                    // Single-clause form: the parsed statement is the
                    // condition.
                    let cond = first
                        .map(stmt_to_expr)
                        .transpose()
                        .context("while-style for loop requires a condition expression")?;
                    (None, cond, None)
                };

                let body = self.block()?;
                let span = CodeRange::new(start, self.prev_end());
                Ok(self.stmt(span, StmtKind::For(ForStmt { init, cond, post, body })))
            }
        }
    }

    // ---- expressions ---------------------------------------------------

    fn expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.at(TokKind::Comma) {
            self.advance();
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.binary_expr(1)
    }

    fn binary_expr(&mut self, min_prec: u8) -> Result<Expr> {
        let mut x = self.unary_expr()?;
        while let Some(op) = binary_op(self.peek_kind()) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let y = self.binary_expr(prec + 1)?;
            let span = CodeRange::new(x.span.start, y.span.end);
            x = Expr {
                span,
                kind: ExprKind::Binary { op, x: Box::new(x), y: Box::new(y) },
            };
        }
        Ok(x)
    }

    fn unary_expr(&mut self) -> Result<Expr> {
        let start = self.start();
        let op = match self.peek_kind() {
            TokKind::Plus => Some(UnaryOp::Plus),
            TokKind::Minus => Some(UnaryOp::Minus),
            TokKind::Not => Some(UnaryOp::Not),
            TokKind::Caret => Some(UnaryOp::Xor),
            TokKind::Amp => Some(UnaryOp::And),
            TokKind::Arrow => {
                // `<-chan T` is a type; anything else is a receive.
                if self.peek_at(1) == TokKind::Chan {
                    self.advance();
                    self.advance();
                    let elem = self.parse_type()?;
                    return Ok(Expr {
                        span: CodeRange::new(start, self.prev_end()),
                        kind: ExprKind::ChanType { dir: ChanDir::Recv, elem: Box::new(elem) },
                    });
                }
                Some(UnaryOp::Recv)
            }
            TokKind::Star => {
                self.advance();
                let x = self.unary_expr()?;
                return Ok(Expr {
                    span: CodeRange::new(start, self.prev_end()),
                    kind: ExprKind::Star(Box::new(x)),
                });
            }
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let x = self.unary_expr()?;
            return Ok(Expr {
                span: CodeRange::new(start, self.prev_end()),
                kind: ExprKind::Unary { op, x: Box::new(x) },
            });
        }

        self.primary_expr()
    }

    fn primary_expr(&mut self) -> Result<Expr> {
        let mut x = self.operand()?;

        loop {
            match self.peek_kind() {
                TokKind::Dot => {
                    self.advance();
                    if self.at(TokKind::LParen) {
                        self.advance();
                        let ty = if self.at(TokKind::Type) {
                            self.advance();
                            None
                        } else {
                            Some(Box::new(self.with_composite(true, |p| p.parse_type())?))
                        };
                        self.expect(TokKind::RParen, "`)`")?;
                        let span = CodeRange::new(x.span.start, self.prev_end());
                        x = Expr { span, kind: ExprKind::TypeAssert { x: Box::new(x), ty } };
                    } else {
                        let sel = self.expect(TokKind::Ident, "selector")?.text;
                        let span = CodeRange::new(x.span.start, self.prev_end());
                        x = Expr { span, kind: ExprKind::Selector { x: Box::new(x), sel } };
                    }
                }
                TokKind::LParen => {
                    x = self.call_expr(x)?;
                }
                TokKind::LBrack => {
                    x = self.index_or_slice(x)?;
                }
                TokKind::LBrace if !self.no_composite && is_literal_type(&x) => {
                    let elts = self.composite_body()?;
                    let span = CodeRange::new(x.span.start, self.prev_end());
                    x = Expr {
                        span,
                        kind: ExprKind::CompositeLit { ty: Some(Box::new(x)), elts },
                    };
                }
                _ => return Ok(x),
            }
        }
    }

    fn call_expr(&mut self, fun: Expr) -> Result<Expr> {
        self.expect(TokKind::LParen, "`(`")?;
        let (args, ellipsis) = self.with_composite(true, |p| {
            let mut args = Vec::new();
            let mut ellipsis = false;
            while !p.at(TokKind::RParen) {
                args.push(p.parse_expr()?);
                if p.at(TokKind::Ellipsis) {
                    p.advance();
                    ellipsis = true;
                }
                if p.at(TokKind::Comma) {
                    p.advance();
                } else {
                    break;
                }
            }
            // Multiline argument lists leave an inserted semicolon behind.
            if p.at(TokKind::Semi) {
                p.advance();
            }
            Ok((args, ellipsis))
        })?;
        self.expect(TokKind::RParen, "`)`")?;
        let span = CodeRange::new(fun.span.start, self.prev_end());
        Ok(Expr { span, kind: ExprKind::Call { fun: Box::new(fun), args, ellipsis } })
    }

    fn index_or_slice(&mut self, x: Expr) -> Result<Expr> {
        self.expect(TokKind::LBrack, "`[`")?;
        let expr = self.with_composite(true, |p| {
            let low = if p.at(TokKind::Colon) { None } else { Some(Box::new(p.parse_expr()?)) };

            if p.at(TokKind::RBrack) {
                let index = low.ok_or_else(|| {
                    anyhow::anyhow!("{}: expected index expression", p.start())
                })?;
                p.expect(TokKind::RBrack, "`]`")?;
                let span = CodeRange::new(x.span.start, p.prev_end());
                return Ok(Expr { span, kind: ExprKind::Index { x: Box::new(x), index } });
            }

            p.expect(TokKind::Colon, "`:`")?;
            let high = if p.at(TokKind::RBrack) || p.at(TokKind::Colon) {
                None
            } else {
                Some(Box::new(p.parse_expr()?))
            };
            let max = if p.at(TokKind::Colon) {
                p.advance();
                Some(Box::new(p.parse_expr()?))
            } else {
                None
            };
            p.expect(TokKind::RBrack, "`]`")?;
            let span = CodeRange::new(x.span.start, p.prev_end());
            Ok(Expr { span, kind: ExprKind::Slice { x: Box::new(x), low, high, max } })
        })?;
        Ok(expr)
    }

    fn composite_body(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokKind::LBrace, "`{`")?;
        let elts = self.with_composite(true, |p| {
            let mut elts = Vec::new();
            while !p.at(TokKind::RBrace) {
                elts.push(p.composite_element()?);
                if p.at(TokKind::Comma) {
                    p.advance();
                } else {
                    break;
                }
            }
            if p.at(TokKind::Semi) {
                p.advance();
            }
            Ok(elts)
        })?;
        self.expect(TokKind::RBrace, "`}`")?;
        Ok(elts)
    }

    fn composite_element(&mut self) -> Result<Expr> {
        let start = self.start();
        // Nested literal with elided type.
        let value = if self.at(TokKind::LBrace) {
            let elts = self.composite_body()?;
            Expr {
                span: CodeRange::new(start, self.prev_end()),
                kind: ExprKind::CompositeLit { ty: None, elts },
            }
        } else {
            self.parse_expr()?
        };

        if self.at(TokKind::Colon) {
            self.advance();
            let val = self.composite_element_value()?;
            let span = CodeRange::new(start, self.prev_end());
            return Ok(Expr {
                span,
                kind: ExprKind::KeyValue { key: Box::new(value), value: Box::new(val) },
            });
        }
        Ok(value)
    }

    fn composite_element_value(&mut self) -> Result<Expr> {
        let start = self.start();
        if self.at(TokKind::LBrace) {
            let elts = self.composite_body()?;
            return Ok(Expr {
                span: CodeRange::new(start, self.prev_end()),
                kind: ExprKind::CompositeLit { ty: None, elts },
            });
        }
        self.parse_expr()
    }

    fn operand(&mut self) -> Result<Expr> {
        let start = self.start();
        let expr = match self.peek_kind() {
            TokKind::Ident => {
                let name = self.advance().text;
                Expr {
                    span: CodeRange::new(start, self.prev_end()),
                    kind: ExprKind::Ident(name),
                }
            }
            TokKind::Int | TokKind::Float | TokKind::Imag | TokKind::Char | TokKind::Str => {
                let token = self.advance();
                let kind = match token.kind {
                    TokKind::Int => LitKind::Int,
                    TokKind::Float => LitKind::Float,
                    TokKind::Imag => LitKind::Imag,
                    TokKind::Char => LitKind::Char,
                    _ => LitKind::String,
                };
                Expr {
                    span: token.span,
                    kind: ExprKind::BasicLit { kind, text: token.text },
                }
            }
            TokKind::LParen => {
                self.advance();
                let inner = self.with_composite(true, |p| p.parse_expr())?;
                self.expect(TokKind::RParen, "`)`")?;
                Expr {
                    span: CodeRange::new(start, self.prev_end()),
                    kind: ExprKind::Paren(Box::new(inner)),
                }
            }
            TokKind::Func => {
                self.advance();
                let sig = self.signature()?;
                if self.at(TokKind::LBrace) {
                    let body = self.with_composite(true, |p| p.block())?;
                    Expr {
                        span: CodeRange::new(start, self.prev_end()),
                        kind: ExprKind::FuncLit { sig, body },
                    }
                } else {
                    Expr {
                        span: CodeRange::new(start, self.prev_end()),
                        kind: ExprKind::FuncType(sig),
                    }
                }
            }
            TokKind::LBrack => {
                self.advance();
                let len = if self.at(TokKind::RBrack) {
                    None
                } else if self.at(TokKind::Ellipsis) {
                    let e_start = self.start();
                    self.advance();
                    Some(Box::new(Expr {
                        span: CodeRange::new(e_start, self.prev_end()),
                        kind: ExprKind::Ellipsis(None),
                    }))
                } else {
                    Some(Box::new(self.with_composite(true, |p| p.parse_expr())?))
                };
                self.expect(TokKind::RBrack, "`]`")?;
                let elt = self.parse_type()?;
                Expr {
                    span: CodeRange::new(start, self.prev_end()),
                    kind: ExprKind::ArrayType { len, elt: Box::new(elt) },
                }
            }
            TokKind::Map => {
                self.advance();
                self.expect(TokKind::LBrack, "`[`")?;
                let key = self.with_composite(true, |p| p.parse_type())?;
                self.expect(TokKind::RBrack, "`]`")?;
                let value = self.parse_type()?;
                Expr {
                    span: CodeRange::new(start, self.prev_end()),
                    kind: ExprKind::MapType { key: Box::new(key), value: Box::new(value) },
                }
            }
            TokKind::Chan => {
                self.advance();
                let dir = if self.at(TokKind::Arrow) {
                    self.advance();
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Expr {
                    span: CodeRange::new(start, self.prev_end()),
                    kind: ExprKind::ChanType { dir, elem: Box::new(elem) },
                }
            }
            TokKind::Struct => {
                self.advance();
                let fields = self.struct_fields()?;
                Expr {
                    span: CodeRange::new(start, self.prev_end()),
                    kind: ExprKind::StructType(fields),
                }
            }
            TokKind::Interface => {
                self.advance();
                let methods = self.interface_body()?;
                Expr {
                    span: CodeRange::new(start, self.prev_end()),
                    kind: ExprKind::InterfaceType(methods),
                }
            }
            _ => {
                let t = self.peek();
                bail!("{}: expected expression, found `{}`", t.span.start, describe(t))
            }
        };
        Ok(expr)
    }

    /// Types share the expression grammar but must never swallow a `{` as a
    /// composite literal, so they always parse in header mode.
    fn parse_type(&mut self) -> Result<Expr> {
        self.with_composite(false, |p| p.unary_expr())
    }

    fn struct_fields(&mut self) -> Result<Vec<Field>> {
        self.expect(TokKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.at(TokKind::RBrace) {
            let start = self.start();
            // Either `Name Type`, `A, B Type`, or an embedded type.
            let first = self.parse_type()?;
            let mut names = Vec::new();
            let ty;
            if self.at(TokKind::Comma) {
                names.push(expr_to_name(first)?);
                while self.at(TokKind::Comma) {
                    self.advance();
                    names.push(self.expect(TokKind::Ident, "field name")?.text);
                }
                ty = self.parse_type()?;
            } else if self.at(TokKind::Semi) || self.at(TokKind::RBrace) || self.at(TokKind::Str) {
                // Embedded field.
                ty = first;
            } else {
                names.push(expr_to_name(first)?);
                ty = self.parse_type()?;
            }
            let tag = if self.at(TokKind::Str) { Some(self.advance().text) } else { None };
            self.expect_semi()?;
            fields.push(Field { names, ty, tag, span: CodeRange::new(start, self.prev_end()) });
        }
        self.expect(TokKind::RBrace, "`}`")?;
        Ok(fields)
    }

    fn interface_body(&mut self) -> Result<Vec<Field>> {
        self.expect(TokKind::LBrace, "`{`")?;
        let mut entries = Vec::new();
        while !self.at(TokKind::RBrace) {
            let start = self.start();
            if self.at(TokKind::Ident) && self.peek_at(1) == TokKind::LParen {
                let name = self.advance().text;
                let sig = self.signature()?;
                let sig_span = sig.span;
                entries.push(Field {
                    names: vec![name],
                    ty: Expr { span: sig_span, kind: ExprKind::FuncType(sig) },
                    tag: None,
                    span: CodeRange::new(start, self.prev_end()),
                });
            } else {
                let ty = self.parse_type()?;
                entries.push(Field {
                    names: vec![],
                    ty,
                    tag: None,
                    span: CodeRange::new(start, self.prev_end()),
                });
            }
            self.expect_semi()?;
        }
        self.expect(TokKind::RBrace, "`}`")?;
        Ok(entries)
    }
}

fn describe(token: &Token) -> String {
    if token.text.is_empty() {
        match token.kind {
            TokKind::Eof => "end of file".to_string(),
            TokKind::Semi => "newline".to_string(),
            _ => format!("{:?}", token.kind),
        }
    } else {
        token.text.clone()
    }
}

fn expr_to_name(expr: Expr) -> Result<String> {
    match expr.kind {
        ExprKind::Ident(name) => Ok(name),
        _ => bail!("{}: expected field name", expr.span.start),
    }
}

fn stmt_to_expr(stmt: Stmt) -> Result<Expr> {
    match stmt.kind {
        StmtKind::Expr(e) => Ok(e),
        _ => bail!("{}: expected expression", stmt.span.start),
    }
}

fn assign_op(kind: TokKind) -> Option<AssignOp> {
    Some(match kind {
        TokKind::Assign => AssignOp::Assign,
        TokKind::Define => AssignOp::Define,
        TokKind::PlusAssign => AssignOp::Add,
        TokKind::MinusAssign => AssignOp::Sub,
        TokKind::StarAssign => AssignOp::Mul,
        TokKind::SlashAssign => AssignOp::Div,
        TokKind::PercentAssign => AssignOp::Rem,
        TokKind::AmpAssign => AssignOp::And,
        TokKind::PipeAssign => AssignOp::Or,
        TokKind::CaretAssign => AssignOp::Xor,
        TokKind::ShlAssign => AssignOp::Shl,
        TokKind::ShrAssign => AssignOp::Shr,
        TokKind::AmpCaretAssign => AssignOp::AndNot,
        _ => return None,
    })
}

fn binary_op(kind: TokKind) -> Option<BinaryOp> {
    Some(match kind {
        TokKind::LOr => BinaryOp::LOr,
        TokKind::LAnd => BinaryOp::LAnd,
        TokKind::EqEq => BinaryOp::Eq,
        TokKind::NotEq => BinaryOp::Ne,
        TokKind::Lt => BinaryOp::Lt,
        TokKind::LtEq => BinaryOp::Le,
        TokKind::Gt => BinaryOp::Gt,
        TokKind::GtEq => BinaryOp::Ge,
        TokKind::Plus => BinaryOp::Add,
        TokKind::Minus => BinaryOp::Sub,
        TokKind::Pipe => BinaryOp::Or,
        TokKind::Caret => BinaryOp::Xor,
        TokKind::Star => BinaryOp::Mul,
        TokKind::Slash => BinaryOp::Div,
        TokKind::Percent => BinaryOp::Rem,
        TokKind::Shl => BinaryOp::Shl,
        TokKind::Shr => BinaryOp::Shr,
        TokKind::Amp => BinaryOp::And,
        TokKind::AmpCaret => BinaryOp::AndNot,
        _ => return None,
    })
}

fn starts_type(kind: TokKind) -> bool {
    matches!(
        kind,
        TokKind::Ident
            | TokKind::LBrack
            | TokKind::Star
            | TokKind::Map
            | TokKind::Chan
            | TokKind::Arrow
            | TokKind::Func
            | TokKind::Interface
            | TokKind::Struct
            | TokKind::LParen
    )
}

fn is_literal_type(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Ident(_)
            | ExprKind::Selector { .. }
            | ExprKind::ArrayType { .. }
            | ExprKind::MapType { .. }
            | ExprKind::StructType(_)
    )
}

fn is_type_switch_subject(stmt: &Stmt) -> bool {
    fn is_type_assert(expr: &Expr) -> bool {
        matches!(expr.kind, ExprKind::TypeAssert { ty: None, .. })
    }
    match &stmt.kind {
        StmtKind::Expr(e) => is_type_assert(e),
        StmtKind::Assign { op: AssignOp::Define, rhs, .. } => {
            rhs.len() == 1 && is_type_assert(&rhs[0])
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> File {
        parse_file(src).expect("parse failed")
    }

    fn only_func_body(file: &File) -> &Block {
        let Decl::Func(f) = &file.decls[0] else { panic!("expected func decl") };
        f.body.as_ref().expect("expected body")
    }

    #[test]
    fn test_package_and_imports() {
        let file = parse("package main\n\nimport (\n\t\"fmt\"\n\t_ \"embed\"\n)\n");
        assert_eq!(file.package, "main");
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[0].path, "\"fmt\"");
        assert_eq!(file.imports[1].alias.as_deref(), Some("_"));
    }

    #[test]
    fn test_statement_spans_match_source() {
        let src = "package p\n\nfunc f() {\n\tx := 1\n\tx++\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        assert_eq!(body.stmts[0].span.start, SourcePos::new(4, 2));
        assert_eq!(body.stmts[0].span.end, SourcePos::new(4, 8));
        assert_eq!(body.stmts[1].span.start, SourcePos::new(5, 2));
    }

    #[test]
    fn test_three_clause_for_loop() {
        let src = "package p\nfunc f(n int) {\n\tfor i := 0; i < n; i++ {\n\t\tuse(i)\n\t}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::For(f) = &body.stmts[0].kind else { panic!("expected for") };
        assert!(f.init.as_ref().unwrap().is_binding_decl());
        assert!(matches!(f.cond.as_ref().unwrap().kind, ExprKind::Binary { .. }));
        assert!(matches!(f.post.as_ref().unwrap().kind, StmtKind::IncDec { inc: true, .. }));
        assert_eq!(f.body.stmts.len(), 1);
    }

    #[test]
    fn test_range_loop_forms() {
        let src = "package p\nfunc f(xs []int) {\n\tfor i, v := range xs {\n\t\tuse(i, v)\n\t}\n\tfor range xs {\n\t\ttick()\n\t}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::Range(r) = &body.stmts[0].kind else { panic!("expected range") };
        assert!(r.define);
        assert!(r.key.is_some() && r.value.is_some());
        let StmtKind::Range(bare) = &body.stmts[1].kind else { panic!("expected range") };
        assert!(bare.key.is_none());
    }

    #[test]
    fn test_if_with_init_and_else_chain() {
        let src = "package p\nfunc f() {\n\tif err := g(); err != nil {\n\t\ta()\n\t} else if h() {\n\t\tb()\n\t} else {\n\t\tc()\n\t}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::If(i) = &body.stmts[0].kind else { panic!("expected if") };
        assert!(i.init.as_ref().unwrap().is_binding_decl());
        let els = i.else_branch.as_ref().unwrap();
        let StmtKind::If(elif) = &els.kind else { panic!("expected else-if") };
        assert!(matches!(
            elif.else_branch.as_ref().unwrap().kind,
            StmtKind::Block(_)
        ));
    }

    #[test]
    fn test_switch_with_init_and_default() {
        let src = "package p\nfunc f(c string) {\n\tswitch x := g(); c {\n\tcase \"a\", \"b\":\n\t\tuse(x)\n\tdefault:\n\t\tother()\n\t}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::Switch(s) = &body.stmts[0].kind else { panic!("expected switch") };
        assert!(s.init.is_some());
        assert!(s.tag.is_some());
        assert_eq!(s.cases.len(), 2);
        assert_eq!(s.cases[0].exprs.len(), 2);
        assert!(s.cases[1].is_default());
    }

    #[test]
    fn test_type_switch_subject_is_a_statement() {
        let src = "package p\nfunc f(v interface{}) {\n\tswitch x := v.(type) {\n\tcase int:\n\t\tuse(x)\n\t}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::TypeSwitch(ts) = &body.stmts[0].kind else { panic!("expected type switch") };
        assert!(matches!(
            ts.assign.kind,
            StmtKind::Assign { op: AssignOp::Define, .. }
        ));
    }

    #[test]
    fn test_tagless_switch() {
        let src = "package p\nfunc f(n int) {\n\tswitch {\n\tcase n > 0:\n\t\tpos()\n\t}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::Switch(s) = &body.stmts[0].kind else { panic!("expected switch") };
        assert!(s.init.is_none() && s.tag.is_none());
    }

    #[test]
    fn test_composite_literal_needs_parens_in_header() {
        // `if x == (T{}) {}` parses; the brace after the condition opens the
        // body, not a literal.
        let src = "package p\nfunc f(x T) bool {\n\tif x == (T{}) {\n\t\treturn true\n\t}\n\treturn false\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        assert!(matches!(body.stmts[0].kind, StmtKind::If(_)));
    }

    #[test]
    fn test_composite_and_slice_expressions() {
        let src = "package p\nfunc f() {\n\tstack = append(stack, decimal.Zero)\n\tstack = stack[:len(stack)-1]\n\txs := []int{1, 2, 3}\n\tm := map[string]int{\"a\": 1}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        assert_eq!(body.stmts.len(), 4);
        let StmtKind::Assign { rhs, .. } = &body.stmts[1].kind else { panic!() };
        assert!(matches!(rhs[0].kind, ExprKind::Slice { .. }));
        let StmtKind::Assign { rhs, .. } = &body.stmts[2].kind else { panic!() };
        assert!(matches!(rhs[0].kind, ExprKind::CompositeLit { .. }));
    }

    #[test]
    fn test_func_literal_and_defer_go() {
        let src = "package p\nfunc f() {\n\tdefer cleanup()\n\tgo func(n int) {\n\t\twork(n)\n\t}(7)\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        assert!(matches!(body.stmts[0].kind, StmtKind::Defer(_)));
        let StmtKind::Go(call) = &body.stmts[1].kind else { panic!("expected go") };
        let ExprKind::Call { fun, .. } = &call.kind else { panic!("expected call") };
        assert!(matches!(fun.kind, ExprKind::FuncLit { .. }));
    }

    #[test]
    fn test_precedence_and_parens() {
        let src = "package p\nfunc f(a, b, c int) int {\n\treturn a + b*c\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::Return(exprs) = &body.stmts[0].kind else { panic!() };
        let ExprKind::Binary { op: BinaryOp::Add, y, .. } = &exprs[0].kind else {
            panic!("expected + at the top");
        };
        assert!(matches!(y.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_method_declaration_with_receiver() {
        let src = "package p\nfunc (s *Stack) Push(v int) {\n\ts.items = append(s.items, v)\n}\n";
        let file = parse(src);
        let Decl::Func(f) = &file.decls[0] else { panic!() };
        let recv = f.recv.as_ref().unwrap();
        assert_eq!(recv.names, vec!["s".to_string()]);
        assert!(matches!(recv.ty.kind, ExprKind::Star(_)));
        assert_eq!(f.name, "Push");
    }

    #[test]
    fn test_grouped_var_and_type_decls() {
        let src = "package p\n\nvar (\n\ta, b int\n\tc = 3\n)\n\ntype Pair struct {\n\tX, Y int\n\tNote string `json:\"note\"`\n}\n";
        let file = parse(src);
        assert_eq!(file.decls.len(), 2);
        let Decl::Gen(g) = &file.decls[0] else { panic!() };
        assert!(g.grouped);
        assert_eq!(g.specs.len(), 2);
        let Decl::Gen(t) = &file.decls[1] else { panic!() };
        let Spec::Type(spec) = &t.specs[0] else { panic!() };
        let ExprKind::StructType(fields) = &spec.ty.kind else { panic!() };
        assert_eq!(fields[0].names, vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(fields[1].tag.as_deref(), Some("`json:\"note\"`"));
    }

    #[test]
    fn test_labeled_statement_and_branches() {
        let src = "package p\nfunc f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::Labeled { label, stmt } = &body.stmts[0].kind else { panic!() };
        assert_eq!(label, "outer");
        let StmtKind::For(f) = &stmt.kind else { panic!() };
        let StmtKind::Branch { keyword, label } = &f.body.stmts[0].kind else { panic!() };
        assert_eq!(*keyword, BranchKind::Break);
        assert_eq!(label.as_deref(), Some("outer"));
    }

    #[test]
    fn test_multiline_call_arguments() {
        let src = "package p\nfunc f() {\n\tg(\n\t\ta,\n\t\tb,\n\t)\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let StmtKind::Expr(e) = &body.stmts[0].kind else { panic!() };
        let ExprKind::Call { args, .. } = &e.kind else { panic!() };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_statement_ids_are_unique() {
        let src = "package p\nfunc f() {\n\ta()\n\tb()\n\tif c() {\n\t\td()\n\t}\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        let mut ids = Vec::new();
        fn collect(stmts: &[Stmt], ids: &mut Vec<u32>) {
            for s in stmts {
                ids.push(s.id.0);
                if let StmtKind::If(i) = &s.kind {
                    collect(&i.then.stmts, ids);
                }
            }
        }
        collect(&body.stmts, &mut ids);
        let mut dedup = ids.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(ids.len(), dedup.len(), "ids must be unique: {:?}", ids);
    }

    #[test]
    fn test_select_is_rejected() {
        let err = parse_file("package p\nfunc f() {\n\tselect {}\n}\n").unwrap_err();
        assert!(err.to_string().contains("select"));
    }

    #[test]
    fn test_channel_operations() {
        let src = "package p\nfunc f(ch chan int) {\n\tch <- 1\n\tv := <-ch\n\tuse(v)\n}\n";
        let file = parse(src);
        let body = only_func_body(&file);
        assert!(matches!(body.stmts[0].kind, StmtKind::Send { .. }));
        let StmtKind::Assign { rhs, .. } = &body.stmts[1].kind else { panic!() };
        assert!(matches!(rhs[0].kind, ExprKind::Unary { op: UnaryOp::Recv, .. }));
    }

    #[test]
    fn test_rpn_style_function_parses() {
        // Condensed from the kind of code this tool instruments.
        let src = r#"package rpn

import (
	"errors"
	"strings"
)

func Evaluate(input string) (int, error) {
	var stack []int
	inputs := strings.Split(input, " ")
	for _, command := range inputs {
		switch command {
		case "+", "-":
			if len(stack) < 2 {
				return 0, errors.New("stack overflow")
			}
			lhs := stack[len(stack)-2]
			rhs := stack[len(stack)-1]
			stack = stack[:len(stack)-1]
			if command == "+" {
				rhs = lhs + rhs
			} else {
				rhs = lhs - rhs
			}
			stack[len(stack)-1] = rhs
		default:
			val, err := parse(command)
			if err != nil {
				return val, err
			}
			stack = append(stack, val)
		}
	}
	if len(stack) != 1 {
		return 0, errors.New("unclean stack")
	}
	return stack[0], nil
}
"#;
        let file = parse(src);
        assert_eq!(file.package, "rpn");
        assert_eq!(file.imports.len(), 2);
        let body = only_func_body(&file);
        assert_eq!(body.stmts.len(), 5);
    }
}
