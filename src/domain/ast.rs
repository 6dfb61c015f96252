//! Syntax-tree model for the Go subset glint instruments.
//!
//! This is deliberately not a full Go grammar: it carries exactly the shape
//! the rewrite pass and the printer need. Types appear as expressions, the
//! same flattening the upstream Go toolchain uses, which keeps the type
//! grammar out of the statement walker entirely.

use crate::domain::position::CodeRange;

/// Identity of a statement node, assigned densely by the parser. The skip
/// set tracks statements by this id rather than by address, since the tree
/// is an owned value the rewriter moves pieces of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Id carried by statements fabricated during rewriting.
    pub const SYNTHETIC: NodeId = NodeId(u32::MAX);
}

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct File {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: CodeRange,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Local alias, including the `_` and `.` forms.
    pub alias: Option<String>,
    /// Quoted path literal, kept verbatim.
    pub path: String,
    pub span: CodeRange,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Gen(GenDecl),
}

impl Decl {
    pub fn span(&self) -> CodeRange {
        match self {
            Decl::Func(f) => f.span,
            Decl::Gen(g) => g.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<Field>,
    pub name: String,
    pub sig: FuncSig,
    /// Absent for forward declarations of externally-implemented functions.
    pub body: Option<Block>,
    pub span: CodeRange,
}

/// `var`, `const` or `type` declaration, possibly parenthesized.
#[derive(Debug, Clone)]
pub struct GenDecl {
    pub keyword: DeclKeyword,
    pub grouped: bool,
    pub specs: Vec<Spec>,
    pub span: CodeRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Var,
    Const,
    Type,
}

impl DeclKeyword {
    pub fn text(self) -> &'static str {
        match self {
            DeclKeyword::Var => "var",
            DeclKeyword::Const => "const",
            DeclKeyword::Type => "type",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Spec {
    Value(ValueSpec),
    Type(TypeSpec),
}

/// `a, b int = 1, 2` style var/const spec.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<String>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    pub span: CodeRange,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub ty: Expr,
    pub span: CodeRange,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: CodeRange,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: CodeRange,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `var`/`const`/`type` inside a block. A binding declaration.
    Decl(GenDecl),
    Empty,
    Labeled {
        label: String,
        stmt: Box<Stmt>,
    },
    Expr(Expr),
    Send {
        chan: Expr,
        value: Expr,
    },
    IncDec {
        expr: Expr,
        inc: bool,
    },
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    Go(Expr),
    Defer(Expr),
    Return(Vec<Expr>),
    Branch {
        keyword: BranchKind,
        label: Option<String>,
    },
    Block(Block),
    If(IfStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    For(ForStmt),
    Range(RangeStmt),
}

/// Assignment operator, including the short-variable definition and the
/// compound forms. `Define` introduces names and therefore marks the
/// statement as a binding declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Define,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

impl AssignOp {
    pub fn text(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Define => ":=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::AndNot => "&^=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

impl BranchKind {
    pub fn text(self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Goto => "goto",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    /// Either a `Block` statement or another `If` statement.
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub init: Option<Box<Stmt>>,
    pub tag: Option<Expr>,
    pub cases: Vec<CaseClause>,
}

#[derive(Debug, Clone)]
pub struct TypeSwitchStmt {
    pub init: Option<Box<Stmt>>,
    /// The subject clause: `x := v.(type)` or a bare `v.(type)` expression
    /// statement. Occupies a grammar slot that cannot host a block, so the
    /// rewriter must never wrap it.
    pub assign: Box<Stmt>,
    pub cases: Vec<CaseClause>,
}

/// A `case a, b:` or `default:` clause. In a type switch the listed
/// expressions are types.
#[derive(Debug, Clone)]
pub struct CaseClause {
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: CodeRange,
}

impl CaseClause {
    pub fn is_default(&self) -> bool {
        self.exprs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct RangeStmt {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    /// `:=` rather than `=` in front of `range`.
    pub define: bool,
    pub expr: Expr,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub span: CodeRange,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Ident(String),
    BasicLit {
        kind: LitKind,
        /// Lexed text, reproduced verbatim by the printer.
        text: String,
    },
    CompositeLit {
        /// Absent for nested literals that elide their type.
        ty: Option<Box<Expr>>,
        elts: Vec<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    FuncLit {
        sig: FuncSig,
        body: Block,
    },
    Paren(Box<Expr>),
    Selector {
        x: Box<Expr>,
        sel: String,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    /// `x.(T)`, or `x.(type)` when `ty` is absent (type-switch subject).
    TypeAssert {
        x: Box<Expr>,
        ty: Option<Box<Expr>>,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
    },
    /// Pointer deref or pointer type; one node serves both readings.
    Star(Box<Expr>),
    Unary {
        op: UnaryOp,
        x: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    /// `...` or `...T` in parameter position.
    Ellipsis(Option<Box<Expr>>),
    ArrayType {
        /// Absent for a slice type `[]T`.
        len: Option<Box<Expr>>,
        elt: Box<Expr>,
    },
    MapType {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    ChanType {
        dir: ChanDir,
        elem: Box<Expr>,
    },
    StructType(Vec<Field>),
    InterfaceType(Vec<Field>),
    FuncType(FuncSig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Xor,
    And,
    Recv,
}

impl UnaryOp {
    pub fn text(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::Xor => "^",
            UnaryOp::And => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LOr,
    LAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    pub fn text(self) -> &'static str {
        match self {
            BinaryOp::LOr => "||",
            BinaryOp::LAnd => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&",
            BinaryOp::AndNot => "&^",
        }
    }

    /// Go binary-operator precedence; 5 binds tightest.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LOr => 1,
            BinaryOp::LAnd => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone)]
pub struct FuncSig {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub span: CodeRange,
}

/// Parameter, result, receiver, struct field or interface method entry.
#[derive(Debug, Clone)]
pub struct Field {
    pub names: Vec<String>,
    pub ty: Expr,
    /// Struct-field tag literal, kept verbatim.
    pub tag: Option<String>,
    pub span: CodeRange,
}

impl Stmt {
    /// A statement that introduces a new name into the enclosing scope:
    /// a declaration statement or a `:=` assignment. Wrapping one in a block
    /// would hide the name from the statements that follow it.
    pub fn is_binding_decl(&self) -> bool {
        match &self.kind {
            StmtKind::Decl(_) => true,
            StmtKind::Assign { op, .. } => *op == AssignOp::Define,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::CodeRange;

    fn stmt(kind: StmtKind) -> Stmt {
        Stmt { id: NodeId(1), span: CodeRange::SYNTHETIC, kind }
    }

    fn ident(name: &str) -> Expr {
        Expr { span: CodeRange::SYNTHETIC, kind: ExprKind::Ident(name.into()) }
    }

    #[test]
    fn test_define_is_binding_decl() {
        let s = stmt(StmtKind::Assign {
            lhs: vec![ident("x")],
            op: AssignOp::Define,
            rhs: vec![ident("y")],
        });
        assert!(s.is_binding_decl());
    }

    #[test]
    fn test_plain_assign_is_not_binding_decl() {
        let s = stmt(StmtKind::Assign {
            lhs: vec![ident("x")],
            op: AssignOp::Assign,
            rhs: vec![ident("y")],
        });
        assert!(!s.is_binding_decl());
    }

    #[test]
    fn test_decl_stmt_is_binding_decl() {
        let s = stmt(StmtKind::Decl(GenDecl {
            keyword: DeclKeyword::Var,
            grouped: false,
            specs: vec![],
            span: CodeRange::SYNTHETIC,
        }));
        assert!(s.is_binding_decl());
    }

    #[test]
    fn test_expr_stmt_is_not_binding_decl() {
        assert!(!stmt(StmtKind::Expr(ident("f"))).is_binding_decl());
    }

    #[test]
    fn test_precedence_ladder() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Eq.precedence());
        assert!(BinaryOp::Eq.precedence() > BinaryOp::LAnd.precedence());
        assert!(BinaryOp::LAnd.precedence() > BinaryOp::LOr.precedence());
    }
}
