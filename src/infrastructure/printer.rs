//! Source printer for the Go subset.
//!
//! Emits tab-indented, brace-formatted code close to what gofmt produces.
//! Comments were dropped at lex time and are not reproduced; literal text is
//! emitted verbatim from the tokens. The only consumers of the output are the
//! Go toolchain and this crate's own parser, so layout favors simplicity:
//! composite literals and call arguments print on one line.

use std::fmt::Write as _;

use crate::domain::ast::{
    Block, CaseClause, ChanDir, Decl, Expr, ExprKind, Field, File, FuncDecl, FuncSig, GenDecl,
    ImportSpec, Spec, Stmt, StmtKind,
};

/// Render a whole file back to source text.
pub fn print_file(file: &File) -> String {
    let mut p = Printer { out: String::new(), indent: 0 };
    p.file(file);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn tabs(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn file(&mut self, file: &File) {
        let _ = writeln!(self.out, "package {}", file.package);

        if !file.imports.is_empty() {
            self.push("\n");
            self.imports(&file.imports);
        }

        for decl in &file.decls {
            self.push("\n");
            match decl {
                Decl::Func(f) => self.func_decl(f),
                Decl::Gen(g) => {
                    self.gen_decl(g);
                    self.push("\n");
                }
            }
        }
    }

    fn imports(&mut self, imports: &[ImportSpec]) {
        let spec = |out: &mut String, i: &ImportSpec| {
            if let Some(alias) = &i.alias {
                let _ = write!(out, "{} ", alias);
            }
            out.push_str(&i.path);
        };

        if imports.len() == 1 {
            self.push("import ");
            spec(&mut self.out, &imports[0]);
            self.push("\n");
        } else {
            self.push("import (\n");
            for i in imports {
                self.push("\t");
                spec(&mut self.out, i);
                self.push("\n");
            }
            self.push(")\n");
        }
    }

    fn func_decl(&mut self, f: &FuncDecl) {
        self.push("func ");
        if let Some(recv) = &f.recv {
            self.push("(");
            self.field(recv);
            self.push(") ");
        }
        self.push(&f.name);
        self.signature(&f.sig);
        match &f.body {
            Some(body) => {
                self.push(" ");
                self.block(body);
                self.push("\n");
            }
            None => self.push("\n"),
        }
    }

    fn signature(&mut self, sig: &FuncSig) {
        self.push("(");
        self.field_list(&sig.params);
        self.push(")");

        match sig.results.as_slice() {
            [] => {}
            [single] if single.names.is_empty() => {
                self.push(" ");
                self.expr(&single.ty);
            }
            results => {
                self.push(" (");
                self.field_list(results);
                self.push(")");
            }
        }
    }

    fn field_list(&mut self, fields: &[Field]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.field(field);
        }
    }

    fn field(&mut self, field: &Field) {
        for (i, name) in field.names.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(name);
        }
        if !field.names.is_empty() {
            self.push(" ");
        }
        self.expr(&field.ty);
        if let Some(tag) = &field.tag {
            self.push(" ");
            self.push(tag);
        }
    }

    fn gen_decl(&mut self, g: &GenDecl) {
        self.push(g.keyword.text());
        if g.grouped {
            self.push(" (\n");
            self.indent += 1;
            for spec in &g.specs {
                self.tabs();
                self.spec(spec);
                self.push("\n");
            }
            self.indent -= 1;
            self.tabs();
            self.push(")");
        } else if let Some(spec) = g.specs.first() {
            self.push(" ");
            self.spec(spec);
        }
    }

    fn spec(&mut self, spec: &Spec) {
        match spec {
            Spec::Type(t) => {
                self.push(&t.name);
                self.push(" ");
                self.expr(&t.ty);
            }
            Spec::Value(v) => {
                for (i, name) in v.names.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push(name);
                }
                if let Some(ty) = &v.ty {
                    self.push(" ");
                    self.expr(ty);
                }
                if !v.values.is_empty() {
                    self.push(" = ");
                    self.expr_list(&v.values);
                }
            }
        }
    }

    fn block(&mut self, block: &Block) {
        self.push("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.tabs();
        self.push("}");
    }

    /// One statement on its own line (or lines).
    fn stmt(&mut self, stmt: &Stmt) {
        if matches!(stmt.kind, StmtKind::Empty) {
            return;
        }
        if let StmtKind::Labeled { label, stmt: inner } = &stmt.kind {
            // Labels sit one level left of the statements around them.
            for _ in 1..self.indent {
                self.out.push('\t');
            }
            self.push(label);
            self.push(":\n");
            self.stmt(inner);
            return;
        }
        self.tabs();
        self.stmt_body(stmt);
        self.push("\n");
    }

    /// Statement text without leading indent or trailing newline.
    fn stmt_body(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Empty | StmtKind::Labeled { .. } => unreachable!("handled by stmt"),
            StmtKind::Decl(g) => self.gen_decl(g),
            StmtKind::Expr(e) => self.expr(e),
            StmtKind::Send { chan, value } => {
                self.expr(chan);
                self.push(" <- ");
                self.expr(value);
            }
            StmtKind::IncDec { expr, inc } => {
                self.expr(expr);
                self.push(if *inc { "++" } else { "--" });
            }
            StmtKind::Assign { lhs, op, rhs } => {
                self.expr_list(lhs);
                let _ = write!(self.out, " {} ", op.text());
                self.expr_list(rhs);
            }
            StmtKind::Go(e) => {
                self.push("go ");
                self.expr(e);
            }
            StmtKind::Defer(e) => {
                self.push("defer ");
                self.expr(e);
            }
            StmtKind::Return(exprs) => {
                self.push("return");
                if !exprs.is_empty() {
                    self.push(" ");
                    self.expr_list(exprs);
                }
            }
            StmtKind::Branch { keyword, label } => {
                self.push(keyword.text());
                if let Some(label) = label {
                    self.push(" ");
                    self.push(label);
                }
            }
            StmtKind::Block(b) => self.block(b),
            StmtKind::If(i) => {
                self.push("if ");
                if let Some(init) = &i.init {
                    self.stmt_body(init);
                    self.push("; ");
                }
                self.expr(&i.cond);
                self.push(" ");
                self.block(&i.then);
                if let Some(els) = &i.else_branch {
                    self.push(" else ");
                    self.stmt_body(els);
                }
            }
            StmtKind::Switch(s) => {
                self.push("switch ");
                if let Some(init) = &s.init {
                    self.stmt_body(init);
                    self.push("; ");
                }
                if let Some(tag) = &s.tag {
                    self.expr(tag);
                    self.push(" ");
                }
                self.case_list(&s.cases);
            }
            StmtKind::TypeSwitch(ts) => {
                self.push("switch ");
                if let Some(init) = &ts.init {
                    self.stmt_body(init);
                    self.push("; ");
                }
                self.stmt_body(&ts.assign);
                self.push(" ");
                self.case_list(&ts.cases);
            }
            StmtKind::For(f) => {
                self.push("for ");
                if f.init.is_some() || f.post.is_some() {
                    if let Some(init) = &f.init {
                        self.stmt_body(init);
                    }
                    self.push("; ");
                    if let Some(cond) = &f.cond {
                        self.expr(cond);
                    }
                    self.push("; ");
                    if let Some(post) = &f.post {
                        self.stmt_body(post);
                    }
                    self.push(" ");
                } else if let Some(cond) = &f.cond {
                    self.expr(cond);
                    self.push(" ");
                }
                self.block(&f.body);
            }
            StmtKind::Range(r) => {
                self.push("for ");
                if let Some(key) = &r.key {
                    self.expr(key);
                    if let Some(value) = &r.value {
                        self.push(", ");
                        self.expr(value);
                    }
                    self.push(if r.define { " := " } else { " = " });
                }
                self.push("range ");
                self.expr(&r.expr);
                self.push(" ");
                self.block(&r.body);
            }
        }
    }

    fn case_list(&mut self, cases: &[CaseClause]) {
        self.push("{\n");
        for case in cases {
            self.tabs();
            if case.is_default() {
                self.push("default:\n");
            } else {
                self.push("case ");
                self.expr_list(&case.exprs);
                self.push(":\n");
            }
            self.indent += 1;
            for stmt in &case.body {
                self.stmt(stmt);
            }
            self.indent -= 1;
        }
        self.tabs();
        self.push("}");
    }

    fn expr_list(&mut self, exprs: &[Expr]) {
        for (i, e) in exprs.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(e);
        }
    }

    fn expr(&mut self, e: &Expr) {
        match &e.kind {
            ExprKind::Ident(name) => self.push(name),
            ExprKind::BasicLit { text, .. } => self.push(text),
            ExprKind::CompositeLit { ty, elts } => {
                if let Some(ty) = ty {
                    self.expr(ty);
                }
                self.push("{");
                self.expr_list(elts);
                self.push("}");
            }
            ExprKind::KeyValue { key, value } => {
                self.expr(key);
                self.push(": ");
                self.expr(value);
            }
            ExprKind::FuncLit { sig, body } => {
                self.push("func");
                self.signature(sig);
                self.push(" ");
                self.block(body);
            }
            ExprKind::Paren(x) => {
                self.push("(");
                self.expr(x);
                self.push(")");
            }
            ExprKind::Selector { x, sel } => {
                self.expr(x);
                self.push(".");
                self.push(sel);
            }
            ExprKind::Index { x, index } => {
                self.expr(x);
                self.push("[");
                self.expr(index);
                self.push("]");
            }
            ExprKind::Slice { x, low, high, max } => {
                self.expr(x);
                self.push("[");
                if let Some(low) = low {
                    self.expr(low);
                }
                self.push(":");
                if let Some(high) = high {
                    self.expr(high);
                }
                if let Some(max) = max {
                    self.push(":");
                    self.expr(max);
                }
                self.push("]");
            }
            ExprKind::TypeAssert { x, ty } => {
                self.expr(x);
                self.push(".(");
                match ty {
                    Some(ty) => self.expr(ty),
                    None => self.push("type"),
                }
                self.push(")");
            }
            ExprKind::Call { fun, args, ellipsis } => {
                self.expr(fun);
                self.push("(");
                self.expr_list(args);
                if *ellipsis {
                    self.push("...");
                }
                self.push(")");
            }
            ExprKind::Star(x) => {
                self.push("*");
                self.expr(x);
            }
            ExprKind::Unary { op, x } => {
                self.push(op.text());
                self.expr(x);
            }
            ExprKind::Binary { op, x, y } => {
                self.expr(x);
                let _ = write!(self.out, " {} ", op.text());
                self.expr(y);
            }
            ExprKind::Ellipsis(elt) => {
                self.push("...");
                if let Some(elt) = elt {
                    self.expr(elt);
                }
            }
            ExprKind::ArrayType { len, elt } => {
                self.push("[");
                if let Some(len) = len {
                    self.expr(len);
                }
                self.push("]");
                self.expr(elt);
            }
            ExprKind::MapType { key, value } => {
                self.push("map[");
                self.expr(key);
                self.push("]");
                self.expr(value);
            }
            ExprKind::ChanType { dir, elem } => {
                self.push(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.expr(elem);
            }
            ExprKind::StructType(fields) => self.field_block("struct", fields),
            ExprKind::InterfaceType(entries) => self.field_block("interface", entries),
            ExprKind::FuncType(sig) => {
                self.push("func");
                self.signature(sig);
            }
        }
    }

    fn field_block(&mut self, keyword: &str, fields: &[Field]) {
        if fields.is_empty() {
            self.push(keyword);
            self.push("{}");
            return;
        }
        self.push(keyword);
        self.push(" {\n");
        self.indent += 1;
        for field in fields {
            self.tabs();
            // Interface methods print as `Name(args) results`, not
            // `Name func(args) results`.
            if keyword == "interface" && field.names.len() == 1 {
                if let ExprKind::FuncType(sig) = &field.ty.kind {
                    self.push(&field.names[0]);
                    self.signature(sig);
                    self.push("\n");
                    continue;
                }
            }
            self.field(field);
            self.push("\n");
        }
        self.indent -= 1;
        self.tabs();
        self.push("}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parser::parse_file;

    fn reprint(src: &str) -> String {
        print_file(&parse_file(src).expect("parse failed"))
    }

    #[test]
    fn test_formatted_source_prints_unchanged() {
        let src = "package p\n\nimport \"fmt\"\n\nfunc greet(name string) {\n\tfmt.Println(name)\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_control_flow_layout() {
        let src = "package p\n\nfunc f(n int) int {\n\tif n < 0 {\n\t\treturn -n\n\t} else if n == 0 {\n\t\treturn 1\n\t}\n\tfor i := 0; i < n; i++ {\n\t\tn += i\n\t}\n\treturn n\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_switch_layout() {
        let src = "package p\n\nfunc f(v interface{}) string {\n\tswitch x := v.(type) {\n\tcase int:\n\t\treturn \"int\"\n\tdefault:\n\t\t_ = x\n\t\treturn \"other\"\n\t}\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_grouped_decls_and_struct() {
        let src = "package p\n\nvar (\n\ta, b int\n\tc = 3\n)\n\ntype Pair struct {\n\tX, Y int\n\tNote string `json:\"note\"`\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_grouped_imports() {
        let src = "package p\n\nimport (\n\t\"errors\"\n\t\"strings\"\n)\n\nfunc f() error {\n\treturn errors.New(strings.TrimSpace(\" x \"))\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_nested_block_and_literals() {
        let src = "package p\n\nfunc f() {\n\txs := []int{1, 2, 3}\n\tm := map[string]int{\"a\": 1}\n\t{\n\t\tuse(xs, m)\n\t}\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_label_outdents() {
        let src = "package p\n\nfunc f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_printed_output_reparses() {
        let src = "package p\n\nfunc f(ch chan int, xs []string) {\n\tgo func() {\n\t\tch <- len(xs)\n\t}()\n\tdefer close(ch)\n\tfor i, s := range xs {\n\t\t_ = s[i:]\n\t}\n}\n";
        let printed = reprint(src);
        let reparsed = parse_file(&printed).expect("printed output must reparse");
        assert_eq!(print_file(&reparsed), printed);
    }
}
