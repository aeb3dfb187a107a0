//! Pretty-printer that writes a parsed file back out in canonical layout.
//!
//! Indentation uses tabs. `=` signs of adjacent constants and properties,
//! and the columns of multi-line parameter lists, are aligned with spaces
//! by [`ColumnWriter`]. [`Trimmer`] then drops trailing blanks. Anything
//! the parser keeps as raw tokens is written back as it was, apart from
//! trailing whitespace.

use std::io::{self, Write};

use tracing::{debug, trace};

use crate::align::ColumnWriter;
use crate::ast::{
    ArrayLit, Block, ClassDecl, ConstDecl, Decl, DeclKind, Elem, Expr, File, FuncDecl, FuncLit,
    IfStmt, Inheritance, InterfaceDecl, Member, MemberDecl, Modifiers, Name, Param, ParamList,
    Pragma, Stmt, TraitDecl, Type, UnknownExpr, UnknownStmt, UseKind, UseStmt, VarDecl,
    Visibility,
};
use crate::docblock::DocBlock;
use crate::token::{Token, TokenKind};
use crate::trimmer::{ESCAPE, Trimmer};

/// Error produced while printing.
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    /// The tree cannot be printed as valid source, e.g. an empty name.
    #[error("invalid tree: {0}")]
    InvalidTree(&'static str),
    #[error("output is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

type PResult = Result<(), PrintError>;

/// Print `file` to `w`.
///
/// # Errors
///
/// Returns `PrintError` if the tree is malformed or writing fails. Output
/// may be partial in that case.
pub fn fprint<W: Write>(w: W, file: &File) -> Result<(), PrintError> {
    let mut p = Printer {
        out: ColumnWriter::new(Trimmer::new(w)),
        indent: 0,
    };
    p.file(file)?;
    p.out.flush()?;
    Ok(())
}

/// Format a parsed file into a string.
///
/// # Errors
///
/// Returns `PrintError` if the tree is malformed.
pub fn format(file: &File) -> Result<String, PrintError> {
    let mut buf = Vec::new();
    fprint(&mut buf, file)?;
    let out = String::from_utf8(buf)?;
    debug!(bytes = out.len(), "formatted file");
    Ok(out)
}

const fn is_block_decl(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::Decl(Decl {
            kind: DeclKind::Func(_) | DeclKind::Class(_) | DeclKind::Interface(_) | DeclKind::Trait(_),
            ..
        })
    )
}

fn is_line_comment(text: &str) -> bool {
    text.starts_with("//") || text.starts_with('#')
}

/// Whether the printed statement ends inside a line comment.
fn ends_with_line_comment(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Comment(text) => is_line_comment(text),
        Stmt::Unknown(u) => u.comment.as_deref().is_some_and(is_line_comment),
        Stmt::If(s) => s
            .otherwise
            .as_deref()
            .map_or_else(|| ends_with_line_comment(&s.then), ends_with_line_comment),
        Stmt::For(s) => ends_with_line_comment(&s.body),
        _ => false,
    }
}

struct Printer<W> {
    out: W,
    indent: usize,
}

impl<W: Write> Printer<W> {
    fn text(&mut self, s: &str) -> PResult {
        self.out.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Text the aligner and trimmer must leave alone.
    fn escaped(&mut self, s: &str) -> PResult {
        self.out.write_all(&[ESCAPE])?;
        self.out.write_all(s.as_bytes())?;
        self.out.write_all(&[ESCAPE])?;
        Ok(())
    }

    fn tok(&mut self, kind: TokenKind) -> PResult {
        let text = kind
            .spelling()
            .ok_or(PrintError::InvalidTree("token without fixed spelling"))?;
        self.text(text)
    }

    fn tabs(&mut self, n: usize) -> PResult {
        for _ in 0..n {
            self.out.write_all(b"\t")?;
        }
        Ok(())
    }

    fn newline(&mut self) -> PResult {
        self.text("\n")?;
        self.tabs(self.indent)
    }

    fn open_brace(&mut self) -> PResult {
        self.indent += 1;
        self.tok(TokenKind::Lbrace)
    }

    fn close_brace(&mut self) -> PResult {
        self.indent = self.indent.saturating_sub(1);
        self.tabs(self.indent)?;
        self.tok(TokenKind::Rbrace)
    }

    // --- file level -----------------------------------------------------

    fn file(&mut self, file: &File) -> PResult {
        self.tok(TokenKind::OpenTag)?;
        self.text("\n")?;
        if !file.pragmas.is_empty() {
            self.text("\n")?;
            for pragma in &file.pragmas {
                self.pragma(pragma)?;
                self.text("\n")?;
            }
        }
        if let Some(ns) = &file.namespace {
            // Namespaces are always global.
            self.text("\n")?;
            self.tok(TokenKind::Namespace)?;
            self.text(" ")?;
            self.name(ns, false)?;
            self.tok(TokenKind::Semicolon)?;
            self.text("\n")?;
        }
        if !file.uses.is_empty() {
            self.text("\n")?;
            for stmt in &file.uses {
                self.use_stmt(stmt, false)?;
                self.text("\n")?;
            }
        }
        if !file.stmts.is_empty() {
            self.text("\n")?;
        }
        let mut prev: Option<&Stmt> = None;
        for stmt in &file.stmts {
            if let Some(prev) = prev {
                let comment = matches!(prev, Stmt::Comment(_));
                if is_block_decl(prev) || (is_block_decl(stmt) && !comment) {
                    self.text("\n")?;
                }
            }
            trace!(decl = is_block_decl(stmt), "printing top-level statement");
            self.stmt(stmt)?;
            match stmt {
                // Alignment never spans a declaration.
                _ if is_block_decl(stmt) => self.text("\x0c")?,
                Stmt::Markup(m) if !m.reopen => {}
                _ => self.text("\n")?,
            }
            prev = Some(stmt);
        }
        Ok(())
    }

    fn pragma(&mut self, pragma: &Pragma) -> PResult {
        self.tok(TokenKind::Declare)?;
        self.tok(TokenKind::Lparen)?;
        self.text(&pragma.name)?;
        self.tok(TokenKind::Assign)?;
        self.expr(&pragma.value)?;
        self.tok(TokenKind::Rparen)?;
        self.tok(TokenKind::Semicolon)
    }

    /// File-level imports are resolved from the global namespace, so a
    /// leading `\` is dropped unless `keep_global` is set.
    fn use_stmt(&mut self, stmt: &UseStmt, keep_global: bool) -> PResult {
        self.tok(TokenKind::Use)?;
        self.text(" ")?;
        match stmt.kind {
            UseKind::Class => {}
            UseKind::Function => {
                self.tok(TokenKind::Function)?;
                self.text(" ")?;
            }
            UseKind::Const => {
                self.tok(TokenKind::Const)?;
                self.text(" ")?;
            }
        }
        self.name(&stmt.name, keep_global)?;
        if let Some(alias) = &stmt.alias {
            self.text(" ")?;
            self.tok(TokenKind::As)?;
            self.text(" ")?;
            self.text(alias)?;
        }
        self.tok(TokenKind::Semicolon)?;
        self.comment(stmt.comment.as_deref())
    }

    fn comment(&mut self, comment: Option<&str>) -> PResult {
        if let Some(text) = comment {
            self.text(" ")?;
            self.text(text)?;
        }
        Ok(())
    }

    fn doc(&mut self, doc: &DocBlock) -> PResult {
        let indent = "\t".repeat(self.indent);
        self.text(&doc.render(&indent))?;
        self.newline()
    }

    fn name(&mut self, name: &Name, keep_global: bool) -> PResult {
        if name.is_empty() {
            return Err(PrintError::InvalidTree("empty name"));
        }
        if name.global && keep_global {
            self.tok(TokenKind::Backslash)?;
        }
        for (i, part) in name.parts.iter().enumerate() {
            if i > 0 {
                self.tok(TokenKind::Backslash)?;
            }
            self.text(part)?;
        }
        Ok(())
    }

    fn names(&mut self, names: &[Name]) -> PResult {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.tok(TokenKind::Comma)?;
                self.text(" ")?;
            }
            self.name(name, true)?;
        }
        Ok(())
    }

    fn ty(&mut self, ty: &Type) -> PResult {
        if ty.names.is_empty() {
            return Err(PrintError::InvalidTree("type without names"));
        }
        if ty.nullable {
            self.tok(TokenKind::Qmark)?;
        }
        for (i, name) in ty.names.iter().enumerate() {
            if i > 0 {
                self.tok(TokenKind::Or)?;
            }
            self.name(name, true)?;
        }
        Ok(())
    }

    // --- declarations ---------------------------------------------------

    fn decl(&mut self, decl: &Decl) -> PResult {
        if let Some(doc) = &decl.doc {
            self.doc(doc)?;
        }
        match &decl.kind {
            DeclKind::Const(c) => self.const_decl(c),
            DeclKind::Var(v) => self.var_decl(v),
            DeclKind::Func(f) => self.func_decl(f),
            DeclKind::Class(c) => self.class_decl(c),
            DeclKind::Interface(i) => self.interface_decl(i),
            DeclKind::Trait(t) => self.trait_decl(t),
        }
    }

    fn const_decl(&mut self, c: &ConstDecl) -> PResult {
        self.tok(TokenKind::Const)?;
        self.text(" ")?;
        self.text(&c.name)?;
        self.text("\x0b")?;
        self.tok(TokenKind::Assign)?;
        self.text(" ")?;
        self.expr(&c.value)?;
        self.tok(TokenKind::Semicolon)?;
        self.comment(c.comment.as_deref())
    }

    fn var_decl(&mut self, v: &VarDecl) -> PResult {
        if let Some(ty) = &v.ty {
            self.ty(ty)?;
            self.text(" ")?;
        }
        self.text(&v.name)?;
        if let Some(value) = &v.value {
            self.text("\x0b")?;
            self.tok(TokenKind::Assign)?;
            self.text(" ")?;
            self.expr(value)?;
        }
        self.tok(TokenKind::Semicolon)?;
        self.comment(v.comment.as_deref())
    }

    fn func_decl(&mut self, f: &FuncDecl) -> PResult {
        self.tok(TokenKind::Function)?;
        self.text(" ")?;
        if f.by_ref {
            self.tok(TokenKind::And)?;
        }
        self.text(&f.name)?;
        self.params(&f.params)?;
        self.result(f.result.as_ref())?;
        match &f.body {
            Some(body) => {
                self.newline()?;
                self.block(body)
            }
            None => self.tok(TokenKind::Semicolon),
        }
    }

    fn result(&mut self, result: Option<&Type>) -> PResult {
        if let Some(ty) = result {
            self.tok(TokenKind::Colon)?;
            self.text(" ")?;
            self.ty(ty)?;
        }
        Ok(())
    }

    fn params(&mut self, list: &ParamList) -> PResult {
        self.tok(TokenKind::Lparen)?;
        if list.multiline && !list.params.is_empty() {
            // One parameter per line: [modifiers and type] name [= default].
            let prefixed = list.params.iter().any(|p| {
                p.ty.is_some() || p.readonly || p.visibility != Visibility::Default
            });
            self.indent += 1;
            for param in &list.params {
                self.newline()?;
                if prefixed {
                    self.param_prefix(param)?;
                    self.text("\x0b")?;
                }
                self.param_name(param)?;
                if let Some(default) = &param.default {
                    self.text("\x0b")?;
                    self.tok(TokenKind::Assign)?;
                    self.text(" ")?;
                    self.expr(default)?;
                }
                self.tok(TokenKind::Comma)?;
            }
            self.indent -= 1;
            self.newline()?;
        } else {
            for (i, param) in list.params.iter().enumerate() {
                if i > 0 {
                    self.tok(TokenKind::Comma)?;
                    self.text(" ")?;
                }
                if self.param_prefix(param)? {
                    self.text(" ")?;
                }
                self.param_name(param)?;
                if let Some(default) = &param.default {
                    self.text(" ")?;
                    self.tok(TokenKind::Assign)?;
                    self.text(" ")?;
                    self.expr(default)?;
                }
            }
        }
        self.tok(TokenKind::Rparen)
    }

    /// Visibility, `readonly` and type. Reports whether anything was
    /// written.
    fn param_prefix(&mut self, param: &Param) -> Result<bool, PrintError> {
        let mut wrote = self.visibility(param.visibility)?;
        if param.readonly {
            if wrote {
                self.text(" ")?;
            }
            self.tok(TokenKind::Readonly)?;
            wrote = true;
        }
        if let Some(ty) = &param.ty {
            if wrote {
                self.text(" ")?;
            }
            self.ty(ty)?;
            wrote = true;
        }
        Ok(wrote)
    }

    fn param_name(&mut self, param: &Param) -> PResult {
        if param.by_ref {
            self.tok(TokenKind::And)?;
        }
        if param.variadic {
            self.tok(TokenKind::Ellipsis)?;
        }
        self.text(&param.name)
    }

    fn visibility(&mut self, vis: Visibility) -> Result<bool, PrintError> {
        let kind = match vis {
            Visibility::Default => return Ok(false),
            Visibility::Public => TokenKind::Public,
            Visibility::Protected => TokenKind::Protected,
            Visibility::Private => TokenKind::Private,
        };
        self.tok(kind)?;
        Ok(true)
    }

    fn inheritance(&mut self, inheritance: Option<Inheritance>) -> PResult {
        match inheritance {
            Some(Inheritance::Abstract) => self.tok(TokenKind::Abstract)?,
            Some(Inheritance::Final) => self.tok(TokenKind::Final)?,
            None => return Ok(()),
        }
        self.text(" ")
    }

    fn class_decl(&mut self, c: &ClassDecl) -> PResult {
        self.inheritance(c.inheritance)?;
        self.tok(TokenKind::Class)?;
        if let Some(name) = &c.name {
            self.text(" ")?;
            self.text(name)?;
        } else if let Some(args) = &c.args {
            self.paren(args)?;
        }
        if let Some(extends) = &c.extends {
            self.text(" ")?;
            self.tok(TokenKind::Extends)?;
            self.text(" ")?;
            self.name(extends, true)?;
        }
        if !c.implements.is_empty() {
            self.text(" ")?;
            self.tok(TokenKind::Implements)?;
            self.text(" ")?;
            self.names(&c.implements)?;
        }
        if c.name.is_some() {
            self.newline()?;
        } else {
            // Anonymous classes keep the brace on the same line, like
            // closures.
            self.text(" ")?;
        }
        self.class_body(&c.traits, &c.members)
    }

    fn interface_decl(&mut self, i: &InterfaceDecl) -> PResult {
        self.tok(TokenKind::Interface)?;
        self.text(" ")?;
        self.text(&i.name)?;
        if !i.extends.is_empty() {
            self.text(" ")?;
            self.tok(TokenKind::Extends)?;
            self.text(" ")?;
            self.names(&i.extends)?;
        }
        self.newline()?;
        self.class_body(&[], &i.members)
    }

    fn trait_decl(&mut self, t: &TraitDecl) -> PResult {
        self.tok(TokenKind::Trait)?;
        self.text(" ")?;
        self.text(&t.name)?;
        self.newline()?;
        self.class_body(&t.traits, &t.members)
    }

    fn class_body(&mut self, traits: &[UseStmt], members: &[Member]) -> PResult {
        self.open_brace()?;
        self.text("\n")?;
        for stmt in traits {
            self.tabs(self.indent)?;
            self.use_stmt(stmt, true)?;
            self.text("\n")?;
        }
        if !traits.is_empty() && !members.is_empty() {
            self.text("\n")?;
        }
        let mut prev: Option<&Member> = None;
        for member in members {
            if let Some(prev) = prev {
                // Comments stick to the member that follows them.
                let comment = matches!(prev, Member::Comment(_));
                if !comment && !(prev.is_simple() && member.is_simple()) {
                    self.text("\n")?;
                }
            }
            self.tabs(self.indent)?;
            match member {
                Member::Comment(text) => self.text(text)?,
                Member::Decl(m) => self.member_decl(m)?,
            }
            self.text("\n")?;
            prev = Some(member);
        }
        self.close_brace()
    }

    fn member_decl(&mut self, m: &MemberDecl) -> PResult {
        if let Some(doc) = &m.decl.doc {
            self.doc(doc)?;
        }
        self.modifiers(m.modifiers)?;
        match &m.decl.kind {
            DeclKind::Const(_) if m.modifiers.is_static => {
                Err(PrintError::InvalidTree("static class constant"))
            }
            DeclKind::Const(c) => self.const_decl(c),
            DeclKind::Var(v) => self.var_decl(v),
            DeclKind::Func(f) => self.func_decl(f),
            DeclKind::Class(_) | DeclKind::Interface(_) | DeclKind::Trait(_) => {
                Err(PrintError::InvalidTree("class-like declaration as a member"))
            }
        }
    }

    fn modifiers(&mut self, m: Modifiers) -> PResult {
        self.inheritance(m.inheritance)?;
        if self.visibility(m.visibility)? {
            self.text(" ")?;
        }
        if m.is_static {
            self.tok(TokenKind::Static)?;
            self.text(" ")?;
        }
        if m.readonly {
            self.tok(TokenKind::Readonly)?;
            self.text(" ")?;
        }
        Ok(())
    }

    // --- statements -----------------------------------------------------

    fn block(&mut self, block: &Block) -> PResult {
        self.open_brace()?;
        self.text("\n")?;
        for stmt in &block.stmts {
            let indent = match stmt {
                Stmt::Case(_) => self.indent.saturating_sub(1),
                _ => self.indent,
            };
            self.tabs(indent)?;
            self.stmt(stmt)?;
            self.text("\n")?;
        }
        self.close_brace()
    }

    fn stmt(&mut self, stmt: &Stmt) -> PResult {
        match stmt {
            Stmt::Comment(text) => self.text(text),
            Stmt::Block(block) => self.block(block),
            Stmt::If(s) => self.if_stmt(s),
            Stmt::Switch(s) => {
                self.tok(TokenKind::Switch)?;
                self.text(" ")?;
                self.cond(&s.tag)?;
                self.text(" ")?;
                self.block(&s.body)
            }
            Stmt::Case(label) => {
                match &label.value {
                    Some(value) => {
                        self.tok(TokenKind::Case)?;
                        self.text(" ")?;
                        self.expr(value)?;
                    }
                    None => self.tok(TokenKind::Default)?,
                }
                self.tok(TokenKind::Colon)
            }
            Stmt::For(s) => {
                self.tok(TokenKind::For)?;
                self.text(" ")?;
                self.tok(TokenKind::Lparen)?;
                if let Some(init) = &s.init {
                    self.expr(init)?;
                }
                for part in [&s.cond, &s.post] {
                    self.tok(TokenKind::Semicolon)?;
                    if let Some(x) = part {
                        self.text(" ")?;
                        self.expr(x)?;
                    }
                }
                self.tok(TokenKind::Rparen)?;
                self.text(" ")?;
                self.stmt(&s.body)
            }
            Stmt::Try(s) => {
                self.tok(TokenKind::Try)?;
                self.text(" ")?;
                self.block(&s.body)?;
                for catch in &s.catches {
                    self.text(" ")?;
                    self.tok(TokenKind::Catch)?;
                    self.text(" ")?;
                    self.cond(&catch.cond)?;
                    self.text(" ")?;
                    self.block(&catch.body)?;
                }
                if let Some(finally) = &s.finally {
                    self.text(" ")?;
                    self.tok(TokenKind::Finally)?;
                    self.text(" ")?;
                    self.block(finally)?;
                }
                Ok(())
            }
            Stmt::Markup(m) => {
                self.tok(TokenKind::CloseTag)?;
                if !m.text.is_empty() {
                    self.escaped(&m.text)?;
                }
                if m.reopen {
                    self.tok(TokenKind::OpenTag)?;
                }
                Ok(())
            }
            Stmt::Decl(decl) => self.decl(decl),
            Stmt::Unknown(u) => self.unknown_stmt(u),
        }
    }

    fn if_stmt(&mut self, s: &IfStmt) -> PResult {
        self.tok(TokenKind::If)?;
        self.text(" ")?;
        self.cond(&s.cond)?;
        self.text(" ")?;
        self.stmt(&s.then)?;
        let Some(otherwise) = &s.otherwise else {
            return Ok(());
        };
        if ends_with_line_comment(&s.then) {
            self.newline()?;
        } else {
            self.text(" ")?;
        }
        self.tok(TokenKind::Else)?;
        match otherwise.as_ref() {
            // elseif
            Stmt::If(inner) => self.if_stmt(inner),
            other => {
                self.text(" ")?;
                self.stmt(other)
            }
        }
    }

    fn cond(&mut self, cond: &Expr) -> PResult {
        self.tok(TokenKind::Lparen)?;
        self.expr(cond)?;
        self.tok(TokenKind::Rparen)
    }

    fn unknown_stmt(&mut self, u: &UnknownStmt) -> PResult {
        if let Some(doc) = &u.doc {
            self.doc(doc)?;
        }
        let broke = match &u.expr {
            Expr::Unknown(x) if x.elems.is_empty() => {
                return Err(PrintError::InvalidTree("empty expression"));
            }
            Expr::Unknown(x) => self.elems(&x.elems)?,
            other => {
                self.expr(other)?;
                false
            }
        };
        match &u.body {
            Some(body) => {
                if !broke {
                    self.text(" ")?;
                }
                self.block(body)?;
            }
            None => self.tok(TokenKind::Semicolon)?,
        }
        self.comment(u.comment.as_deref())
    }

    // --- expressions ----------------------------------------------------

    fn expr(&mut self, expr: &Expr) -> PResult {
        match expr {
            Expr::Unknown(x) if x.elems.is_empty() => {
                Err(PrintError::InvalidTree("empty expression"))
            }
            Expr::Unknown(x) => {
                self.elems(&x.elems)?;
                Ok(())
            }
            Expr::Lit(tok) => self.token(tok),
            Expr::Name(name) => self.name(name, true),
            Expr::StaticSelector { class, member } => {
                self.name(class, true)?;
                self.tok(TokenKind::DoubleColon)?;
                self.text(member)
            }
            Expr::Array(array) => self.array(array),
        }
    }

    fn array(&mut self, array: &ArrayLit) -> PResult {
        let close = if array.long {
            self.text("array")?;
            self.tok(TokenKind::Lparen)?;
            TokenKind::Rparen
        } else {
            self.tok(TokenKind::Lbrack)?;
            TokenKind::Rbrack
        };
        for (i, elem) in array.elems.iter().enumerate() {
            if i > 0 {
                self.tok(TokenKind::Comma)?;
                self.text(" ")?;
            }
            if let Some(key) = &elem.key {
                self.expr(key)?;
                self.text(" ")?;
                self.tok(TokenKind::DoubleArrow)?;
                self.text(" ")?;
            }
            self.expr(&elem.value)?;
        }
        self.tok(close)
    }

    /// Write expression elements, dropping trailing whitespace. A trailing
    /// line comment is followed by a line break; the return value reports
    /// whether one was written.
    fn elems(&mut self, elems: &[Elem]) -> Result<bool, PrintError> {
        let elems = match elems.split_last() {
            Some((Elem::Token(t), rest)) if t.kind == TokenKind::Whitespace => rest,
            _ => elems,
        };
        for elem in elems {
            match elem {
                Elem::Token(tok) => self.token(tok)?,
                Elem::Paren(inner) => self.paren(inner)?,
                Elem::Braced(inner) => {
                    self.tok(TokenKind::Lbrace)?;
                    self.inner(inner)?;
                    self.tok(TokenKind::Rbrace)?;
                }
                Elem::Class(class) => self.class_decl(class)?,
                Elem::Func(func) => self.func_lit(func)?,
            }
        }
        let comment = matches!(
            elems.last(),
            Some(Elem::Token(Token { kind: TokenKind::LineComment, .. }))
        );
        if comment {
            self.newline()?;
        }
        Ok(comment)
    }

    fn paren(&mut self, inner: &UnknownExpr) -> PResult {
        self.tok(TokenKind::Lparen)?;
        self.inner(inner)?;
        self.tok(TokenKind::Rparen)
    }

    /// Contents of `(...)` or `{...}`. If the source broke the line before
    /// the closing bracket, so does the output.
    fn inner(&mut self, x: &UnknownExpr) -> PResult {
        let broke = self.elems(&x.elems)?;
        let multiline = matches!(
            x.elems.last(),
            Some(Elem::Token(t)) if t.kind == TokenKind::Whitespace && t.text.contains('\n')
        );
        if multiline && !broke {
            self.newline()?;
        }
        Ok(())
    }

    fn token(&mut self, tok: &Token) -> PResult {
        match tok.kind {
            TokenKind::String | TokenKind::InlineHtml => self.escaped(&tok.text),
            TokenKind::Whitespace if tok.text.contains('\r') => self.text(&tok.text.replace('\r', "")),
            _ => self.text(&tok.text),
        }
    }

    fn func_lit(&mut self, f: &FuncLit) -> PResult {
        self.tok(TokenKind::Function)?;
        self.text(" ")?;
        if f.by_ref {
            self.tok(TokenKind::And)?;
        }
        self.params(&f.params)?;
        if let Some(uses) = &f.uses {
            self.text(" ")?;
            self.tok(TokenKind::Use)?;
            self.text(" ")?;
            self.params(uses)?;
        }
        self.result(f.result.as_ref())?;
        self.text(" ")?;
        self.block(&f.body)
    }
}
