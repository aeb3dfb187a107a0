use crate::docblock::DocBlock;
use crate::token::Token;

/// Complete source file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct File {
    pub pragmas: Vec<Pragma>,
    pub namespace: Option<Name>,
    pub uses: Vec<UseStmt>,
    pub stmts: Vec<Stmt>,
}

/// `declare(name = value);`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pragma {
    pub name: String,
    pub value: Expr,
}

/// What a `use` statement imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UseKind {
    #[default]
    Class,
    Function,
    Const,
}

/// `use [function|const] Name [as alias];`, also used for trait imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseStmt {
    pub kind: UseKind,
    pub name: Name,
    pub alias: Option<String>,
    /// Comment on the same line after `;`.
    pub comment: Option<String>,
}

/// Possibly qualified name, e.g. `\Foo\Bar`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Name {
    pub parts: Vec<String>,
    /// Starts with `\`.
    pub global: bool,
}

impl Name {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() || self.parts.iter().any(String::is_empty)
    }
}

/// Type hint: `?Name` or a union `A|B`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub nullable: bool,
    pub names: Vec<Name>,
}

/// Declaration with its optional doc comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub doc: Option<DocBlock>,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Const(ConstDecl),
    Var(VarDecl),
    Func(FuncDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Trait(TraitDecl),
}

/// `const NAME = value;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: String,
    pub value: Expr,
    pub comment: Option<String>,
}

/// Property: `[Type] $name [= value];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub ty: Option<Type>,
    pub name: String,
    pub value: Option<Expr>,
    pub comment: Option<String>,
}

/// Named function or method. Abstract and interface methods have no body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Returns by reference: `function &name()`.
    pub by_ref: bool,
    pub name: String,
    pub params: ParamList,
    pub result: Option<Type>,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamList {
    pub params: Vec<Param>,
    /// The list was broken over several lines in the source.
    pub multiline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Promoted constructor parameter: `private readonly Foo $x`.
    pub visibility: Visibility,
    pub readonly: bool,
    pub ty: Option<Type>,
    pub by_ref: bool,
    pub variadic: bool,
    pub name: String,
    pub default: Option<Expr>,
}

/// `abstract` or `final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inheritance {
    Abstract,
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassDecl {
    /// `None` for anonymous classes.
    pub name: Option<String>,
    pub inheritance: Option<Inheritance>,
    /// Constructor arguments of an anonymous class.
    pub args: Option<UnknownExpr>,
    pub extends: Option<Name>,
    pub implements: Vec<Name>,
    pub traits: Vec<UseStmt>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<Name>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitDecl {
    pub name: String,
    pub traits: Vec<UseStmt>,
    pub members: Vec<Member>,
}

/// Entry in a class, interface or trait body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Comment(String),
    Decl(MemberDecl),
}

impl Member {
    /// Comments, constants and properties without doc comments. Runs of
    /// these are printed without blank lines between them.
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        match self {
            Self::Comment(_) => true,
            Self::Decl(m) => {
                m.decl.doc.is_none() && matches!(m.decl.kind, DeclKind::Const(_) | DeclKind::Var(_))
            }
        }
    }
}

/// Constant, property or method with its modifiers. The doc comment lives
/// on the wrapped declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub modifiers: Modifiers,
    pub decl: Decl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// No explicit visibility.
    #[default]
    Default,
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub inheritance: Option<Inheritance>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Comment(String),
    Block(Block),
    If(IfStmt),
    Switch(SwitchStmt),
    /// `case x:` or `default:` inside a switch body.
    Case(CaseLabel),
    For(ForStmt),
    Try(TryStmt),
    /// `?> text <?php`
    Markup(Markup),
    /// Only at the top level.
    Decl(Decl),
    Unknown(UnknownStmt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then: Box<Stmt>,
    pub otherwise: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchStmt {
    pub tag: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseLabel {
    /// `None` for `default`.
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForStmt {
    pub init: Option<Expr>,
    pub cond: Option<Expr>,
    pub post: Option<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryStmt {
    pub body: Block,
    pub catches: Vec<Catch>,
    pub finally: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catch {
    /// Everything between the parentheses, e.g. `Foo | Bar $e`.
    pub cond: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    pub text: String,
    /// Followed by `<?php`; otherwise the file ends here.
    pub reopen: bool,
}

/// Any statement the parser does not model, kept token for token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStmt {
    pub doc: Option<DocBlock>,
    pub expr: Expr,
    /// `while (...) { ... }` and similar.
    pub body: Option<Block>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Unknown(UnknownExpr),
    /// Number or string literal, or a bare identifier such as `true`.
    Lit(Token),
    Name(Name),
    /// `Foo::BAR`
    StaticSelector { class: Name, member: String },
    Array(ArrayLit),
}

/// Token run with nested constructs the printer needs to lay out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnknownExpr {
    pub elems: Vec<Elem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elem {
    Token(Token),
    /// `( ... )`, possibly empty.
    Paren(UnknownExpr),
    /// `{ ... }` after `->` or after the subject of a `match`.
    Braced(UnknownExpr),
    Class(Box<ClassDecl>),
    Func(Box<FuncLit>),
}

/// `[...]` or `array(...)` in a constant context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArrayLit {
    /// Written as `array(...)`.
    pub long: bool,
    pub elems: Vec<ArrayElem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayElem {
    pub key: Option<Expr>,
    pub value: Expr,
}

/// Closure: `function (...) use (...) { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncLit {
    pub by_ref: bool,
    pub params: ParamList,
    pub uses: Option<ParamList>,
    pub result: Option<Type>,
    pub body: Block,
}
