//! Parser edge cases and error tests.

use phpfmt_rs::ast::{Inheritance, UseKind, Visibility};
use phpfmt_rs::{DeclKind, Error, Member, ParseErrorKind, Position, Stmt, format_str, parse};

// -----------------------------------------------------------
// Syntax errors.
// -----------------------------------------------------------

#[test]
fn parse_error_positions() {
    let cases = [
        ("<?php /**", "unterminated block comment", (1, 10)),
        ("<?php '", "string not terminated", (1, 8)),
        ("   <?php ", "expecting <?php, found InlineHtml(\"   \")", (1, 1)),
        (
            "<?php\n   /** @var */",
            "parsing doc comment: expecting type, found */",
            (2, 13),
        ),
        ("<?php function a(", "expecting ), found EOF", (1, 18)),
        ("<?php class a{", "expecting }, found EOF", (1, 15)),
        ("<?php function a($x=,", "unexpected ,, expecting literal", (1, 21)),
    ];
    for (input, message, (line, column)) in cases {
        let err = format_str(input).unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "{input:?}: {err:?}");
        assert_eq!(err.message(), message, "{input:?}");
        assert_eq!(err.position(), Some(Position::new(line, column)), "{input:?}");
    }
}

#[test]
fn parse_error_scan_errors_are_wrapped() {
    let err = parse("<?php <<< HERE x").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::Lex(_)));
    assert_eq!(err.pos, Position::new(1, 16));
}

#[test]
fn parse_error_doc_before_control_statement() {
    let err = parse("<?php /** @var int */ if ($x) {}").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::AfterDocComment { .. }));
}

#[test]
fn parse_error_readonly_method() {
    let err = parse("<?php class A { readonly function f() {} }").unwrap_err();
    assert_eq!(
        err.kind.to_string(),
        "modifier readonly not allowed on method"
    );
}

// -----------------------------------------------------------
// Structure.
// -----------------------------------------------------------

const SERVICE: &str = r"<?php

namespace

Dubax\     Asistent   \Laboratory;

use LMBase; // ok

use Dubax\Asistent\Laboratory;
use function Nette\fn_helper;

		abstract class
		Protocols extends Base implements \Countable
		{
	use Nette\    SmartObject;

	/** @var Laboratory\ProtocolRepository */
	private $protocolRepository;

public function __construct(
	Laboratory\ProtocolRepository $protocolRepository
)
{ $this->protocolRepository = $protocolRepository;}

	abstract protected function count(): int;
}
";

#[test]
fn parse_spaced_header() {
    let file = parse(SERVICE).unwrap();
    let ns = file.namespace.as_ref().unwrap();
    assert_eq!(ns.parts, ["Dubax", "Asistent", "Laboratory"]);
    assert_eq!(file.uses.len(), 3);
    assert_eq!(file.uses[0].comment.as_deref(), Some("// ok"));
    assert_eq!(file.uses[2].kind, UseKind::Function);
    assert_eq!(file.uses[2].name.parts, ["Nette", "fn_helper"]);
}

#[test]
fn parse_class_shape() {
    let file = parse(SERVICE).unwrap();
    let Stmt::Decl(decl) = &file.stmts[0] else {
        panic!("expected a declaration");
    };
    let DeclKind::Class(class) = &decl.kind else {
        panic!("expected a class");
    };
    assert_eq!(class.name.as_deref(), Some("Protocols"));
    assert_eq!(class.inheritance, Some(Inheritance::Abstract));
    assert_eq!(class.extends.as_ref().unwrap().parts, ["Base"]);
    assert!(class.implements[0].global);
    assert_eq!(class.traits[0].name.parts, ["Nette", "SmartObject"]);
    assert_eq!(class.members.len(), 3);

    let Member::Decl(prop) = &class.members[0] else {
        panic!("expected a property");
    };
    assert!(prop.decl.doc.is_some());
    assert_eq!(prop.modifiers.visibility, Visibility::Private);

    let Member::Decl(ctor) = &class.members[1] else {
        panic!("expected a constructor");
    };
    let DeclKind::Func(func) = &ctor.decl.kind else {
        panic!("expected a method");
    };
    assert!(func.params.multiline);
    assert_eq!(func.params.params[0].name, "$protocolRepository");
    assert_eq!(func.body.as_ref().unwrap().stmts.len(), 1);

    let Member::Decl(count) = &class.members[2] else {
        panic!("expected a method");
    };
    assert_eq!(count.modifiers.inheritance, Some(Inheritance::Abstract));
    let DeclKind::Func(func) = &count.decl.kind else {
        panic!("expected a method");
    };
    assert!(func.body.is_none());
    assert_eq!(func.result.as_ref().unwrap().names[0].parts, ["int"]);
}

#[test]
fn parse_spaced_file_formats() {
    let want = "<?php

namespace Dubax\\Asistent\\Laboratory;

use LMBase; // ok
use Dubax\\Asistent\\Laboratory;
use function Nette\\fn_helper;

abstract class Protocols extends Base implements \\Countable
{
\tuse Nette\\SmartObject;

\t/** @var Laboratory\\ProtocolRepository */
\tprivate $protocolRepository;

\tpublic function __construct(
\t\tLaboratory\\ProtocolRepository $protocolRepository,
\t)
\t{
\t\t$this->protocolRepository = $protocolRepository;
\t}

\tabstract protected function count(): int;
}
";
    pretty_assertions::assert_eq!(format_str(SERVICE).unwrap(), want);
}

#[test]
fn parse_top_level_markup() {
    let file = parse("<?php echo 1; ?>\n<p>tail</p>\n").unwrap();
    let Some(Stmt::Markup(markup)) = file.stmts.last() else {
        panic!("expected markup");
    };
    assert_eq!(markup.text, "\n<p>tail</p>\n");
    assert!(!markup.reopen);
}
