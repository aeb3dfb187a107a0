//! Round-trip tests: formatting canonical source must not change it.

mod common;

use common::roundtrip;

// -----------------------------------------------------------
// File structure.
// -----------------------------------------------------------

#[test]
fn roundtrip_open_tag_only() {
    roundtrip("<?php\n");
}

#[test]
fn roundtrip_single_statement() {
    roundtrip("<?php\n\necho 1;\n");
}

#[test]
fn roundtrip_header_sections() {
    roundtrip(
        "<?php\n\ndeclare(strict_types=1);\n\nnamespace App\\Http;\n\n\
         use Foo\\Bar;\nuse Baz as Q; // alias\nuse function strlen;\n\necho 1;\n",
    );
}

#[test]
fn roundtrip_separated_declarations() {
    roundtrip(
        "<?php\n\n$a = 1;\n\nfunction f()\n{\n}\n\n// about g\nfunction g()\n{\n}\n\n$b = 2;\n",
    );
}

// -----------------------------------------------------------
// Declarations.
// -----------------------------------------------------------

#[test]
fn roundtrip_function() {
    roundtrip("<?php\n\nfunction f($a, $b = 1): ?int\n{\n\treturn $a;\n}\n");
}

#[test]
fn roundtrip_class() {
    roundtrip(
        "<?php

class A extends B
{
\tuse T;

\tconst X      = 1;
\tconst LONGER = 2;
\tprivate $a;

\t/** @var int */
\tpublic static $n = 0;

\tabstract protected function f();

\tpublic function g()
\t{
\t\treturn 1;
\t}
}
",
    );
}

#[test]
fn roundtrip_multiline_params() {
    roundtrip(
        "<?php\n\nfunction f(\n\tint  $a   = 1,\n\t     $bb  = 2,\n\t?Foo $ccc = null,\n)\n{\n}\n",
    );
}

#[test]
fn roundtrip_interface() {
    roundtrip(
        "<?php\n\ninterface I extends A, B\n{\n\tpublic function f(int $x): void;\n\n\tconst Y = 2;\n}\n",
    );
}

// -----------------------------------------------------------
// Statements.
// -----------------------------------------------------------

#[test]
fn roundtrip_if_elseif_else() {
    roundtrip("<?php\n\nif ($a) {\n\tb();\n} elseif ($c) {\n\td();\n} else {\n\te();\n}\n");
}

#[test]
fn roundtrip_switch() {
    roundtrip("<?php\n\nswitch ($x) {\ncase 1:\n\ta();\n\tbreak;\ndefault:\n\tb();\n}\n");
}

#[test]
fn roundtrip_for() {
    roundtrip("<?php\n\nfor ($i = 0; $i < 3; $i++) {\n\techo $i;\n}\n");
}

#[test]
fn roundtrip_closure() {
    roundtrip("<?php\n\n$f = function ($x) use (&$y) {\n\treturn $x;\n};\n");
}

#[test]
fn roundtrip_markup() {
    roundtrip("<?php\n\nif ($x) {\n\t?>  <b> hi </b>  \n<?php\n}\n?>\n<p>end</p>  \n");
}

#[test]
fn roundtrip_multiline_call() {
    roundtrip("<?php\n\nfoo(1, // one\n2 // two\n);\n");
}
