use indoc::indoc;
use pretty_assertions::assert_eq;

use super::{ParseError, ParseErrorKind, Parser};
use crate::ast::*;

fn parse(source: &str) -> (SourceFile, Vec<ParseError>) {
    let (tokens, lex_errors) = crate::lex(source);
    assert!(lex_errors.is_empty(), "lex errors: {lex_errors:?}");
    Parser::new(tokens).parse()
}

fn parse_ok(source: &str) -> SourceFile {
    let (file, errors) = parse(source);
    assert!(errors.is_empty(), "parse errors: {errors:?}");
    file
}

fn only_func(file: &SourceFile) -> &FuncDecl {
    match &file.items[..] {
        [Item::Func(func)] => func,
        other => panic!("expected a single function, got {other:?}"),
    }
}

#[test]
fn function_signature() {
    let file = parse_ok(indoc! {r#"
        fn clamp(x: i32, hi: i32 = 255) -> i32 {
            return x
        }
    "#});

    let func = only_func(&file);
    assert_eq!(func.name.name, "clamp");
    assert_eq!(func.ret_ty, Type::I32);
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.params[0].default, None);
    assert!(func.params[1].default.is_some());
    assert!(!func.has_self);
}

#[test]
fn default_must_be_trailing() {
    let (_, errors) = parse("fn f(a: u8 = 1, b: u8) {}");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].kind,
        ParseErrorKind::DefaultAfterRequired("b".to_owned())
    );
}

#[test]
fn assert_forms() {
    let file = parse_ok(indoc! {r#"
        fn checks(x: u8) {
            assert x > 1
            assert x = 3
        }
    "#});

    let func = only_func(&file);
    match &func.body.stmts[..] {
        [Stmt::Assert {
            kind: AssertKind::Truthy(_),
            ..
        }, Stmt::Assert {
            kind: AssertKind::Equal(_, _),
            ..
        }] => {}
        other => panic!("unexpected statements: {other:?}"),
    }
}

#[test]
fn else_if_nests() {
    let file = parse_ok(indoc! {r#"
        fn pick(x: u8) {
            if x == 0 {
                return
            } else if x == 1 {
                return
            } else {
                return
            }
        }
    "#});

    let func = only_func(&file);
    let Stmt::If { else_block, .. } = &func.body.stmts[0] else {
        panic!("expected an if");
    };

    let else_block = else_block.as_ref().unwrap();
    let Stmt::If {
        else_block: inner_else,
        ..
    } = &else_block.stmts[0]
    else {
        panic!("expected a nested if");
    };
    assert!(inner_else.is_some());
}

#[test]
fn bit_index_assignment() {
    let file = parse_ok(indoc! {r#"
        fn set(mask: u16) {
            mask[4] = 0b1
            let copy = mask[4]
        }
    "#});

    let func = only_func(&file);
    match &func.body.stmts[..] {
        [Stmt::IndexAssign { target, .. }, Stmt::Let { value, .. }] => {
            assert_eq!(target.name, "mask");
            assert!(matches!(value.kind, ExprKind::Index { .. }));
        }
        other => panic!("unexpected statements: {other:?}"),
    }
}

#[test]
fn for_ranges() {
    let file = parse_ok(indoc! {r#"
        fn count() {
            for i in 0..10 {}
            for i in 0..=10 {}
        }
    "#});

    let func = only_func(&file);
    match &func.body.stmts[..] {
        [Stmt::ForRange {
            inclusive: false, ..
        }, Stmt::ForRange {
            inclusive: true, ..
        }] => {}
        other => panic!("unexpected statements: {other:?}"),
    }
}

#[test]
fn precedence() {
    let file = parse_ok("fn f() { let ok = 1 + 2 * 3 == 7 && true }");

    let func = only_func(&file);
    let Stmt::Let { value, .. } = &func.body.stmts[0] else {
        panic!("expected a let");
    };

    // `&&` is the loosest operator here
    let ExprKind::BinOp {
        op: BinOp::And,
        lhs,
        ..
    } = &value.kind
    else {
        panic!("expected `&&` at the top: {value:?}");
    };

    assert!(matches!(
        lhs.kind,
        ExprKind::BinOp { op: BinOp::Eq, .. }
    ));
}

#[test]
fn method_call_and_interrupt() {
    let file = parse_ok(indoc! {r#"
        use "lib/gpio.em"

        fn run(p: Pin) {
            p.toggle()
            @3
            ? "unreachable"
        }
    "#});

    assert_eq!(file.uses.len(), 1);
    assert_eq!(file.uses[0].path, "lib/gpio.em");

    let func = only_func(&file);
    match &func.body.stmts[..] {
        [Stmt::Expr(call), Stmt::Interrupt { number: 3, .. }, Stmt::Panic { .. }] => {
            assert!(matches!(call.kind, ExprKind::Call { .. }));
        }
        other => panic!("unexpected statements: {other:?}"),
    }
}

#[test]
fn impl_block_with_self() {
    let file = parse_ok(indoc! {r#"
        struct Pin { number: u8 }

        impl Pin {
            fn number_of(self) -> u8 {
                return self.number
            }
        }
    "#});

    let Item::Impl(impl_block) = &file.items[1] else {
        panic!("expected an impl block");
    };
    assert_eq!(impl_block.target.name, "Pin");
    assert!(impl_block.funcs[0].has_self);
}

#[test]
fn recovery_keeps_later_items() {
    let (file, errors) = parse(indoc! {r#"
        fn broken( {
        fn fine() {
            let x = 1
        }
    "#});

    assert!(!errors.is_empty());
    assert!(file
        .items
        .iter()
        .any(|item| matches!(item, Item::Func(f) if f.name.name == "fine")));
}
