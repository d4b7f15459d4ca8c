use indoc::indoc;
use pretty_assertions::assert_eq;

use ember_frontend::ast::*;
use ember_session::options::CompileOptions;
use ember_session::sourcemap::SourceId;

use crate::{lower, LowerOutput, SemanticError};

fn lower_source(source: &str) -> LowerOutput {
    lower_with(source, &CompileOptions::default())
}

fn lower_with(source: &str, options: &CompileOptions) -> LowerOutput {
    let (tokens, lex_errors) = ember_frontend::lex(source);
    assert!(lex_errors.is_empty(), "lex errors: {lex_errors:?}");

    let (file, parse_errors) = ember_frontend::parse(tokens);
    assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");

    let items = file
        .items
        .into_iter()
        .map(|item| UnitItem {
            source_id: SourceId(0),
            item,
        })
        .collect();

    lower(CompilationUnit { items }, options)
}

fn lower_ok(source: &str) -> CompilationUnit {
    let output = lower_source(source);
    assert!(output.errors.is_empty(), "errors: {:?}", output.errors);
    output.unit
}

fn find_func<'a>(unit: &'a CompilationUnit, name: &str) -> &'a FuncDecl {
    unit.items
        .iter()
        .find_map(|item| match &item.item {
            Item::Func(func) if func.name.name == name => Some(func),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function `{name}`"))
}

#[test]
fn macro_constant_is_substituted() {
    let unit = lower_ok(indoc! {r#"
        macro LIMIT = 64

        fn f() -> i64 {
            return LIMIT
        }
    "#});

    let func = find_func(&unit, "f");
    let Stmt::Return {
        value: Some(value), ..
    } = &func.body.stmts[0]
    else {
        panic!("expected a return");
    };

    assert_eq!(value.kind, ExprKind::Integer(64));
    assert_eq!(value.ty, Some(Type::I64));
}

#[test]
fn duplicate_macro_constant() {
    let output = lower_source(indoc! {r#"
        macro LIMIT = 64
        macro LIMIT = 65
    "#});

    assert!(matches!(
        output.errors[..],
        [SemanticError::DuplicateConst { .. }]
    ));
}

#[test]
fn duplicate_function_in_one_file() {
    let output = lower_source(indoc! {r#"
        fn f() {}
        fn f() {}
    "#});

    assert!(matches!(
        output.errors[..],
        [SemanticError::DuplicateDefinition { .. }]
    ));
}

#[test]
fn missing_arguments_are_filled_from_defaults() {
    let unit = lower_ok(indoc! {r#"
        fn base(a: u8, b: u8 = 7) -> u8 {
            return a
        }

        fn caller() {
            base(1)
        }
    "#});

    let caller = find_func(&unit, "caller");
    let Stmt::Expr(call) = &caller.body.stmts[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call { args, .. } = &call.kind else {
        panic!("expected a call");
    };

    assert_eq!(args.len(), 2);
    assert_eq!(args[1].kind, ExprKind::Integer(7));
    assert_eq!(args[1].ty, Some(Type::U8));
}

#[test]
fn arity_counts_the_defaulted_suffix() {
    let source_of =
        |call: &str| format!("fn base(a: u8, b: u8 = 7) {{}}\nfn caller() {{ {call} }}");

    for ok in ["base(1)", "base(1, 2)"] {
        let output = lower_source(&source_of(ok));
        assert!(output.errors.is_empty(), "`{ok}`: {:?}", output.errors);
    }

    for bad in ["base()", "base(1, 2, 3)"] {
        let output = lower_source(&source_of(bad));
        match &output.errors[..] {
            [SemanticError::ArityMismatch { expected, .. }] => {
                assert_eq!(expected, "1 to 2");
            }
            other => panic!("`{bad}`: {other:?}"),
        }
    }
}

#[test]
fn default_must_be_constant() {
    let output = lower_source(indoc! {r#"
        fn f(a: u8 = 1 + 2) {}
    "#});

    assert!(matches!(
        output.errors[..],
        [SemanticError::NonConstDefault { .. }]
    ));
}

#[test]
fn default_may_be_a_macro_constant() {
    let unit = lower_ok(indoc! {r#"
        macro BAUD = 9600

        fn open(rate: u16 = BAUD) {}

        fn caller() {
            open()
        }
    "#});

    let caller = find_func(&unit, "caller");
    let Stmt::Expr(call) = &caller.body.stmts[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call { args, .. } = &call.kind else {
        panic!("expected a call");
    };

    assert_eq!(args[0].kind, ExprKind::Integer(9600));
}

#[test]
fn default_may_forward_reference_a_macro_constant() {
    let unit = lower_ok(indoc! {r#"
        fn open(rate: u16 = BAUD) {}

        macro BAUD = 9600

        fn caller() {
            open()
        }
    "#});

    let caller = find_func(&unit, "caller");
    let Stmt::Expr(call) = &caller.body.stmts[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call { args, .. } = &call.kind else {
        panic!("expected a call");
    };

    assert_eq!(args[0].kind, ExprKind::Integer(9600));
}

#[test]
fn unknown_name() {
    let output = lower_source("fn f() { let x = missing }");

    assert!(matches!(
        output.errors[..],
        [SemanticError::UnknownName { .. }]
    ));
}

#[test]
fn bit_index_target_must_be_an_integer() {
    let output = lower_source("fn f(flag: bool) { flag[0] = 0b1 }");

    match &output.errors[..] {
        [SemanticError::BitIndexTarget { name, ty, .. }] => {
            assert_eq!(name, "flag");
            assert_eq!(*ty, Type::Bool);
        }
        other => panic!("unexpected errors: {other:?}"),
    }
}

#[test]
fn binary_literal_wider_than_its_type() {
    let output = lower_source("fn f() { let x: u8 = 0b000000001111 }");

    assert!(matches!(
        output.errors[..],
        [SemanticError::LiteralOutOfRange { .. }]
    ));
}

#[test]
fn integer_literal_out_of_range() {
    let output = lower_source("fn f() { let x: u8 = 300 }");

    assert!(matches!(
        output.errors[..],
        [SemanticError::LiteralOutOfRange { .. }]
    ));
}

#[test]
fn binary_literal_width_fits_u16() {
    lower_ok("fn f() { let mask: u16 = 0b000000001111 }");
}

#[test]
fn interrupt_number_has_eight_bits() {
    let output = lower_source("fn f() { @256 }");

    assert!(matches!(
        output.errors[..],
        [SemanticError::InterruptOutOfRange { number: 256, .. }]
    ));

    lower_ok("fn f() { @255 }");
}

#[test]
fn range_is_only_a_for_bound() {
    let output = lower_source("fn f() { let r = 0..10 }");

    assert!(matches!(
        output.errors[..],
        [SemanticError::RangeOutsideFor { .. }]
    ));

    lower_ok("fn f() { for i in 0..10 {} }");
}

#[test]
fn declared_type_constrains_the_initializer() {
    let output = lower_source("fn f() { let x: u8 = true }");

    match &output.errors[..] {
        [SemanticError::TypeMismatch {
            expected,
            found,
            expected_due_to,
            ..
        }] => {
            assert_eq!(*expected, Type::U8);
            assert_eq!(*found, Type::Bool);
            assert!(expected_due_to.is_some());
        }
        other => panic!("unexpected errors: {other:?}"),
    }
}

#[test]
fn methods_resolve_through_impl_blocks() {
    let unit = lower_ok(indoc! {r#"
        struct Pin { number: u8 }

        impl Pin {
            fn get(self) -> u8 {
                return self.number
            }
        }

        fn f(p: Pin) -> u8 {
            return p.get()
        }
    "#});

    let func = find_func(&unit, "f");
    let Stmt::Return {
        value: Some(value), ..
    } = &func.body.stmts[0]
    else {
        panic!("expected a return");
    };

    assert_eq!(value.ty, Some(Type::U8));
}

#[test]
fn unknown_method() {
    let output = lower_source(indoc! {r#"
        struct Pin { number: u8 }

        impl Pin {
            fn get(self) -> u8 {
                return self.number
            }
        }

        fn f(p: Pin) {
            p.missing()
        }
    "#});

    match &output.errors[..] {
        [SemanticError::UnknownMethod { ty, method, .. }] => {
            assert_eq!(ty, "Pin");
            assert_eq!(method, "missing");
        }
        other => panic!("unexpected errors: {other:?}"),
    }
}

#[test]
fn enum_variant_access_is_folded() {
    let unit = lower_ok(indoc! {r#"
        enum Mode { Input, Output }

        fn f() {
            let m: Mode = Mode.Output
        }
    "#});

    let func = find_func(&unit, "f");
    let Stmt::Let { value, .. } = &func.body.stmts[0] else {
        panic!("expected a let");
    };

    assert_eq!(
        value.kind,
        ExprKind::EnumVariant {
            enum_name: "Mode".to_owned(),
            variant: "Output".to_owned(),
        }
    );
}

#[test]
fn unknown_enum_variant() {
    let output = lower_source(indoc! {r#"
        enum Mode { Input, Output }

        fn f() {
            let m = Mode.Sideways
        }
    "#});

    assert!(matches!(
        output.errors[..],
        [SemanticError::UnknownVariant { .. }]
    ));
}

#[test]
fn missing_return() {
    let output = lower_source("fn f() -> u8 { let x = 1 }");

    assert!(matches!(
        output.errors[..],
        [SemanticError::MissingReturn { .. }]
    ));
}

#[test]
fn diverging_if_counts_as_a_return() {
    lower_ok(indoc! {r#"
        fn f(x: u8) -> u8 {
            if x > 0 {
                return x
            } else {
                ? "zero"
            }
        }
    "#});
}

#[test]
fn break_outside_a_loop() {
    let output = lower_source("fn f() { break }");

    assert!(matches!(
        output.errors[..],
        [SemanticError::OutsideLoop {
            keyword: "break",
            ..
        }]
    ));
}

#[test]
fn recording_stops_at_the_cap_but_counting_continues() {
    let options = CompileOptions {
        max_errors: 2,
        ..CompileOptions::default()
    };

    let output = lower_with(
        "fn f() { let a = w let b = x let c = y let d = z }",
        &options,
    );

    assert_eq!(output.errors.len(), 2);
    assert_eq!(output.total_errors, 4);
}
