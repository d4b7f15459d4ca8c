use indoc::indoc;
use pretty_assertions::assert_eq;

use ember_frontend::ast::{CompilationUnit, UnitItem};
use ember_session::options::CompileOptions;
use ember_session::sourcemap::{Source, SourceMap};

use crate::generate;

fn compile(source: &str, options: &CompileOptions) -> String {
    let mut sources = SourceMap::default();
    let source_id = sources.insert(Source::new("main.em", source));

    let (tokens, lex_errors) = ember_frontend::lex(source);
    assert!(lex_errors.is_empty(), "lex errors: {lex_errors:?}");

    let (file, parse_errors) = ember_frontend::parse(tokens);
    assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");

    let items = file
        .items
        .into_iter()
        .map(|item| UnitItem { source_id, item })
        .collect();

    let output = ember_middle::lower(CompilationUnit { items }, options);
    assert!(
        output.errors.is_empty(),
        "semantic errors: {:?}",
        output.errors
    );

    generate(&output.unit, &sources, options).unwrap()
}

fn compile_default(source: &str) -> String {
    compile(source, &CompileOptions::default())
}

#[test]
fn output_is_deterministic() {
    let source = indoc! {r#"
        fn blink(times: u8) {
            for i in 0..times {
                @3
            }
        }
    "#};

    assert_eq!(compile_default(source), compile_default(source));
}

#[test]
fn bit_index_assignment_clears_then_ors() {
    let c = compile_default(indoc! {r#"
        fn set_bit() -> u16 {
            let mask: u16 = 0b000000001111
            mask[4] = 0b1
            return mask
        }
    "#});

    assert!(
        c.contains(
            "mask = (uint16_t)((mask & ~((uint16_t)1 << (4))) | (((uint16_t)(1) & 1) << (4)));"
        ),
        "missing read-modify-write: {c}"
    );
}

#[test]
fn bit_index_assignment_keeps_only_the_low_bit_of_the_value() {
    let c = compile_default(indoc! {r#"
        fn set_bit() -> u16 {
            let mask: u16 = 0b000000001111
            mask[4] = 0b11
            return mask
        }
    "#});

    // only bit 4 may change; a wide value must not spill into bit 5
    assert!(
        c.contains(
            "mask = (uint16_t)((mask & ~((uint16_t)1 << (4))) | (((uint16_t)(3) & 1) << (4)));"
        ),
        "value not masked to its low bit: {c}"
    );
}

#[test]
fn range_loops_use_strict_and_inclusive_bounds() {
    let c = compile_default(indoc! {r#"
        fn count() {
            for i in 0..10 {}
            for j in 0..=10 {}
        }
    "#});

    assert!(c.contains("i < 10"), "exclusive bound missing: {c}");
    assert!(c.contains("j <= 10"), "inclusive bound missing: {c}");
}

#[test]
fn panic_with_sinks_disabled_references_no_stdio() {
    let options = CompileOptions {
        logging: false,
        printing: false,
        ..CompileOptions::default()
    };

    let c = compile(
        indoc! {r#"
            fn fail() {
                ? "boom"
            }
        "#},
        &options,
    );

    assert!(!c.contains("printf"), "found a print sink: {c}");
    assert!(!c.contains("fprintf"), "found a log sink: {c}");
    assert!(!c.contains("stdio"), "stdio should not be included: {c}");
    assert!(c.contains("exit(1);"), "panic must still halt: {c}");
}

#[test]
fn macro_names_never_reach_the_output() {
    let c = compile_default(indoc! {r#"
        macro M = 5

        fn doubled() -> i64 {
            return M * 2
        }
    "#});

    assert!(c.contains("return (5 * 2);"), "expected folded constant: {c}");
    assert!(!c.contains('M'), "macro symbol leaked: {c}");
}

#[test]
fn methods_become_free_functions_with_a_pointer_receiver() {
    let c = compile_default(indoc! {r#"
        struct Pin { number: u8 }

        impl Pin {
            fn get(self) -> u8 {
                return self.number
            }
        }

        fn read(p: Pin) -> u8 {
            return p.get()
        }
    "#});

    assert!(c.contains("uint8_t Pin_get(Pin *self)"), "bad signature: {c}");
    assert!(c.contains("return self->number;"), "receiver not a pointer: {c}");
    assert!(c.contains("return Pin_get(&p);"), "call site missing &: {c}");
}

#[test]
fn enums_lower_to_prefixed_constants() {
    let c = compile_default(indoc! {r#"
        enum Mode { Input, Output }

        fn pick() {
            let m: Mode = Mode.Output
        }
    "#});

    assert!(c.contains("typedef enum { Mode_Input, Mode_Output } Mode;"));
    assert!(c.contains("Mode m = Mode_Output;"));
}

#[test]
fn asserts_call_the_panic_routine_with_a_position() {
    let c = compile_default(indoc! {r#"
        fn check(x: u8) {
            assert x > 1
        }
    "#});

    assert!(
        c.contains("ember_panic_str(\"assertion failed at main.em:2\");"),
        "missing assert lowering: {c}"
    );
    assert!(c.contains("if (!((x > 1))) {"), "missing condition: {c}");
}

#[test]
fn interrupts_call_the_runtime_stub() {
    let c = compile_default("fn trigger() { @3 }");

    assert!(c.contains("void ember_interrupt(uint8_t number)"));
    assert!(c.contains("ember_interrupt(3);"));
}

#[test]
fn defaults_are_filled_before_emission() {
    let c = compile_default(indoc! {r#"
        fn base(a: u8, b: bool = true) {}

        fn caller() {
            base(1)
        }
    "#});

    // the emitted signature carries no default syntax; call sites are explicit
    assert!(c.contains("void base(uint8_t a, bool b)"));
    assert!(c.contains("base(1, true);"));
}
