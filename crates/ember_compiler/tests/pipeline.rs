use ember_compiler::{compile, CompilerError};
use ember_frontend::MapResolver;
use ember_session::diagnostics::prelude::Category;
use ember_session::diagnostics::Diagnostic;
use ember_session::options::CompileOptions;
use ember_session::Session;
use indoc::indoc;
use pretty_assertions::assert_eq;

type TestSession = Session<Vec<Diagnostic>>;

fn build_with(
    resolver: &MapResolver,
    entry: &str,
    options: CompileOptions,
) -> (Result<String, CompilerError>, TestSession) {
    let mut session: TestSession = Session::new(options, Vec::new());
    let result = compile(&mut session, resolver, entry).map(|artifact| artifact.c_source);
    (result, session)
}

fn build(source: &str) -> (Result<String, CompilerError>, TestSession) {
    let resolver = MapResolver::new().with_file("main.em", source);
    build_with(&resolver, "main.em", CompileOptions::default())
}

fn build_ok(source: &str) -> String {
    let (result, session) = build(source);
    match result {
        Ok(c_source) => c_source,
        Err(err) => panic!("{err}: {:?}", session.records()),
    }
}

#[test]
fn pipeline_is_deterministic() {
    let resolver = MapResolver::new()
        .with_file(
            "main.em",
            indoc! {r#"
                use "gpio"

                fn main() {
                    let p: Pin = init(3)
                    assert p.number = 3
                }
            "#},
        )
        .with_file(
            "gpio.em",
            indoc! {r#"
                struct Pin { number: u8 }

                fn init(number: u8) -> Pin {
                    ? "unimplemented"
                }
            "#},
        );

    let (first, _) = build_with(&resolver, "main.em", CompileOptions::default());
    let (second, _) = build_with(&resolver, "main.em", CompileOptions::default());

    assert_eq!(first.unwrap(), second.unwrap());
}

#[test]
fn default_dispatch_truth_table() {
    let c = build_ok(indoc! {r#"
        fn act(n: i64 = 0, flag: bool = true) {}

        fn main() {
            act()
            act(7)
            act(7, false)
            act(0, true)
            act(0, false)
        }
    "#});

    // act() and the explicit (0, true) call emit the same line
    assert_eq!(c.matches("act(0, true);").count(), 2, "{c}");
    assert!(c.contains("act(7, true);"), "one-arg call: {c}");
    assert!(c.contains("act(7, false);"), "two-arg call: {c}");
    assert!(c.contains("act(0, false);"), "explicit zero call: {c}");
}

#[test]
fn range_bounds_are_strict_and_inclusive() {
    let c = build_ok(indoc! {r#"
        fn main() {
            for i in 0..10 {}
            for j in 0..=10 {}
        }
    "#});

    assert!(c.contains("i < 10"), "{c}");
    assert!(c.contains("j <= 10"), "{c}");
}

#[test]
fn bit_index_assignment_sets_bit_four() {
    let c = build_ok(indoc! {r#"
        fn main() -> u16 {
            let mask: u16 = 0b000000001111
            mask[4] = 0b1
            return mask
        }
    "#});

    // clear-then-or on bit 4: 15 | 16 == 31 at runtime
    assert!(
        c.contains(
            "mask = (uint16_t)((mask & ~((uint16_t)1 << (4))) | (((uint16_t)(1) & 1) << (4)));"
        ),
        "{c}"
    );
}

#[test]
fn diamond_import_merges_once() {
    let resolver = MapResolver::new()
        .with_file("main.em", "use \"a\"\nuse \"b\"\nfn main() { helper() }")
        .with_file("a.em", "use \"shared\"\nfn from_a() {}")
        .with_file("b.em", "use \"shared\"\nfn from_b() {}")
        .with_file("shared.em", "fn helper() {}");

    let (result, session) = build_with(&resolver, "main.em", CompileOptions::default());
    let c_source = match result {
        Ok(c_source) => c_source,
        Err(err) => panic!("{err}: {:?}", session.records()),
    };

    assert_eq!(c_source.matches("void helper(void) {").count(), 1);
}

#[test]
fn duplicate_names_across_files_fail_with_both_origins() {
    let resolver = MapResolver::new()
        .with_file("main.em", "use \"other\"\nfn init() {}")
        .with_file("other.em", "fn init() {}");

    let (result, session) = build_with(&resolver, "main.em", CompileOptions::default());
    assert!(matches!(result, Err(CompilerError::HadErrors)));

    let record = session
        .records()
        .iter()
        .find(|r| r.kind == Category::Resolution)
        .expect("expected a resolution error");
    assert!(record.message.contains("other.em"), "{record:?}");
    assert!(record.message.contains("main.em"), "{record:?}");
}

#[test]
fn import_cycles_are_resolution_errors() {
    let resolver = MapResolver::new()
        .with_file("main.em", "use \"lib\"\nfn main() {}")
        .with_file("lib.em", "use \"main\"\nfn lib() {}");

    let (result, session) = build_with(&resolver, "main.em", CompileOptions::default());
    assert!(matches!(result, Err(CompilerError::HadErrors)));
    assert!(session
        .records()
        .iter()
        .any(|r| r.kind == Category::Resolution));
}

#[test]
fn panic_with_all_sinks_off_references_no_stdio() {
    let options = CompileOptions {
        logging: false,
        printing: false,
        heap_allocator: false,
        ..CompileOptions::default()
    };

    let resolver = MapResolver::new().with_file("main.em", "fn main() { ? \"boom\" }");
    let (result, session) = build_with(&resolver, "main.em", options);
    let c_source = match result {
        Ok(c_source) => c_source,
        Err(err) => panic!("{err}: {:?}", session.records()),
    };

    assert!(!c_source.contains("printf"), "{c_source}");
    assert!(!c_source.contains("fprintf"), "{c_source}");
    assert!(!c_source.contains("stdio"), "{c_source}");
    assert!(c_source.contains("exit(1);"), "{c_source}");
}

#[test]
fn macro_symbols_are_gone_from_the_artifact() {
    let c = build_ok(indoc! {r#"
        macro M = 5

        fn main() -> i64 {
            return M * 2
        }
    "#});

    assert!(c.contains("return (5 * 2);"), "{c}");
    assert!(!c.contains('M'), "macro symbol leaked: {c}");
}

#[test]
fn records_carry_source_positions() {
    let (result, session) = build(indoc! {r#"
        fn main() {
            let x = missing
        }
    "#});

    assert!(matches!(result, Err(CompilerError::HadErrors)));

    let records = session.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, Category::Semantic);
    assert_eq!(records[0].file.as_deref(), Some("main.em"));
    assert_eq!(records[0].line, Some(2));
}
