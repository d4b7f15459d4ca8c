use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::{fs, io};

use ember_diagnostic::sources::Source as _;
use ember_session::diagnostics::prelude::*;
use ember_session::sourcemap::{Source, SourceMap};

use crate::ast::{CompilationUnit, Item, UnitItem};
use crate::lexer::LexerError;
use crate::parser::ParseError;

/// Turns the path written in a `use` declaration into a canonical key.
///
/// Resolution is purely lexical: `.` and `..` are folded away relative to the
/// importing file's directory, and the `.em` extension is appended when
/// missing. Two routes to the same file therefore produce the same key.
pub fn normalize_path(importer: Option<&str>, request: &str) -> String {
    let mut segments: Vec<&str> = vec![];

    if !request.starts_with('/') {
        if let Some((dir, _)) = importer.and_then(|p| p.rsplit_once('/')) {
            for segment in dir.split('/') {
                push_segment(&mut segments, segment);
            }
        }
    }

    for segment in request.split('/') {
        push_segment(&mut segments, segment);
    }

    let mut path = segments.join("/");
    if !path.ends_with(".em") {
        path.push_str(".em");
    }
    path
}

fn push_segment<'a>(segments: &mut Vec<&'a str>, segment: &'a str) {
    match segment {
        "" | "." => {}
        ".." => match segments.last() {
            None | Some(&"..") => segments.push(".."),
            Some(_) => {
                segments.pop();
            }
        },
        segment => segments.push(segment),
    }
}

pub trait SourceResolver {
    fn canonicalize(&self, importer: Option<&str>, request: &str) -> String {
        normalize_path(importer, request)
    }

    fn load(&self, canonical: &str) -> io::Result<String>;
}

/// Loads sources from a directory tree rooted at `root`.
pub struct FsResolver {
    root: PathBuf,
}

impl FsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceResolver for FsResolver {
    fn load(&self, canonical: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(canonical))
    }
}

/// In-memory sources, keyed by canonical path. The test double for
/// [`FsResolver`].
#[derive(Default)]
pub struct MapResolver {
    files: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl SourceResolver for MapResolver {
    fn load(&self, canonical: &str) -> io::Result<String> {
        self.files.get(canonical).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no source named `{canonical}`"),
            )
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot load `{path}`: {reason}")]
    Load {
        path: String,
        reason: String,
        at: Option<SourceSpan>,
    },

    #[error("import cycle through `{path}`")]
    Cycle { path: String, at: SourceSpan },

    #[error("`{name}` is declared in both `{first_file}` and `{second_file}`")]
    DuplicateName {
        name: String,
        first_file: String,
        first: SourceSpan,
        second_file: String,
        second: SourceSpan,
    },
}

impl IntoDiagnostic<()> for ResolveError {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        let message = self.to_string();

        match self {
            ResolveError::Load { at, .. } => {
                let diagnostic = Diagnostic::error(Category::Resolution, message);
                match at {
                    Some(at) => diagnostic
                        .with_snippet(Snippet::primary("imported here", at.source_id, at.span)),
                    None => diagnostic,
                }
            }

            ResolveError::Cycle { at, .. } => Diagnostic::error(Category::Resolution, message)
                .with_snippet(Snippet::primary(
                    "this import closes the cycle",
                    at.source_id,
                    at.span,
                )),

            ResolveError::DuplicateName { first, second, .. } => {
                Diagnostic::error(Category::Resolution, message)
                    .with_snippet(Snippet::primary(
                        "declared again here",
                        second.source_id,
                        second.span,
                    ))
                    .with_snippet(Snippet::secondary(
                        "first declared here",
                        first.source_id,
                        first.span,
                    ))
            }
        }
    }
}

/// Any error produced while building the unit, tagged with enough context to
/// become a diagnostic.
#[derive(Debug)]
pub enum UnitError {
    Lex(SourceId, LexerError),
    Parse(SourceId, ParseError),
    Resolve(ResolveError),
}

impl IntoDiagnostic<()> for UnitError {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        match self {
            UnitError::Lex(source_id, error) => error.into_diagnostic(&source_id),
            UnitError::Parse(source_id, error) => error.into_diagnostic(&source_id),
            UnitError::Resolve(error) => error.into_diagnostic(&()),
        }
    }
}

pub(crate) struct Resolver<'a, R: SourceResolver> {
    sources: &'a mut SourceMap,
    resolver: &'a R,

    loaded: HashSet<String>,
    stack: Vec<String>,

    items: Vec<UnitItem>,
    errors: Vec<UnitError>,
}

impl<'a, R: SourceResolver> Resolver<'a, R> {
    pub fn new(sources: &'a mut SourceMap, resolver: &'a R) -> Self {
        Self {
            sources,
            resolver,

            loaded: HashSet::new(),
            stack: vec![],

            items: vec![],
            errors: vec![],
        }
    }

    pub fn run(mut self, entry: &str) -> (CompilationUnit, Vec<UnitError>) {
        let canonical = self.resolver.canonicalize(None, entry);
        self.load_file(canonical, None);

        let unit = CompilationUnit { items: self.items };

        let mut errors = self.errors;
        errors.extend(
            check_duplicates(&unit, self.sources)
                .into_iter()
                .map(UnitError::Resolve),
        );

        (unit, errors)
    }

    // depth-first: a file's imports land in the unit before its own
    // declarations, so the entry file's declarations come last
    fn load_file(&mut self, canonical: String, at: Option<SourceSpan>) {
        if self.stack.contains(&canonical) {
            // `at` is always present here: the entry file is never on the
            // stack when it is first loaded
            if let Some(at) = at {
                self.errors.push(UnitError::Resolve(ResolveError::Cycle {
                    path: canonical,
                    at,
                }));
            }
            return;
        }

        if !self.loaded.insert(canonical.clone()) {
            return;
        }

        let text = match self.resolver.load(&canonical) {
            Ok(text) => text,
            Err(error) => {
                self.errors.push(UnitError::Resolve(ResolveError::Load {
                    path: canonical,
                    reason: error.to_string(),
                    at,
                }));
                return;
            }
        };

        let (source_id, source) = self
            .sources
            .insert_and_get(Source::new(canonical.clone(), text).with_path(canonical.clone()));

        let file = {
            let (tokens, lex_errors) = crate::lex(source.source_str());
            self.errors
                .extend(lex_errors.into_iter().map(|e| UnitError::Lex(source_id, e)));

            let (file, parse_errors) = crate::parse(tokens);
            self.errors.extend(
                parse_errors
                    .into_iter()
                    .map(|e| UnitError::Parse(source_id, e)),
            );

            file
        };

        self.stack.push(canonical.clone());
        for use_decl in &file.uses {
            let imported = self.resolver.canonicalize(Some(&canonical), &use_decl.path);
            self.load_file(imported, Some(SourceSpan::new(source_id, use_decl.span)));
        }
        self.stack.pop();

        self.items
            .extend(file.items.into_iter().map(|item| UnitItem {
                source_id,
                item,
            }));
    }
}

/// A name declared in two *different* files is a resolution error. Within a
/// single file the memoized load makes reoccurrence impossible via imports,
/// and genuine same-file duplicates are left to semantic lowering.
fn check_duplicates(unit: &CompilationUnit, sources: &SourceMap) -> Vec<ResolveError> {
    let mut seen: HashMap<&str, &UnitItem> = HashMap::new();
    let mut errors = vec![];

    for unit_item in &unit.items {
        let Some(ident) = item_name(&unit_item.item) else {
            continue;
        };

        match seen.get(ident.name.as_str()) {
            Some(first) if first.source_id != unit_item.source_id => {
                let first_ident = item_name(&first.item).unwrap_or(ident);

                errors.push(ResolveError::DuplicateName {
                    name: ident.name.clone(),
                    first_file: source_name(sources, first.source_id),
                    first: SourceSpan::new(first.source_id, first_ident.span),
                    second_file: source_name(sources, unit_item.source_id),
                    second: SourceSpan::new(unit_item.source_id, ident.span),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(&ident.name, unit_item);
            }
        }
    }

    errors
}

fn item_name(item: &Item) -> Option<&crate::ast::Ident> {
    match item {
        Item::Func(func) => Some(&func.name),
        Item::Struct(decl) => Some(&decl.name),
        Item::Enum(decl) => Some(&decl.name),
        // macro duplicates are a semantic check, impls extend an existing name
        Item::MacroConst(_) | Item::Impl(_) | Item::ParseError => None,
    }
}

fn source_name(sources: &SourceMap, id: SourceId) -> String {
    sources
        .get(id)
        .map(|s| s.name_str().to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolve(resolver: &MapResolver, entry: &str) -> (CompilationUnit, Vec<UnitError>) {
        let mut sources = SourceMap::default();
        crate::resolve_imports(&mut sources, resolver, entry)
    }

    fn func_names(unit: &CompilationUnit) -> Vec<&str> {
        unit.items
            .iter()
            .filter_map(|unit_item| match &unit_item.item {
                Item::Func(func) => Some(func.name.name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path(None, "main"), "main.em");
        assert_eq!(normalize_path(Some("app/main.em"), "util"), "app/util.em");
        assert_eq!(
            normalize_path(Some("app/main.em"), "../lib/gpio.em"),
            "lib/gpio.em"
        );
        assert_eq!(normalize_path(Some("main.em"), "./a/./b"), "a/b.em");
        assert_eq!(normalize_path(Some("a/b.em"), "/lib/c"), "lib/c.em");
    }

    #[test]
    fn diamond_merges_once_in_dfs_order() {
        let resolver = MapResolver::new()
            .with_file("main.em", "use \"a\"\nuse \"b\"\nfn main() {}")
            .with_file("a.em", "use \"shared\"\nfn from_a() {}")
            .with_file("b.em", "use \"shared\"\nfn from_b() {}")
            .with_file("shared.em", "fn shared() {}");

        let (unit, errors) = resolve(&resolver, "main.em");
        assert!(errors.is_empty(), "{errors:?}");

        // imports precede importers, entry last, `shared` only once
        assert_eq!(func_names(&unit), vec!["shared", "from_a", "from_b", "main"]);
    }

    #[test]
    fn cycle_is_an_error() {
        let resolver = MapResolver::new()
            .with_file("a.em", "use \"b\"\nfn fa() {}")
            .with_file("b.em", "use \"a\"\nfn fb() {}");

        let (_, errors) = resolve(&resolver, "a.em");

        assert!(errors.iter().any(|e| matches!(
            e,
            UnitError::Resolve(ResolveError::Cycle { path, .. }) if path == "a.em"
        )));
    }

    #[test]
    fn duplicates_across_files_name_both_origins() {
        let resolver = MapResolver::new()
            .with_file("main.em", "use \"other\"\nfn init() {}")
            .with_file("other.em", "fn init() {}");

        let (_, errors) = resolve(&resolver, "main.em");

        let [UnitError::Resolve(ResolveError::DuplicateName {
            name,
            first_file,
            second_file,
            ..
        })] = &errors[..]
        else {
            panic!("expected one duplicate error: {errors:?}");
        };

        assert_eq!(name, "init");
        assert_eq!(first_file, "other.em");
        assert_eq!(second_file, "main.em");
    }

    #[test]
    fn duplicates_within_one_file_are_not_resolution_errors() {
        let resolver = MapResolver::new().with_file("main.em", "fn f() {}\nfn f() {}");

        let (_, errors) = resolve(&resolver, "main.em");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn missing_import_reports_use_site() {
        let resolver = MapResolver::new().with_file("main.em", "use \"nope\"\nfn main() {}");

        let (unit, errors) = resolve(&resolver, "main.em");

        assert_eq!(func_names(&unit), vec!["main"]);
        assert!(errors.iter().any(|e| matches!(
            e,
            UnitError::Resolve(ResolveError::Load { path, at: Some(_), .. }) if path == "nope.em"
        )));
    }
}
