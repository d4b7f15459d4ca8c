use std::path::{Path, PathBuf};

use ember_diagnostic::sources::Cached;
use ember_diagnostic::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SourceId(pub usize);

#[derive(Default, Debug, Clone)]
pub struct SourceMap {
    inner: Vec<Cached<Source>>,
}

#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub path: Option<PathBuf>,
    pub source: String,
}

impl Source {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            source: source.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl SourceMap {
    pub fn insert(&mut self, source: Source) -> SourceId {
        let id = SourceId(self.inner.len());
        self.inner.push(Cached::new(source));
        id
    }

    pub fn insert_and_get(&mut self, source: Source) -> (SourceId, &Cached<Source>) {
        let id = self.insert(source);
        (id, &self.inner[id.0])
    }

    pub fn get(&self, id: SourceId) -> Option<&Cached<Source>> {
        self.inner.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &Cached<Source>)> {
        self.inner
            .iter()
            .enumerate()
            .map(|(i, source)| (SourceId(i), source))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ember_diagnostic::sources::Sources for SourceMap {
    type SourceId = SourceId;
    type Source = Source;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>> {
        self.get(id)
    }
}

impl ember_diagnostic::sources::Source for Source {
    fn name_str(&self) -> &str {
        &self.name
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn source_str(&self) -> &str {
        &self.source
    }
}

/// A span paired with the source it belongs to, for errors that outlive a
/// single-file pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SourceSpan {
    pub source_id: SourceId,
    pub span: Span,
}

impl SourceSpan {
    pub fn new(source_id: SourceId, span: Span) -> Self {
        Self { source_id, span }
    }
}
