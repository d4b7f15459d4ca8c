use std::path::Path;

pub trait Sources {
    type SourceId: Copy + Eq + std::hash::Hash;
    type Source: Source;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>>;
}

pub trait Source {
    fn name_str(&self) -> &str;
    fn path(&self) -> Option<&Path>;
    fn source_str(&self) -> &str;
}

impl<S: Source> Sources for Vec<Cached<S>> {
    type SourceId = usize;
    type Source = S;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>> {
        self.get(id)
    }
}

impl Source for (String, String) {
    fn name_str(&self) -> &str {
        &self.0
    }

    fn path(&self) -> Option<&Path> {
        None
    }

    fn source_str(&self) -> &str {
        &self.1
    }
}

/// A source plus a cached table of line-start offsets, so byte offsets can be
/// turned into line/column pairs without rescanning the text.
#[derive(Debug, Clone)]
pub struct Cached<S: Source> {
    source: S,

    // always starts with 0, one extra entry per newline
    line_starts: Vec<usize>,
}

impl<S: Source> Cached<S> {
    pub fn new(source: S) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .source_str()
                .char_indices()
                .filter_map(|(i, ch)| (ch == '\n').then_some(i + 1)),
        );

        Self {
            source,
            line_starts,
        }
    }

    pub fn as_source(&self) -> &S {
        &self.source
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Zero-based line index containing `byte`.
    pub fn line_index(&self, byte: usize) -> Option<usize> {
        if byte > self.source_str().len() {
            return None;
        }
        Some(self.line_starts.partition_point(|&start| start <= byte) - 1)
    }

    /// One-based `(line, column)` of `byte`.
    pub fn line_col(&self, byte: usize) -> Option<(usize, usize)> {
        let line = self.line_index(byte)?;
        let col = byte - self.line_starts[line];
        Some((line + 1, col + 1))
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// The text of a line, without its trailing newline.
    pub fn line_str(&self, line: usize) -> Option<&str> {
        let start = self.line_start(line)?;
        let end = self
            .line_start(line + 1)
            .unwrap_or(self.source_str().len());

        let s = &self.source_str()[start..end];
        Some(s.trim_end_matches(['\n', '\r']))
    }
}

impl<S: Source> Source for Cached<S> {
    fn name_str(&self) -> &str {
        self.source.name_str()
    }

    fn path(&self) -> Option<&Path> {
        self.source.path()
    }

    fn source_str(&self) -> &str {
        self.source.source_str()
    }
}

#[cfg(test)]
mod tests {
    use super::Cached;

    fn cached(s: &str) -> Cached<(String, String)> {
        Cached::new(("sample".to_owned(), s.to_owned()))
    }

    #[test]
    fn line_indices() {
        let c = cached("");
        assert_eq!(c.line_index(0), Some(0));
        assert_eq!(c.line_index(1), None);

        let c = cached("x\ny");
        assert_eq!(c.line_index(0), Some(0));
        assert_eq!(c.line_index(1), Some(0));
        assert_eq!(c.line_index(2), Some(1));
        assert_eq!(c.line_index(3), Some(1));
        assert_eq!(c.line_index(4), None);
    }

    #[test]
    fn line_cols() {
        let c = cached("let\nx");
        assert_eq!(c.line_col(0), Some((1, 1)));
        assert_eq!(c.line_col(3), Some((1, 4)));
        assert_eq!(c.line_col(4), Some((2, 1)));
        assert_eq!(c.line_col(5), Some((2, 2)));
        assert_eq!(c.line_col(6), None);
    }

    #[test]
    fn line_strs() {
        let c = cached("a\r\nbb\n");
        assert_eq!(c.line_str(0), Some("a"));
        assert_eq!(c.line_str(1), Some("bb"));
        assert_eq!(c.line_str(2), Some(""));
        assert_eq!(c.line_str(3), None);
        assert_eq!(c.line_count(), 3);
    }
}
