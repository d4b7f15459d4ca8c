use std::io;

use termcolor::{ColorSpec, WriteColor};
use unicode_width::UnicodeWidthStr;

use crate::sources::{Source as _, Sources};
use crate::{Config, Diagnostic, Severity, Snippet};

impl<S: Sources> Diagnostic<S> {
    /// Render the diagnostic to a terminal stream.
    ///
    /// Snippets whose source or span cannot be resolved are rendered without
    /// a source excerpt rather than dropped.
    pub fn write_to_stream(
        &self,
        sources: &S,
        config: &Config,
        stream: &mut impl WriteColor,
    ) -> io::Result<()> {
        let (header_color, header) = match self.severity {
            Severity::Error => (&config.error_color, "error"),
            Severity::Warning => (&config.warning_color, "warning"),
        };

        stream.set_color(header_color)?;
        write!(stream, "{header}[{}]", self.category.name())?;

        stream.set_color(&config.emphasis)?;
        writeln!(stream, ": {}", self.message)?;
        stream.reset()?;

        for snippet in &self.snippets {
            self.write_snippet(snippet, sources, config, stream)?;
        }

        writeln!(stream)
    }

    fn write_snippet(
        &self,
        snippet: &Snippet<S>,
        sources: &S,
        config: &Config,
        stream: &mut impl WriteColor,
    ) -> io::Result<()> {
        let Some(source) = sources.get_source(snippet.source_id) else {
            stream.set_color(&config.subtle)?;
            writeln!(stream, " --> <unknown source>: {}", snippet.label)?;
            return stream.reset();
        };

        let Some((line, col)) = source.line_col(snippet.span.start) else {
            stream.set_color(&config.subtle)?;
            writeln!(stream, " --> {}: {}", source.name_str(), snippet.label)?;
            return stream.reset();
        };

        stream.set_color(&config.subtle)?;
        writeln!(stream, " --> {}:{line}:{col}", source.name_str())?;
        stream.reset()?;

        let line_index = line - 1;
        let line_text = source.line_str(line_index).unwrap_or("");
        let line_start = source.line_start(line_index).unwrap_or(0);

        let gutter_width = line.to_string().len();

        stream.set_color(&config.subtle)?;
        write!(stream, "{line:>gutter_width$} {} ", config.gutter)?;
        stream.reset()?;
        writeln!(stream, "{line_text}")?;

        // the underline only covers the part of the span on the first line
        let start = snippet.span.start - line_start;
        let end = snippet.span.end.saturating_sub(line_start).min(line_text.len());
        let before = line_text.get(..start).unwrap_or("");
        let covered = line_text.get(start..end).unwrap_or("");

        let pad = before.width();
        let width = covered.width().max(1);

        stream.set_color(&config.subtle)?;
        write!(stream, "{:>gutter_width$} {} ", "", config.gutter)?;

        let underline_color = match self.severity {
            Severity::Error => &config.error_color,
            Severity::Warning => &config.warning_color,
        };
        stream.set_color(underline_color)?;
        write!(
            stream,
            "{:pad$}{}",
            "",
            config.underline.repeat(width)
        )?;

        if !snippet.label.is_empty() {
            write!(stream, " {}", snippet.label)?;
        }

        writeln!(stream)?;
        stream.reset()
    }
}
