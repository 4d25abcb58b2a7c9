use std::error;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Error<T> {
    pub kind: T,
    file: Option<std::path::PathBuf>,
    snippet: Option<Snippet>,
    contexts: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(offset: usize) -> Self {
        Self { offset, len: 1 }
    }
    /// Offsets at or past the end of the input point just after the last line.
    pub fn snippet_from_source(&self, source: &SourceMetadata) -> Option<Snippet> {
        let mut offset = 0;
        let mut last = None;
        for (i, raw) in source.input().split_terminator('\n').enumerate() {
            let next_offset = offset + raw.len() + 1;
            let line = raw.trim_end_matches('\r');
            if next_offset > self.offset {
                // offset is somewhere in the current line
                return Some(Snippet::new(i, self.offset - offset, line));
            }
            offset = next_offset;
            last = Some((i, line));
        }
        last.map(|(i, line)| Snippet::new(i, line.len(), line))
    }
}

#[derive(Debug)]
pub struct SourceMetadata<'a> {
    file: Option<std::path::PathBuf>,
    source: &'a str,
}

impl<'a> SourceMetadata<'a> {
    pub const fn input(&self) -> &'a str {
        self.source
    }
    pub const fn new(source: &'a str) -> Self {
        Self { file: None, source }
    }
    #[must_use]
    pub fn with_file(mut self, file: std::path::PathBuf) -> Self {
        self.file = Some(file);
        self
    }
    pub fn file(&self) -> Option<&std::path::Path> {
        self.file.as_deref()
    }
}

impl<T> Error<T> {
    pub const fn new(kind: T) -> Self {
        Self {
            kind,
            snippet: None,
            file: None,
            contexts: Vec::new(),
        }
    }
    pub fn map_kind<F, U>(self, mapper: F) -> Error<U>
    where
        F: Fn(T) -> U,
    {
        Error {
            kind: mapper(self.kind),
            snippet: self.snippet,
            file: self.file,
            contexts: self.contexts,
        }
    }
    #[must_use]
    pub fn with_source(mut self, span: Span, source: &SourceMetadata) -> Self {
        self.file = source.file.clone();
        self.snippet = span.snippet_from_source(source);
        self
    }
    #[must_use]
    pub fn add_context(mut self, ctx: &'static str) -> Self {
        self.contexts.push(ctx);
        self
    }
    pub fn contexts(&self) -> &[&'static str] {
        &self.contexts
    }
    pub fn position(&self) -> Option<Position> {
        self.snippet.as_ref().map(|snip| snip.position)
    }
}

#[derive(Debug, Clone)]
pub struct Snippet {
    position: Position,
    line: String,
}

impl Snippet {
    fn new(line_number: usize, col: usize, line: &str) -> Self {
        Self {
            position: Position {
                line: line_number,
                col,
            },
            line: line.to_string(),
        }
    }
}

/// What a decision point was looking for when it failed.
#[derive(Debug, Clone, PartialEq)]
pub enum WantedSpec<T> {
    Specific(T),
    OneOf(Vec<T>),
    Description(&'static str),
}

impl<T: fmt::Display> fmt::Display for WantedSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Description(desc) => f.write_str(desc),
            Self::Specific(t) => write!(f, "{}", t),
            Self::OneOf(options) => match options.split_last() {
                None => f.write_str("nothing"),
                Some((only, [])) => write!(f, "{}", only),
                Some((last, rest)) => {
                    f.write_str("one of ")?;
                    for (i, option) in rest.iter().enumerate() {
                        if i != 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", option)?;
                    }
                    write!(f, " or {}", last)
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub col: usize,
    pub line: usize,
}

impl<T: error::Error + 'static> error::Error for Error<T> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl<T: fmt::Display> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let whiles = self
            .contexts
            .iter()
            .copied()
            .fold(String::new(), |acc, next| acc + "\nwhile " + next);
        let snippet = if let Some(snip) = &self.snippet {
            snip
        } else {
            return write!(f, "{} (no location info){}", self.kind, whiles);
        };
        let file = self
            .file
            .as_ref()
            .and_then(|x| x.to_str())
            .unwrap_or("<unknown source>");

        write!(
            f,
            "\
{kind}
   --> {file}:{line}:{col}
    |
{line:3} | {snippet}
    | {marker:>0$}{whiles}",
            snippet.position.col + 1,
            marker = '^',
            line = snippet.position.line + 1,
            col = snippet.position.col + 1,
            file = file,
            kind = self.kind,
            snippet = snippet.line,
            whiles = whiles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_points_at_second_line() {
        let meta = SourceMetadata::new("print(1);\nprint(2 $ 3);\n");
        let snippet = Span::new(18).snippet_from_source(&meta).unwrap();
        assert_eq!(snippet.position, Position { line: 1, col: 8 });
        assert_eq!(snippet.line, "print(2 $ 3);");
    }

    #[test]
    fn end_of_input_points_past_the_last_line() {
        let meta = SourceMetadata::new("print(1);\nprint(2)\n");
        let snippet = Span::new(meta.input().len())
            .snippet_from_source(&meta)
            .unwrap();
        assert_eq!(snippet.position, Position { line: 1, col: 8 });
        assert_eq!(snippet.line, "print(2)");
        assert!(Span::new(0)
            .snippet_from_source(&SourceMetadata::new(""))
            .is_none());
    }

    #[test]
    fn display_includes_location_and_contexts() {
        let meta = SourceMetadata::new("1 + ;").with_file("main.hmm".into());
        let err = Error::new("oops")
            .with_source(Span::new(4), &meta)
            .add_context("parsing expression");
        let text = err.to_string();
        dbg!(&text);
        assert!(text.starts_with("oops\n   --> main.hmm:1:5"));
        assert!(text.ends_with("\nwhile parsing expression"));
    }

    #[test]
    fn one_of_lists_every_option() {
        let wanted: WantedSpec<&str> = WantedSpec::OneOf(vec!["`if`", "`for`", "`while`"]);
        assert_eq!(wanted.to_string(), "one of `if`, `for` or `while`");
        let single: WantedSpec<&str> = WantedSpec::OneOf(vec!["`;`"]);
        assert_eq!(single.to_string(), "`;`");
    }
}
