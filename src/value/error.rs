use super::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Name,
    Attribute,
    Argument,
    Type,
    Value,
    Index,
    Key,
    Version,
    Import,
    StackOverflow,
    Assertion,
    /// A value raised by user code; the payload is carried unchanged.
    Raised,
    /// Internal control signal that escaped every construct.
    Control,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "LexicalError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Name => "NameError",
            ErrorKind::Attribute => "AttributeError",
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Value => "ValueError",
            ErrorKind::Index => "IndexError",
            ErrorKind::Key => "KeyError",
            ErrorKind::Version => "VersionError",
            ErrorKind::Import => "ImportError",
            ErrorKind::StackOverflow => "StackOverflowError",
            ErrorKind::Assertion => "AssertionError",
            ErrorKind::Raised => "UserRaised",
            ErrorKind::Control => "ControlFlowError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Runtime failures and non-local control signals share one carrier so that
/// they propagate uniformly through `?`. Signals are identified by their
/// payload fields and are never caught by `try`.
#[derive(Debug)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub start: Option<usize>,
    pub(crate) return_value: Option<Value>,
    pub(crate) break_depth: Option<u32>,
    pub(crate) continue_depth: Option<u32>,
    /// Set when a continue signal was re-raised by a terminating loop;
    /// switch fall-through ignores such signals.
    pub(crate) from_loop: bool,
    pub(crate) raised: Option<Value>,
    pub trace: Vec<String>,
}

impl RuntimeError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            start: None,
            return_value: None,
            break_depth: None,
            continue_depth: None,
            from_loop: false,
            raised: None,
            trace: Vec::new(),
        }
    }

    pub(crate) fn lexical(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexical, message)
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub(crate) fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, message)
    }

    pub(crate) fn attribute(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Attribute, message)
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Argument, message)
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, message)
    }

    pub(crate) fn import(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Import, message)
    }

    pub(crate) fn version(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Version, message)
    }

    pub(crate) fn with_span(mut self, start: usize) -> Self {
        if self.start.is_none() {
            self.start = Some(start);
        }
        self
    }

    pub(crate) fn break_signal(depth: u32) -> Self {
        let mut e = Self::new(ErrorKind::Control, "No more loops to break out of");
        e.break_depth = Some(depth);
        e
    }

    pub(crate) fn continue_signal(depth: u32, from_loop: bool) -> Self {
        let mut e = Self::new(ErrorKind::Control, "No more loops to skip");
        e.continue_depth = Some(depth);
        e.from_loop = from_loop;
        e
    }

    pub(crate) fn return_signal(value: Value) -> Self {
        let mut e = Self::new(ErrorKind::Control, "Return used outside of function");
        e.return_value = Some(value);
        e
    }

    pub(crate) fn raised(value: Value, rendered: String) -> Self {
        let mut e = Self::new(ErrorKind::Raised, rendered);
        e.raised = Some(value);
        e
    }

    /// Break, continue and return travel through the error channel but are
    /// not errors; `try` must let them pass.
    pub(crate) fn is_signal(&self) -> bool {
        self.return_value.is_some()
            || self.break_depth.is_some()
            || self.continue_depth.is_some()
    }

    /// Render a source-anchored report for the CLI.
    pub fn render_report(&self, source: &str, filename: &str) -> String {
        let start = self.start.unwrap_or(0);
        let chars: Vec<char> = source.chars().collect();
        let upto = start.min(chars.len());
        let line = chars[..upto].iter().filter(|c| **c == '\n').count() + 1;
        let col = upto - chars[..upto]
            .iter()
            .rposition(|c| *c == '\n')
            .map(|p| p + 1)
            .unwrap_or(0)
            + 1;
        let src_line = source.lines().nth(line - 1).unwrap_or("");
        let mut out = format!("File {:?}, line {}, col {}\n", filename, line, col);
        out.push_str(&format!("{:>5} | {}\n", line, src_line));
        out.push_str(&format!("{}^\n", " ".repeat(8 + col.saturating_sub(1))));
        for frame in self.trace.iter().rev() {
            out.push_str(&format!("  in {}\n", frame));
        }
        out.push_str(&format!("{}: {}", self.kind.label(), self.message));
        out
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RuntimeError};

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(ErrorKind::Name.label(), "NameError");
        assert_eq!(ErrorKind::Raised.label(), "UserRaised");
        assert_eq!(ErrorKind::StackOverflow.label(), "StackOverflowError");
    }

    #[test]
    fn signals_are_not_plain_errors() {
        assert!(RuntimeError::break_signal(1).is_signal());
        assert!(RuntimeError::continue_signal(2, false).is_signal());
        assert!(!RuntimeError::name("x").is_signal());
    }

    #[test]
    fn report_points_at_the_offending_line() {
        let src = "var x = 1;\nboom;\n";
        let err = RuntimeError::name("Name 'boom' is not defined").with_span(11);
        let report = err.render_report(src, "demo.saf");
        assert!(report.contains("line 2, col 1"));
        assert!(report.contains("NameError"));
    }
}
