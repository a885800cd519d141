//! Log sanitization for health readings.
//!
//! Formatted log lines pass through `SanitizingMakeWriter` before reaching
//! the sink. It redacts:
//! - Named survey answers (`sys_bp=142`, `glucose: 210`, `diabetes: No`, ...)
//! - Whole numeric vectors such as encoded feature arrays
//!
//! Call sites should still avoid logging readings at all. This is the
//! fallback for `Debug` output that slips through.

use std::io::{self, Write};
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

static READING_PATTERNS: OnceLock<ReadingPatterns> = OnceLock::new();

/// Maximum number of bytes to sanitize per call.
const MAX_SANITIZE_BYTES: usize = 16 * 1024;

struct ReadingPattern {
    regex: Regex,
    replacement: &'static str,
}

struct ReadingPatterns {
    set: RegexSet,
    patterns: Vec<ReadingPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn get_patterns() -> &'static ReadingPatterns {
    READING_PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // name=value / name: value for any survey answer, numeric or categorical
            (
                r#"(?i)\b(?P<name>age|male|gender|education|current_?smoker|cigs_?per_?day|bp_?meds|prevalent_?stroke|prevalent_?hyp|diabetes|tot_?chol|cholesterol|sys_?bp|dia_?bp|bmi|heart_?rate|glucose)\b(?P<sep>\s*[:=]\s*)(?:-?\d+(?:\.\d+)?|"[^"]*"|(?:yes|no|true|false|male|female|high_?school|undergraduate|postgraduate|phd)\b)"#,
                "${name}${sep}[REDACTED]",
            ),
            // Numeric arrays of four or more elements (feature vectors)
            (
                r"\[\s*-?\d+(?:\.\d+)?(?:\s*,\s*-?\d+(?:\.\d+)?){3,}\s*,?\s*\]",
                "[REDACTED-VECTOR]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| ReadingPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        ReadingPatterns { set, patterns }
    })
}

/// Redact health readings from a string.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, MAX_SANITIZE_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check if a string contains anything `sanitize` would redact.
#[must_use]
pub fn contains_reading(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, MAX_SANITIZE_BYTES);
    get_patterns().set.is_match(prefix)
}

/// `MakeWriter` that redacts readings from every formatted log line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Holds bytes until a full line is available, then writes it redacted.
pub struct SanitizingWriter<W> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    fn emit(&mut self, line: &[u8]) -> io::Result<()> {
        let clean = sanitize(&String::from_utf8_lossy(line));
        self.inner.write_all(clean.as_bytes())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            self.emit(&line)?;
        }

        // An unterminated line past the cap is cut off and terminated.
        if self.pending.len() > MAX_SANITIZE_BYTES {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line)?;
            self.inner.write_all(b"\n")?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line)?;
        }
        self.inner.flush()
    }
}
