//! Output sanitization: control sequence stripping and noise removal.

use vte::{Params, Parser, Perform};

/// Substrings marking lines that carry no information for the agent.
const NOISE_MARKERS: &[&str] = &["Warning: Input is not a terminal"];

/// Output sanitizer using VTE parser.
pub struct OutputSanitizer;

impl OutputSanitizer {
    /// Strip ANSI escape codes from raw bytes.
    ///
    /// Returns clean UTF-8 text with all control sequences removed.
    pub fn strip_ansi(input: &[u8]) -> String {
        let mut extractor = PlainTextExtractor::new();
        let mut parser = Parser::new();

        parser.advance(&mut extractor, input);

        extractor.into_string()
    }

    /// Strip ANSI codes from a string.
    pub fn strip_ansi_str(input: &str) -> String {
        Self::strip_ansi(input.as_bytes())
    }

    /// Normalize captured tool output for agent consumption.
    ///
    /// Control sequences are removed, noise lines dropped, trailing
    /// whitespace trimmed per line and at the end. Line order is kept.
    /// Applying it twice gives the same text as applying it once.
    pub fn sanitize(input: &str) -> String {
        let stripped = Self::strip_ansi_str(input);
        let kept: Vec<&str> = stripped
            .lines()
            .filter(|line| !Self::is_noise(line))
            .map(str::trim_end)
            .collect();

        kept.join("\n").trim_end().to_string()
    }

    /// Whether a line is known noise (interactive-input warnings).
    pub fn is_noise(line: &str) -> bool {
        NOISE_MARKERS.iter().any(|marker| line.contains(marker))
            || (line.contains("Warning:") && line.contains("(fd=0)"))
    }
}

/// VTE performer that extracts plain text.
struct PlainTextExtractor {
    output: Vec<u8>,
}

impl PlainTextExtractor {
    fn new() -> Self {
        Self { output: Vec::new() }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Perform for PlainTextExtractor {
    fn print(&mut self, c: char) {
        let mut buf = [0u8; 4];
        let encoded = c.encode_utf8(&mut buf);
        self.output.extend_from_slice(encoded.as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // Newline, carriage return, tab survive; other C0 controls go.
        if matches!(byte, 0x0A | 0x0D | 0x09) {
            self.output.push(byte);
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn csi_dispatch(
        &mut self,
        _params: &Params,
        _intermediates: &[u8],
        _ignore: bool,
        _action: char,
    ) {
        // Cursor movement, colors, etc.
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let output = OutputSanitizer::strip_ansi(b"hello world");
        assert_eq!(output, "hello world");
    }

    #[test]
    fn test_strip_color_codes() {
        let output = OutputSanitizer::strip_ansi(b"\x1b[31mred\x1b[0m");
        assert_eq!(output, "red");
    }

    #[test]
    fn test_strip_cursor_movement() {
        let output = OutputSanitizer::strip_ansi(b"\x1b[2J\x1b[Hcontent");
        assert_eq!(output, "content");
    }

    #[test]
    fn test_osc_title() {
        let output = OutputSanitizer::strip_ansi(b"\x1b]0;Window Title\x07actual content");
        assert_eq!(output, "actual content");
    }

    #[test]
    fn test_preserve_tabs_and_newlines() {
        let output = OutputSanitizer::strip_ansi(b"col1\tcol2\nline2");
        assert_eq!(output, "col1\tcol2\nline2");
    }

    #[test]
    fn test_sanitize_drops_terminal_warning() {
        let raw = "Installing...\nWarning: Input is not a terminal (fd=0).\nDone";
        assert_eq!(OutputSanitizer::sanitize(raw), "Installing...\nDone");
    }

    #[test]
    fn test_sanitize_drops_fd_warning_variant() {
        let raw = "Warning: stdin (fd=0) is not interactive\nok";
        assert_eq!(OutputSanitizer::sanitize(raw), "ok");
    }

    #[test]
    fn test_sanitize_keeps_unrelated_warnings() {
        let raw = "Warning: config is deprecated\nok";
        assert_eq!(OutputSanitizer::sanitize(raw), raw);
    }

    #[test]
    fn test_sanitize_trims_trailing_whitespace() {
        let raw = "\x1b[32mline one\x1b[0m   \nline two\t\n\n\n";
        assert_eq!(OutputSanitizer::sanitize(raw), "line one\nline two");
    }

    #[test]
    fn test_sanitize_keeps_leading_indentation() {
        let raw = "servers:\n  - memory\n  - toolbox";
        assert_eq!(OutputSanitizer::sanitize(raw), raw);
    }

    #[test]
    fn test_sanitize_crlf_output() {
        let raw = "first\r\nsecond\r\n";
        assert_eq!(OutputSanitizer::sanitize(raw), "first\nsecond");
    }

    #[test]
    fn test_sanitize_color_hidden_noise() {
        // The marker only appears once the color codes are gone.
        let raw = "\x1b[33mWarning:\x1b[0m Input is not a terminal (fd=0)\nready";
        assert_eq!(OutputSanitizer::sanitize(raw), "ready");
    }

    #[test]
    fn test_sanitize_idempotent() {
        let samples = [
            "",
            "plain",
            "\x1b[1;31mError\x1b[0m: boom  \n\nWarning: Input is not a terminal\n",
            "a\r\nb\r\n\tc \x1b]0;title\x07\n",
            "\x1b[",
            "  \n \n",
        ];
        for sample in samples {
            let once = OutputSanitizer::sanitize(sample);
            let twice = OutputSanitizer::sanitize(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_sanitize_empty_and_escape_only() {
        assert_eq!(OutputSanitizer::sanitize(""), "");
        assert_eq!(OutputSanitizer::sanitize("\x1b[31m\x1b[0m\x1b[2J"), "");
    }
}
