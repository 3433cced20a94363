use arrayvec::ArrayString;

/// Longest command line that is kept, anything beyond is discarded up to the next newline.
pub const LINE_CAPACITY: usize = 32;

/// A line that stayed incomplete for this long is handed out as is.
pub const INTER_CHAR_TIMEOUT_MS: u64 = 20;

pub type Line = ArrayString<LINE_CAPACITY>;

/// Collects bytes from the serial port into lines.
///
/// Lines end at `\n` or when the sender pauses for [`INTER_CHAR_TIMEOUT_MS`], in which case the
/// driver calls [`LineAssembler::flush`]. Bytes outside of 7 bit ascii are dropped.
#[derive(Default)]
pub struct LineAssembler {
    buf: Line,
    truncated: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) -> Option<Line> {
        if !byte.is_ascii() {
            return None;
        }
        if byte == b'\n' {
            return self.take();
        }
        if self.buf.is_empty() {
            self.truncated = false;
        }
        if self.buf.try_push(byte as char).is_err() {
            self.truncated = true;
        }
        None
    }

    /// Completes whatever was received so far.
    pub fn flush(&mut self) -> Option<Line> {
        self.take()
    }

    /// Whether the line handed out last lost characters because it was too long. Cleared when
    /// the next line starts.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn take(&mut self) -> Option<Line> {
        if self.buf.is_empty() {
            None
        } else {
            Some(core::mem::take(&mut self.buf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(a: &mut LineAssembler, bytes: &[u8]) -> Vec<String> {
        bytes
            .iter()
            .filter_map(|b| a.push(*b))
            .map(|l| l.as_str().to_owned())
            .collect()
    }

    #[test]
    fn test_newline_terminates() {
        let mut a = LineAssembler::new();
        assert_eq!(feed(&mut a, b"a\ni?10\n"), vec!["a", "i?10"]);
        assert_eq!(a.flush(), None);
    }

    #[test]
    fn test_flush_after_pause() {
        let mut a = LineAssembler::new();
        assert!(feed(&mut a, b"r").is_empty());
        assert_eq!(a.flush().as_deref(), Some("r"));
        assert_eq!(a.flush(), None);
    }

    #[test]
    fn test_empty_lines_are_skipped() {
        let mut a = LineAssembler::new();
        assert!(feed(&mut a, b"\n\n").is_empty());
    }

    #[test]
    fn test_non_ascii_dropped() {
        let mut a = LineAssembler::new();
        assert_eq!(feed(&mut a, b"h\xffel\xc3p\n"), vec!["help"]);
    }

    #[test]
    fn test_overlong_line_truncated() {
        let mut a = LineAssembler::new();
        let mut input = vec![b'x'; LINE_CAPACITY + 10];
        for b in input.iter() {
            assert_eq!(a.push(*b), None);
        }
        assert!(a.truncated());
        input.clear();
        input.push(b'\n');
        let lines = feed(&mut a, &input);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), LINE_CAPACITY);
        assert!(a.truncated());

        assert_eq!(feed(&mut a, b"a\n"), vec!["a"]);
        assert!(!a.truncated());
    }

    #[test]
    fn test_carriage_return_kept_for_trimming() {
        let mut a = LineAssembler::new();
        assert_eq!(feed(&mut a, b"x\r\n"), vec!["x\r"]);
    }
}
