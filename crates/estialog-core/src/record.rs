use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    pub fn to_log_level(self) -> log::Level {
        match self {
            Level::Error => log::Level::Error,
            Level::Warn => log::Level::Warn,
            Level::Info => log::Level::Info,
            Level::Debug => log::Level::Debug,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Trace has no line prefix of its own on the wire.
impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug | log::Level::Trace => Level::Debug,
        }
    }
}

/// A single diagnostic event. Borrowed from the caller for the duration of
/// dispatch and never retained by sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub level: Level,
    pub tag: &'a str,
    pub message: &'a str,
}

impl<'a> LogRecord<'a> {
    pub fn new(level: Level, tag: &'a str, message: &'a str) -> Self {
        Self { level, tag, message }
    }

    /// Length in bytes of the line produced by [`LogRecord::write_line`].
    pub fn line_len(&self) -> usize {
        // "[" + level + "] " + tag + ": " + message + "\n"
        self.level.as_str().len() + 3 + ascii_len(self.tag) + 2 + ascii_len(self.message) + 1
    }

    /// Appends `[<LEVEL>] <tag>: <message>\n` to `out`.
    ///
    /// Characters outside ASCII become `?`. Embedded newlines are copied as-is.
    pub fn write_line(&self, out: &mut Vec<u8>) {
        out.reserve(self.line_len());
        out.push(b'[');
        out.extend_from_slice(self.level.as_str().as_bytes());
        out.extend_from_slice(b"] ");
        push_ascii(out, self.tag);
        out.extend_from_slice(b": ");
        push_ascii(out, self.message);
        out.push(b'\n');
    }

    pub fn to_line(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.line_len());
        self.write_line(&mut out);
        out
    }
}

fn ascii_len(s: &str) -> usize {
    s.chars().count()
}

fn push_ascii(out: &mut Vec<u8>, s: &str) {
    if s.is_ascii() {
        out.extend_from_slice(s.as_bytes());
    } else {
        out.extend(s.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_level() {
        for (level, expected) in [
            (Level::Error, "[ERROR] net: link down\n"),
            (Level::Warn, "[WARN] net: link down\n"),
            (Level::Info, "[INFO] net: link down\n"),
            (Level::Debug, "[DEBUG] net: link down\n"),
        ] {
            let record = LogRecord::new(level, "net", "link down");
            assert_eq!(record.to_line(), expected.as_bytes());
            assert_eq!(record.line_len(), expected.len());
        }
    }

    #[test]
    fn replaces_non_ascii() {
        let record = LogRecord::new(Level::Info, "tëmp", "21°C");
        assert_eq!(record.to_line(), b"[INFO] t?mp: 21?C\n");
        assert_eq!(record.line_len(), record.to_line().len());
    }

    #[test]
    fn trace_folds_into_debug() {
        assert_eq!(Level::from(log::Level::Trace), Level::Debug);
        assert_eq!(Level::from(log::Level::Warn), Level::Warn);
        assert_eq!(Level::Info.to_log_level(), log::Level::Info);
    }

    #[test]
    fn empty_tag_and_message() {
        let record = LogRecord::new(Level::Warn, "", "");
        assert_eq!(record.to_line(), b"[WARN] : \n");
    }
}
