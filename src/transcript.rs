//! Turning received text into what gets shown on screen.
//!
//! Timestamps are taken when the text is displayed, not when it was read from
//! the device.

use chrono::{DateTime, Local};

/// Format `now` as `HH:MM:SS:mmm`.
pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%H:%M:%S:%3f").to_string()
}

/// Prepare `text` for display.
///
/// Without a timestamp the text is returned untouched. With one, every
/// non-empty line becomes `[<timestamp>]: <line>` followed by a newline.
pub fn render(text: &str, stamp: Option<&str>) -> String {
    match stamp {
        None => text.to_owned(),
        Some(stamp) => text
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(|line| format!("[{}]: {}\n", stamp, line))
            .collect(),
    }
}

/// Most recent rendered bytes a [`Transcript`] keeps.
pub const RETAINED_BYTES: usize = 64 * 1024;

/// The tail of what was displayed since the last clear, at most
/// [`RETAINED_BYTES`] long.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    timestamps: bool,
    text: String,
}

impl Transcript {
    pub fn new(timestamps: bool) -> Self {
        Transcript {
            timestamps,
            text: String::new(),
        }
    }

    pub fn timestamps(&self) -> bool {
        self.timestamps
    }

    pub fn set_timestamps(&mut self, timestamps: bool) {
        self.timestamps = timestamps;
    }

    /// Render `text` as of `now`, keep it, and return the rendered part.
    ///
    /// Older text is dropped from the front once more than
    /// [`RETAINED_BYTES`] are kept.
    pub fn append(&mut self, text: &str, now: DateTime<Local>) -> String {
        if text.is_empty() {
            return String::new();
        }
        let stamp = if self.timestamps {
            Some(timestamp(now))
        } else {
            None
        };
        let rendered = render(text, stamp.as_deref());
        self.text.push_str(&rendered);
        self.trim();
        rendered
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    fn trim(&mut self) {
        if self.text.len() <= RETAINED_BYTES {
            return;
        }
        let mut cut = self.text.len() - RETAINED_BYTES;
        while !self.text.is_char_boundary(cut) {
            cut += 1;
        }
        self.text.drain(..cut);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 1, 12, 4, 5)
            .unwrap()
            + chrono::Duration::milliseconds(7)
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(timestamp(noon()), "12:04:05:007");
    }

    #[test]
    fn render_without_timestamp_is_identity() {
        assert_eq!(render("a\n\nb", None), "a\n\nb");
    }

    #[test]
    fn render_prefixes_each_line() {
        assert_eq!(
            render("boot ok\n\nready\n", Some("01:02:03:004")),
            "[01:02:03:004]: boot ok\n[01:02:03:004]: ready\n"
        );
    }

    #[test]
    fn render_only_newlines() {
        assert_eq!(render("\n\n", Some("01:02:03:004")), "");
    }

    #[test]
    fn transcript_accumulates_and_clears() {
        let mut transcript = Transcript::new(false);
        assert_eq!(transcript.append("hel", noon()), "hel");
        assert_eq!(transcript.append("lo\n", noon()), "lo\n");
        assert_eq!(transcript.as_str(), "hello\n");

        transcript.clear();
        assert_eq!(transcript.as_str(), "");
    }

    #[test]
    fn transcript_with_timestamps() {
        let mut transcript = Transcript::new(true);
        let shown = transcript.append("x\ny", noon());
        assert_eq!(shown, "[12:04:05:007]: x\n[12:04:05:007]: y\n");
        assert_eq!(transcript.as_str(), shown);
    }

    #[test]
    fn transcript_keeps_only_the_tail() {
        let mut transcript = Transcript::new(false);
        let chunk = "x".repeat(1024);
        for _ in 0..10_000 {
            transcript.append(&chunk, noon());
        }
        transcript.append("end\n", noon());

        assert_eq!(transcript.as_str().len(), RETAINED_BYTES);
        assert!(transcript.as_str().ends_with("xend\n"));
    }

    #[test]
    fn trimming_respects_char_boundaries() {
        let mut transcript = Transcript::new(false);
        transcript.append("é", noon());
        transcript.append(&"x".repeat(RETAINED_BYTES - 2), noon());
        assert_eq!(transcript.as_str().len(), RETAINED_BYTES);

        // One byte over: the two-byte "é" goes as a whole.
        transcript.append("y", noon());
        assert_eq!(transcript.as_str().len(), RETAINED_BYTES - 1);
        assert!(transcript.as_str().starts_with('x'));
        assert!(transcript.as_str().ends_with("xy"));
    }
}
