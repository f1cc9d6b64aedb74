use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{FeedError, Result};
use crate::model::Match;

/// Write-only text export used by "share".
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Sets the system clipboard through the OSC 52 terminal escape. Works over
/// SSH in terminals that honour it; others silently ignore the sequence.
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl Osc52Clipboard<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Clipboard for Osc52Clipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let payload = STANDARD.encode(text.as_bytes());
        write!(self.out, "\x1b]52;c;{payload}\x07")
            .and_then(|_| self.out.flush())
            .map_err(|err| FeedError::ClipboardUnavailable(err.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write_text(&mut self, _text: &str) -> Result<()> {
        Err(FeedError::ClipboardUnavailable(
            "no clipboard in this session".to_string(),
        ))
    }
}

/// One-line summary copied by "share".
pub fn share_text(m: &Match) -> String {
    let side = |team: &str, score: Option<&str>| match score.map(str::trim) {
        Some(score) if !score.is_empty() => format!("{} {score}", team.trim()),
        _ => team.trim().to_string(),
    };
    let mut text = format!(
        "{} vs {}",
        side(&m.t1, m.t1s.as_deref()),
        side(&m.t2, m.t2s.as_deref())
    );
    if let Some(status) = m.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        text.push_str(" - ");
        text.push_str(status);
    }
    if !m.series.trim().is_empty() {
        text.push_str(&format!(" ({})", m.series.trim()));
    }
    text
}
