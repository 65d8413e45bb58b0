use crate::capture::CancelSignal;
use crate::core::enrollment::FrameOutcome;
use crate::core::features::HandMode;
use crate::core::liveness::Decision;
use crate::core::session::RecordingProgress;
use std::io::{self, Write};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    queue,
    terminal::{self, Clear, ClearType},
    tty::IsTty,
};

const BAR_WIDTH: usize = 15;

/// Esc-key cancel signal.
///
/// Puts the terminal in raw mode for its lifetime so a single keypress is
/// seen without Enter. When stdin is not a terminal it never cancels.
/// Log output should go through [`StatusAwareStderr`] while one is alive.
pub struct EscapeKey {
    active: bool,
}

impl EscapeKey {
    pub fn new() -> Self {
        let active = io::stdin().is_tty() && terminal::enable_raw_mode().is_ok();
        if !active {
            tracing::debug!("Raw mode unavailable, Esc cancel disabled");
        }
        Self { active }
    }
}

impl Default for EscapeKey {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EscapeKey {
    fn drop(&mut self) {
        if self.active {
            let _ = terminal::disable_raw_mode();
        }
    }
}

impl CancelSignal for EscapeKey {
    fn is_cancelled(&mut self) -> bool {
        self.active && check_for_escape().unwrap_or(false)
    }
}

/// Stderr log writer that stays readable under raw mode.
///
/// While raw mode is on, each write first clears the status line and every
/// `\n` becomes `\r\n`. Otherwise bytes pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusAwareStderr;

impl Write for StatusAwareStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut err = io::stderr().lock();
        if terminal::is_raw_mode_enabled().unwrap_or(false) {
            queue!(err, Clear(ClearType::CurrentLine))?;
            err.write_all(b"\r")?;
            err.write_all(&raw_line_endings(buf))?;
        } else {
            err.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

fn raw_line_endings(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() + 8);
    for &b in buf {
        if b == b'\n' {
            out.push(b'\r');
        }
        out.push(b);
    }
    out
}

pub fn check_for_escape() -> io::Result<bool> {
    while event::poll(std::time::Duration::from_millis(0))? {
        if let Event::Key(KeyEvent { code: KeyCode::Esc, .. }) = event::read()? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Overwrites the current terminal line.
pub fn print_status(line: &str) {
    print!("\r{:<78}", line);
    let _ = io::stdout().flush();
}

pub fn render_recording(mode: HandMode, progress: &RecordingProgress) -> String {
    let hands = match (progress.outcome, mode) {
        (FrameOutcome::Accepted, HandMode::One) => "ONE HAND DETECTED",
        (FrameOutcome::Accepted, HandMode::Two) => "TWO HANDS DETECTED",
        (_, HandMode::One) => "No hand detected",
        (_, HandMode::Two) => "SHOW BOTH HANDS!",
    };
    format!(
        "Recording: {}s  Frames: {}  {}",
        progress.remaining.as_secs_f32().ceil() as u64,
        progress.frames,
        hands
    )
}

pub fn render_decision(mode: HandMode, decision: &Decision, required: u32) -> String {
    match decision {
        Decision::Waiting => match mode {
            HandMode::One => "No hand detected".to_string(),
            HandMode::Two => "Show BOTH hands".to_string(),
        },
        Decision::Scored { score, matched, stable_frames } => format!(
            "{:<8} Match: {:5.1}%  Stable: {} {}/{}",
            if *matched { "MATCH!" } else { "NO MATCH" },
            score,
            stable_bar(*stable_frames, required),
            stable_frames,
            required
        ),
        Decision::Authenticated { score } => format!("AUTHENTICATED! Match: {:.1}%", score),
        Decision::Cancelled => "Cancelled".to_string(),
        Decision::StreamEnded => "Camera stream ended".to_string(),
        Decision::TimedOut => "Timed out".to_string(),
    }
}

fn stable_bar(stable: u32, required: u32) -> String {
    let required = required.max(1) as usize;
    let filled = (stable as usize * BAR_WIDTH / required).min(BAR_WIDTH);
    format!("[{}{}]", "■".repeat(filled), "□".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn recording_line_shows_remaining_seconds() {
        let progress = RecordingProgress {
            elapsed: Duration::from_millis(2500),
            remaining: Duration::from_millis(5500),
            frames: 42,
            outcome: FrameOutcome::NoHands,
        };
        assert_eq!(
            render_recording(HandMode::Two, &progress),
            "Recording: 6s  Frames: 42  SHOW BOTH HANDS!"
        );
    }

    #[test]
    fn decision_line_shows_stable_progress() {
        let line = render_decision(
            HandMode::One,
            &Decision::Scored { score: 81.25, matched: true, stable_frames: 5 },
            15,
        );
        assert!(line.starts_with("MATCH!"));
        assert!(line.contains("81.2%") || line.contains("81.3%"));
        assert!(line.contains("[■■■■■□□□□□□□□□□] 5/15"), "{}", line);
    }

    #[test]
    fn raw_mode_log_lines_return_the_cursor() {
        assert_eq!(
            raw_line_endings(b"WARN first\nWARN second\n"),
            b"WARN first\r\nWARN second\r\n".to_vec()
        );
        assert_eq!(raw_line_endings(b"no newline"), b"no newline".to_vec());
    }

    #[test]
    fn bar_never_overflows() {
        assert_eq!(stable_bar(40, 15).chars().filter(|&c| c == '■').count(), BAR_WIDTH);
        assert_eq!(stable_bar(0, 0).chars().filter(|&c| c == '□').count(), BAR_WIDTH);
    }
}
