use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use crate::capture::{Frame, FrameSource};
use crate::common::{GestureAuthError, Result};
use crate::core::features::HandObservation;

/// One line of a recorded landmark stream.
#[derive(Debug, Deserialize)]
struct ReplayLine {
    /// Seconds since the recording started.
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    hands: Vec<HandObservation>,
}

/// Plays back detector output recorded as JSON lines:
/// `{"t": 0.033, "hands": [[[x, y, z], ...21 points], ...]}`.
///
/// Lines without `t` are timed at `fps`. Blank lines are skipped.
pub struct ReplaySource<R> {
    reader: R,
    interval: Duration,
    line_no: usize,
    frame_index: u32,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path, fps: u32) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            GestureAuthError::Other(anyhow::anyhow!(
                "Failed to open frame recording {}: {}", path.display(), e
            ))
        })?;
        Ok(Self::new(BufReader::new(file), fps))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R, fps: u32) -> Self {
        Self {
            reader,
            interval: Duration::from_secs(1) / fps.max(1),
            line_no: 0,
            frame_index: 0,
        }
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !line.trim().is_empty() {
                break;
            }
        }

        let parsed: ReplayLine = serde_json::from_str(line.trim()).map_err(|e| {
            GestureAuthError::Other(anyhow::anyhow!("Bad frame on line {}: {}", self.line_no, e))
        })?;

        let elapsed = match parsed.t {
            Some(t) if t.is_finite() && t >= 0.0 => Duration::try_from_secs_f64(t).map_err(|e| {
                GestureAuthError::Other(anyhow::anyhow!(
                    "Bad frame on line {}: timestamp {}: {}", self.line_no, t, e
                ))
            })?,
            _ => self.interval * self.frame_index,
        };
        self.frame_index += 1;

        Ok(Some(Frame { elapsed, hands: parsed.hands }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hand_json() -> String {
        serde_json::to_string(&vec![[0.5, 0.5, 0.0]; 21]).unwrap()
    }

    #[test]
    fn reads_timestamps_and_hands() {
        let data = format!(
            "{{\"t\": 0.5, \"hands\": [{h}, {h}]}}\n\n{{\"hands\": []}}\n",
            h = hand_json()
        );
        let mut source = ReplaySource::new(Cursor::new(data), 30);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.elapsed, Duration::from_millis(500));
        assert_eq!(first.hands.len(), 2);
        assert!(first.hands[0].is_well_formed());

        let second = source.next_frame().unwrap().unwrap();
        assert!(second.hands.is_empty());
        assert_eq!(second.elapsed, Duration::from_secs(1) / 30);

        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn bad_line_reports_line_number() {
        let mut source = ReplaySource::new(Cursor::new("{\"hands\": []}\nnot json\n"), 30);
        source.next_frame().unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn oversized_timestamp_is_an_error() {
        let data = format!("{{\"t\": 1e30, \"hands\": [{}]}}\n", hand_json());
        let mut source = ReplaySource::new(Cursor::new(data), 30);
        let err = source.next_frame().unwrap_err();
        assert!(err.to_string().contains("line 1"), "{}", err);
    }
}
