//! FFmpeg `-progress` output.
//!
//! FFmpeg writes `key=value` lines in blocks; every block ends with
//! `progress=continue`, the last one with `progress=end`.

/// Keys that can appear inside a progress block.
const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "stream_",
    "bitrate",
    "total_size",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// Encoder position at the end of one progress block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EncodeProgress {
    /// Frames written so far
    pub frame: u64,
    /// Output timestamp reached, in seconds
    pub rendered_secs: f64,
    /// Speed relative to realtime, once reported
    pub speed: Option<f64>,
    /// Set on the last block
    pub finished: bool,
}

/// Folds progress lines into [`EncodeProgress`] snapshots.
#[derive(Debug, Default)]
pub struct ProgressReader {
    current: EncodeProgress,
}

impl ProgressReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `line` is part of a progress block rather than a diagnostic.
    pub fn is_progress_line(line: &str) -> bool {
        line.trim()
            .split_once('=')
            .is_some_and(|(key, _)| PROGRESS_KEYS.iter().any(|k| key.starts_with(k)))
    }

    /// Consume one line; yields a snapshot whenever a block closes.
    pub fn feed(&mut self, line: &str) -> Option<EncodeProgress> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key {
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.current.frame = frame;
                }
            }
            // out_time_ms carries microseconds as well
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.current.rendered_secs = us.max(0) as f64 / 1_000_000.0;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.current.speed = Some(speed);
                }
            }
            "progress" => {
                self.current.finished = value == "end";
                return Some(self.current);
            }
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_snapshots() {
        let mut reader = ProgressReader::new();
        let block = [
            "frame=50",
            "out_time_us=2000000",
            "speed=N/A",
            "progress=continue",
        ];

        let snapshots: Vec<_> = block.iter().filter_map(|l| reader.feed(l)).collect();
        assert_eq!(
            snapshots,
            vec![EncodeProgress {
                frame: 50,
                rendered_secs: 2.0,
                speed: None,
                finished: false,
            }]
        );

        assert!(reader.feed("out_time_ms=4500000").is_none());
        assert!(reader.feed("speed=1.5x").is_none());
        let last = reader.feed("progress=end").unwrap();
        assert!(last.finished);
        assert_eq!(last.rendered_secs, 4.5);
        assert_eq!(last.speed, Some(1.5));
    }

    #[test]
    fn test_negative_time_clamped() {
        let mut reader = ProgressReader::new();
        reader.feed("out_time_us=-9223372036854775807");
        assert_eq!(reader.feed("progress=continue").unwrap().rendered_secs, 0.0);
    }

    #[test]
    fn test_progress_line_detection() {
        assert!(ProgressReader::is_progress_line("out_time_us=1000"));
        assert!(ProgressReader::is_progress_line("stream_0_0_q=28.0"));
        assert!(ProgressReader::is_progress_line("progress=end"));
        assert!(!ProgressReader::is_progress_line("[libx264 @ 0x55] error opening encoder"));
        assert!(!ProgressReader::is_progress_line("Invalid argument"));
    }
}
