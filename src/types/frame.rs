//! Video frames handed from the source through the driver to the sinks

use serde::{Deserialize, Serialize};

/// One captured RGB frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position in the stream, starting at 0 for each run
    pub index: u64,
    /// Capture time in seconds; drives debounce timing
    pub timestamp: f64,
    pub width: usize,
    pub height: usize,
    /// Packed RGB, row-major, `width * height * 3` bytes (may be empty for
    /// sources that carry no pixels)
    #[serde(skip)]
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(index: u64, timestamp: f64, width: usize, height: usize, pixels: Vec<u8>) -> Self {
        Self {
            index,
            timestamp,
            width,
            height,
            pixels,
        }
    }

    /// Frame with dimensions but no pixel payload
    pub fn blank(index: u64, timestamp: f64, width: usize, height: usize) -> Self {
        Self::new(index, timestamp, width, height, Vec::new())
    }

    pub fn has_pixels(&self) -> bool {
        !self.pixels.is_empty() && self.pixels.len() == self.width * self.height * 3
    }

    /// Flip horizontally in place (selfie view)
    pub fn mirror(&mut self) {
        if !self.has_pixels() {
            return;
        }
        let stride = self.width * 3;
        for row in self.pixels.chunks_exact_mut(stride) {
            let (mut left, mut right) = (0, self.width - 1);
            while left < right {
                for c in 0..3 {
                    row.swap(left * 3 + c, right * 3 + c);
                }
                left += 1;
                right -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_swaps_columns() {
        // 3x1 image: red, green, blue
        let mut frame = Frame::new(0, 0.0, 3, 1, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
        frame.mirror();
        assert_eq!(frame.pixels, vec![0, 0, 255, 0, 255, 0, 255, 0, 0]);
    }

    #[test]
    fn test_mirror_twice_restores() {
        let pixels: Vec<u8> = (0..2 * 4 * 3).map(|v| v as u8).collect();
        let mut frame = Frame::new(0, 0.0, 4, 2, pixels.clone());
        frame.mirror();
        assert_ne!(frame.pixels, pixels);
        frame.mirror();
        assert_eq!(frame.pixels, pixels);
    }

    #[test]
    fn test_mirror_ignores_blank() {
        let mut frame = Frame::blank(0, 0.0, 640, 480);
        frame.mirror();
        assert!(frame.pixels.is_empty());
    }
}
