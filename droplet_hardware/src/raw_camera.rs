//! Camera reading raw GRAY8 frames from a byte stream.
//!
//! Pairs with any grabber that writes fixed-size frames to a pipe, e.g.
//! `ffmpeg -f v4l2 -i /dev/video0 -pix_fmt gray -f rawvideo -`.
//!
//! A live grabber keeps writing while nobody reads, so the frames at the head
//! of the pipe predate the last move. `with_skip_frames(n)` discards `n`
//! queued frames before every acquisition so the returned frame is fresh.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use droplet_traits::{Camera, Frame};
use ndarray::Array2;
use tracing::trace;

use crate::error::{HwError, Result};

pub struct RawStreamCamera<R: Read> {
    reader: R,
    width: usize,
    height: usize,
    skip_frames: usize,
    buf: Vec<u8>,
}

impl<R: Read> RawStreamCamera<R> {
    pub fn new(reader: R, width: usize, height: usize) -> Self {
        Self {
            reader,
            width,
            height,
            skip_frames: 0,
            buf: vec![0; width * height],
        }
    }

    /// Discard `n` backlog frames before each returned frame.
    pub fn with_skip_frames(mut self, n: usize) -> Self {
        self.skip_frames = n;
        self
    }

    fn fill(&mut self) -> Result<()> {
        match self.reader.read_exact(&mut self.buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(HwError::Camera("frame stream ended".into()))
            }
            Err(e) => Err(HwError::Io(e)),
        }
    }

    fn read_frame(&mut self) -> Result<Array2<u8>> {
        for _ in 0..self.skip_frames {
            self.fill()?;
        }
        self.fill()?;
        trace!(bytes = self.buf.len(), skipped = self.skip_frames, "raw frame read");
        Array2::from_shape_vec((self.height, self.width), self.buf.clone())
            .map_err(|e| HwError::Camera(e.to_string()))
    }
}

impl RawStreamCamera<BufReader<File>> {
    /// Open a file or FIFO producing raw frames.
    pub fn open(path: &Path, width: usize, height: usize) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), width, height))
    }
}

impl<R: Read> Camera for RawStreamCamera<R> {
    fn acquire_frame(&mut self) -> std::result::Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Frame::Gray(self.read_frame()?))
    }
}
