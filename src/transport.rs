//! Moving frames over a byte stream, usually a serial port connected to the
//! receiver.
//!
//! Receivers mix UBX frames with NMEA sentences on the same port, so reading
//! first hunts for the sync chars and discards everything before them. A frame
//! that fails verification is dropped and the next read resynchronizes on the
//! following sync chars.

use crate::frame::{Frame, FrameError, CHECKSUM_LEN, HEADER_LEN, SYNC};
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

pub type Result<T> = std::result::Result<T, ReadError>;

/// Writes the frame and flushes, so it is on its way to the receiver on return.
pub fn write_frame<W: Write>(port: &mut W, frame: &Frame) -> io::Result<()> {
    debug!("Sending {:?}", frame);
    port.write_all(frame.as_bytes())?;
    port.flush()
}

/// Reads the next frame, skipping any bytes before its sync chars.
///
/// When verification fails, everything after the sync chars goes back into the
/// input, so frames hidden in a body that was read with a corrupt length are
/// found by the next read.
fn read_frame<R: Read>(input: &mut Pushback<R>, deadline: Instant) -> Result<Frame> {
    let skipped = sync(input, deadline)?;
    if skipped > 0 {
        debug!("Skipped {} bytes before UBX sync chars", skipped);
    }

    let mut buf = SYNC.to_vec();
    buf.resize(HEADER_LEN, 0); // class, id, length
    read_full(input, &mut buf[SYNC.len()..], deadline)?;

    let payload_len = usize::from(u16::from_le_bytes([buf[4], buf[5]]));
    buf.resize(HEADER_LEN + payload_len + CHECKSUM_LEN, 0);
    read_full(input, &mut buf[HEADER_LEN..], deadline)?;

    match Frame::decode_and_verify(&buf) {
        Ok(frame) => {
            debug!("Received {:?}", frame);
            Ok(frame)
        }
        Err(err) => {
            input.unread(&buf[SYNC.len()..]);
            Err(err.into())
        }
    }
}

/// Fills the buffer, giving up when the deadline passes in between reads.
fn read_full<R: Read>(port: &mut R, buf: &mut [u8], deadline: Instant) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        if Instant::now() >= deadline {
            return Err(ReadError::Deadline { skipped: filled });
        }

        match port.read(&mut buf[filled..]) {
            Ok(0) => return Err(io::Error::from(ErrorKind::UnexpectedEof).into()),
            Ok(len) => filled += len,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Consumes bytes up to and including the sync chars and returns how many bytes
/// before the sync chars were discarded.
fn sync<R: Read>(port: &mut R, deadline: Instant) -> Result<usize> {
    let mut skipped = 0_usize;
    let mut previous = None;
    let mut byte = [0_u8; 1];
    loop {
        if Instant::now() >= deadline {
            return Err(ReadError::Deadline { skipped });
        }

        match port.read(&mut byte) {
            Ok(0) => return Err(io::Error::from(ErrorKind::UnexpectedEof).into()),
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }

        if previous == Some(SYNC[0]) && byte[0] == SYNC[1] {
            // the first sync char has been counted as skipped
            return Ok(skipped.saturating_sub(1));
        }
        previous = Some(byte[0]);
        skipped += 1;
    }
}

/// Port with bytes put back in front of it, which are read again before
/// anything new from the port.
struct Pushback<'a, R> {
    port: &'a mut R,
    pending: VecDeque<u8>,
}

impl<'a, R: Read> Pushback<'a, R> {
    fn new(port: &'a mut R) -> Self {
        Pushback {
            port,
            pending: VecDeque::new(),
        }
    }

    fn unread(&mut self, bytes: &[u8]) {
        for &byte in bytes.iter().rev() {
            self.pending.push_front(byte);
        }
    }
}

impl<'a, R: Read> Read for Pushback<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            return self.port.read(buf);
        }

        let len = buf.len().min(self.pending.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..len)) {
            *dst = src;
        }
        Ok(len)
    }
}

/// Iterates over the frames coming in on a port.
///
/// Ends when a read times out, that is, when the receiver has been quiet for the
/// read timeout of the port, or when the deadline has passed, even if the
/// receiver keeps sending, e.g. NMEA sentences. Corrupt
/// frames are yielded as errors and iteration continues after them, other
/// errors end the iteration after being yielded.
pub struct Frames<'a, R> {
    input: Pushback<'a, R>,
    deadline: Instant,
    exhausted: bool,
}

impl<'a, R: Read> Frames<'a, R> {
    pub fn until(port: &'a mut R, deadline: Instant) -> Self {
        Frames {
            input: Pushback::new(port),
            deadline,
            exhausted: false,
        }
    }
}

impl<'a, R: Read> Iterator for Frames<'a, R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        match read_frame(&mut self.input, self.deadline) {
            Ok(frame) => Some(Ok(frame)),
            Err(err) if err.is_timed_out() => {
                debug!("Stopped reading frames: {}", err);
                self.exhausted = true;
                None
            }
            Err(ReadError::Frame(err)) => {
                warn!("Discarding corrupt UBX frame: {}", err);
                Some(Err(ReadError::Frame(err)))
            }
            Err(err) => {
                self.exhausted = true;
                Some(Err(err))
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Could not read UBX frame from receiver due to I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Frame(#[from] FrameError),
    #[error("No complete UBX frame received in time, skipped {skipped} bytes")]
    Deadline { skipped: usize },
}

impl ReadError {
    pub fn is_timed_out(&self) -> bool {
        match self {
            ReadError::Io(err) if err.kind() == ErrorKind::TimedOut => true,
            ReadError::Deadline { .. } => true,
            _ => false,
        }
    }
}
