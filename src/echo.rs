//! Renders raw bytes from the receiver for a terminal.
//!
//! NMEA sentences come out as the text they are, anything else that shows up
//! in between, like UBX frames, is escaped as lower-case hex in brackets,
//! e.g. `[b5]`. NUL bytes and carriage returns are dropped and every line feed
//! ends a line, also when it is part of binary data.

use chrono::Local;
use std::io::{self, ErrorKind, Read, Write};
use std::time::{Duration, Instant};

pub struct Echo<W> {
    out: W,
    timestamps: bool,
    line_start: bool,
}

impl<W: Write> Echo<W> {
    pub fn new(out: W) -> Self {
        Echo {
            out,
            timestamps: false,
            line_start: true,
        }
    }

    /// Prefixes every line with the local time it started at, in milliseconds.
    pub fn with_timestamps(out: W) -> Self {
        Echo {
            timestamps: true,
            ..Echo::new(out)
        }
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        for &byte in bytes {
            self.byte(byte)?;
        }
        Ok(())
    }

    fn byte(&mut self, byte: u8) -> io::Result<()> {
        match byte {
            0x00 | b'\r' => Ok(()),
            b'\n' => {
                self.line_start = true;
                self.out.write_all(b"\n")
            }
            0x20..=0x7F => {
                self.start_line()?;
                self.out.write_all(&[byte])
            }
            other => {
                self.start_line()?;
                write!(self.out, "[{:02x}]", other)
            }
        }
    }

    fn start_line(&mut self) -> io::Result<()> {
        if self.line_start {
            self.line_start = false;
            if self.timestamps {
                write!(self.out, "{} ", Local::now().format("%H:%M:%S%.3f"))?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Echoes everything read from the port until the window has passed and
/// returns the number of bytes received. Read timeouts count as silence.
pub fn echo_for<R: Read, W: Write>(
    port: &mut R,
    echo: &mut Echo<W>,
    window: Duration,
) -> io::Result<usize> {
    let deadline = Instant::now() + window;
    let mut buf = [0_u8; 256];
    let mut received = 0;
    while Instant::now() < deadline {
        match port.read(&mut buf) {
            Ok(len) => {
                echo.bytes(&buf[..len])?;
                received += len;
            }
            Err(err) if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    echo.flush()?;
    Ok(received)
}
