use crate::{
    args::Probe,
    echo::{echo_for, Echo},
    frame::Frame,
    message::{MessageError, MonVer},
    serial,
    transport::{write_frame, Frames, ReadError},
};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Short read timeout so echoing keeps up with the window.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[tracing::instrument(skip(opts), fields(port = %opts.serial, baud = opts.baud))]
pub fn probe(opts: &Probe) -> Result<()> {
    let mut serial = serial::open(&opts.serial, opts.baud, READ_TIMEOUT).map_err(|e| {
        ProbeError::Serial {
            source: e,
            port: opts.serial.clone(),
        }
    })?;
    let window = Duration::from_millis(opts.window_ms);

    if opts.decode {
        let versions = query_versions(&mut serial, window)?;
        println!("{}", versions);
    } else {
        let stdout = io::stdout();
        let mut echo = Echo::new(stdout.lock());
        echo_response(&mut serial, &mut echo, window)?;
        println!();
    }

    Ok(())
}

/// Sends UBX-MON-VER and echoes everything received in the given window,
/// including the NMEA sentences the receiver keeps sending.
pub fn echo_response<S, W>(port: &mut S, echo: &mut Echo<W>, window: Duration) -> Result<usize>
where
    S: Read + Write,
    W: Write,
{
    write_frame(port, &Frame::mon_ver())?;
    let received = echo_for(port, echo, window)?;
    if received == 0 {
        warn!(
            "Nothing received within {:?}, check wiring and baud rate",
            window
        );
    }
    Ok(received)
}

/// Sends UBX-MON-VER and waits for the response, ignoring other traffic.
pub fn query_versions<S: Read + Write>(port: &mut S, window: Duration) -> Result<MonVer> {
    let poll = Frame::mon_ver();
    write_frame(port, &poll)?;

    for frame in Frames::until(port, Instant::now() + window) {
        let frame = match frame {
            Ok(frame) => frame,
            // already logged, the response might still follow
            Err(ReadError::Frame(_)) => continue,
            Err(err) => return Err(err.into()),
        };

        if frame.class() == poll.class() && frame.id() == poll.id() {
            return Ok(MonVer::from_frame(&frame)?);
        }
        debug!("Ignoring {:?} while waiting for versions", frame);
    }

    Err(ProbeError::NoResponse { window })
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Could not open serial port connection to: {port}, due to error: {source}")]
    Serial {
        source: serialport::Error,
        port: String,
    },
    #[error("Serial port or output failed, error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Read(#[from] ReadError),
    #[error("Receiver sent a malformed version response: {0}")]
    Message(#[from] MessageError),
    #[error("No version response from receiver within {window:?}")]
    NoResponse { window: Duration },
}
