use crate::{
    args::Listen,
    echo::{echo_for, Echo},
    serial,
};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

pub type Result<T> = std::result::Result<T, ListenError>;

const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[tracing::instrument(skip(opts), fields(port = %opts.serial, baud = opts.baud))]
pub fn listen(opts: &Listen) -> Result<()> {
    let duration = duration(opts.duration_secs)?;
    let mut serial = serial::open(&opts.serial, opts.baud, READ_TIMEOUT).map_err(|e| {
        ListenError::Serial {
            source: e,
            port: opts.serial.clone(),
        }
    })?;

    let stdout = io::stdout();
    let mut echo = if opts.timestamps {
        Echo::with_timestamps(stdout.lock())
    } else {
        Echo::new(stdout.lock())
    };
    listen_to(&mut serial, &mut echo, duration)?;
    println!();
    Ok(())
}

fn listen_to<R: Read, W: Write>(port: &mut R, echo: &mut Echo<W>, duration: Duration) -> Result<usize> {
    let received = echo_for(port, echo, duration)?;
    if received == 0 {
        warn!(
            "Nothing received within {:?}, check wiring and baud rate",
            duration
        );
    }
    Ok(received)
}

fn duration(secs: f64) -> Result<Duration> {
    if !(secs.is_finite() && secs > 0.0 && secs < u64::MAX as f64) {
        return Err(ListenError::Duration { secs });
    }

    let duration = Duration::from_secs_f64(secs);
    // the end of listening has to be representable as a point in time
    match Instant::now().checked_add(duration) {
        Some(_) => Ok(duration),
        None => Err(ListenError::Duration { secs }),
    }
}

#[derive(Debug, Error)]
pub enum ListenError {
    #[error("Could not open serial port connection to: {port}, due to error: {source}")]
    Serial {
        source: serialport::Error,
        port: String,
    },
    #[error("Serial port or output failed, error: {0}")]
    Io(#[from] io::Error),
    #[error("Duration must be a positive number of seconds, got: {secs}")]
    Duration { secs: f64 },
}
