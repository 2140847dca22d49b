use crate::{
    args::{Interval, Rate, Reset, SendCommand},
    frame::{Frame, FrameError},
    hex::HexBytes,
    message::{class, describe, Ack, MessageDisplay},
    serial,
    transport::{write_frame, Frames, ReadError},
};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub type Result<T> = std::result::Result<T, SendError>;

/// What the receiver answered to a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Answer {
    /// Configuration command acknowledged with UBX-ACK-ACK.
    Ack(Ack),
    /// Message with the same class and id as the poll that was sent.
    Response(Frame),
}

/// Read timeout for the configuration commands, which have no option for it.
const CONFIGURE_READ_TIMEOUT: Duration = Duration::from_millis(1000);

#[tracing::instrument(skip(opts), fields(port = %opts.serial, baud = opts.baud))]
pub fn send(opts: &SendCommand) -> Result<()> {
    let payload = opts
        .payload
        .as_ref()
        .map(HexBytes::as_slice)
        .unwrap_or(&[]);
    let command = Frame::encode(opts.class.get(), opts.id.get(), payload)?;

    let mut serial = open(&opts.serial, opts.baud, Duration::from_millis(opts.timeout_ms))?;
    let answer = exchange(&mut serial, &command, Duration::from_millis(opts.wait_ms))?;
    print_answer(&answer);
    Ok(())
}

#[tracing::instrument(skip(opts), fields(port = %opts.serial, baud = opts.baud))]
pub fn reset(opts: &Reset) -> Result<()> {
    configure(
        &opts.serial,
        opts.baud,
        opts.wait_ms,
        &Frame::cfg_reset_to_defaults(),
    )
}

#[tracing::instrument(skip(opts), fields(port = %opts.serial, baud = opts.baud))]
pub fn rate(opts: &Rate) -> Result<()> {
    let command = Frame::cfg_msg_rate(opts.class.get(), opts.id.get(), opts.rate);
    configure(&opts.serial, opts.baud, opts.wait_ms, &command)
}

#[tracing::instrument(skip(opts), fields(port = %opts.serial, baud = opts.baud))]
pub fn interval(opts: &Interval) -> Result<()> {
    let command = Frame::cfg_rate(opts.interval_ms);
    configure(&opts.serial, opts.baud, opts.wait_ms, &command)
}

fn configure(port: &str, baud: u32, wait_ms: u64, command: &Frame) -> Result<()> {
    let mut serial = open(port, baud, CONFIGURE_READ_TIMEOUT)?;
    let answer = exchange(&mut serial, command, Duration::from_millis(wait_ms))?;
    print_answer(&answer);
    Ok(())
}

fn open(port: &str, baud: u32, timeout: Duration) -> Result<serial::Serial> {
    serial::open(port, baud, timeout).map_err(|e| SendError::Serial {
        source: e,
        port: port.to_string(),
    })
}

fn print_answer(answer: &Answer) {
    match answer {
        Answer::Ack(ack) => println!("{}", ack),
        Answer::Response(frame) => {
            println!("{:?}", frame);
            if let Some(description) = describe(frame) {
                println!("{}", description);
            }
        }
    }
}

/// Sends the command and waits for the answer, skipping unrelated traffic.
///
/// Configuration commands (class CFG) are answered with an acknowledgement,
/// anything else is treated as a poll that is answered with a message of the
/// same class and id. A UBX-ACK-NAK for the command is an error in both cases.
pub fn exchange<S: Read + Write>(port: &mut S, command: &Frame, wait: Duration) -> Result<Answer> {
    write_frame(port, command)?;
    let expects_ack = command.class() == class::CFG;

    for frame in Frames::until(port, Instant::now() + wait) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(ReadError::Frame(_)) => continue,
            Err(err) => return Err(err.into()),
        };

        if frame.class() == class::ACK {
            match Ack::from_frame(&frame) {
                Ok(ack) if ack.acknowledges(command) && ack.is_ack() => {
                    return Ok(Answer::Ack(ack));
                }
                Ok(ack) if ack.acknowledges(command) => return Err(SendError::Rejected(ack)),
                Ok(ack) => debug!("Ignoring {} while waiting for answer", ack),
                Err(err) => warn!("Ignoring malformed acknowledgement: {}", err),
            }
        } else if !expects_ack && frame.class() == command.class() && frame.id() == command.id() {
            return Ok(Answer::Response(frame));
        } else {
            debug!("Ignoring {:?} while waiting for answer", frame);
        }
    }

    Err(SendError::NoAnswer {
        message: MessageDisplay(command.class(), command.id()),
    })
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Could not build command: {0}")]
    Frame(#[from] FrameError),
    #[error("Could not open serial port connection to: {port}, due to error: {source}")]
    Serial {
        source: serialport::Error,
        port: String,
    },
    #[error("Failed to write to serial port, error: {0}")]
    SerialWrite(#[from] io::Error),
    #[error("{0}")]
    Read(#[from] ReadError),
    #[error("Receiver rejected the command: {0}")]
    Rejected(Ack),
    #[error("Receiver did not answer {message}")]
    NoAnswer { message: MessageDisplay },
}
