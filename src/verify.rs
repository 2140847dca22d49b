use crate::args::Verify;
use crate::frame::{Frame, FrameError, HexDisplay};
use crate::message::{describe, MessageDisplay};
use std::io::{self, Write};
use thiserror::Error;
use tracing::warn;

pub type Result<T> = std::result::Result<T, VerifyError>;

pub fn verify(opts: &Verify) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    verify_to(&opts.bytes(), &mut out)
}

fn verify_to<W: Write>(bytes: &[u8], out: &mut W) -> Result<()> {
    let frame = Frame::decode_and_verify(bytes)?;
    if bytes.len() > frame.total_len() {
        warn!(
            "Ignoring {} bytes after the end of the frame",
            bytes.len() - frame.total_len()
        );
    }

    writeln!(out, "message:  {}", MessageDisplay(frame.class(), frame.id()))?;
    writeln!(out, "length:   {}", frame.payload().len())?;
    writeln!(out, "checksum: {} (ok)", frame.checksum())?;
    writeln!(out, "payload:  {}", HexDisplay(frame.payload()))?;
    if let Some(description) = describe(&frame) {
        writeln!(out, "{}", description)?;
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("Could not print frame: {0}")]
    Output(#[from] io::Error),
}
