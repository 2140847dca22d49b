use crate::args::Compose;
use crate::frame::{Frame, FrameError};
use crate::hex::HexBytes;
use crate::message::MessageDisplay;
use std::io::{self, Write};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComposeError>;

pub fn compose(opts: &Compose) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    compose_to(opts, &mut out)
}

fn compose_to<W: Write>(opts: &Compose, out: &mut W) -> Result<()> {
    let payload = opts
        .payload
        .as_ref()
        .map(HexBytes::as_slice)
        .unwrap_or(&[]);
    let frame = Frame::encode(opts.class.get(), opts.id.get(), payload)?;

    writeln!(out, "message:  {}", MessageDisplay(frame.class(), frame.id()))?;
    writeln!(out, "length:   {}", frame.payload().len())?;
    writeln!(out, "checksum: {}", frame.checksum())?;
    writeln!(out, "frame:    {}", frame)?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Could not compose frame: {0}")]
    Frame(#[from] FrameError),
    #[error("Could not print frame: {0}")]
    Output(#[from] io::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    fn compose_str(args: &[&str]) -> String {
        let opts: Compose = argh::FromArgs::from_args(&["compose"], args).unwrap();
        let mut out = Vec::new();
        compose_to(&opts, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn mon_ver() {
        assert_eq!(
            compose_str(&["0A", "04"]),
            "message:  MON-VER (0A 04)\n\
             length:   0\n\
             checksum: 0E 34\n\
             frame:    B5 62 0A 04 00 00 0E 34\n"
        );
    }

    #[test]
    fn cfg_cfg_with_payload() {
        let out = compose_str(&["06", "09", "-p", "FFFF0000 00000000 FFFF0000 01"]);
        assert!(out.contains("length:   13\n"), "Unexpected output: {}", out);
        assert!(out.contains("checksum: 19 98\n"), "Unexpected output: {}", out);
        assert!(out.ends_with(
            "frame:    B5 62 06 09 0D 00 FF FF 00 00 00 00 00 00 FF FF 00 00 01 19 98\n"
        ));
    }
}
