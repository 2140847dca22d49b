use crate::hex::{Byte, HexBytes};
use argh::FromArgs;
use serde::Deserialize;
use std::path::PathBuf;

/// Talk UBX to u-blox GNSS receivers over serial ports, or compose and verify
/// UBX frames offline.
#[derive(FromArgs)]
pub struct TopLevel {
    /// log sent and received frames and other details to stderr.
    #[argh(switch, short = 'v')]
    pub verbose: bool,
    #[argh(subcommand)]
    pub invocation: Invocation,
}

/// Inner top-level command.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand)]
#[serde(rename_all = "snake_case")]
pub enum Invocation {
    #[serde(skip)]
    Run(Run),
    List(List),
    Probe(Probe),
    Send(SendCommand),
    Reset(Reset),
    Rate(Rate),
    Interval(Interval),
    Listen(Listen),
    Compose(Compose),
    Verify(Verify),
}

/// Take run parameters from a specified YAML configuration file.
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
pub struct Run {
    #[argh(positional)]
    pub config: PathBuf,
}

/// List available serial ports.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "list")]
pub struct List {}

/// Send UBX-MON-VER to a receiver and echo whatever comes back for a while.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "probe")]
pub struct Probe {
    /// serial port to use, e.g. /dev/ttyUSB0 on Linux, or COM5 on Windows.
    #[argh(option, short = 's')]
    pub serial: String,
    /// baud rate of the receiver, 9600 by default.
    #[argh(option, short = 'b', default = "crate::serial::DEFAULT_BAUD")]
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// how long to echo the response, in milliseconds.
    #[argh(option, short = 'w', default = "2000")]
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// decode the UBX-MON-VER response instead of echoing raw bytes.
    #[argh(switch)]
    #[serde(default)]
    pub decode: bool,
}

/// Send a UBX command and wait for the acknowledgement or the response.
///
/// Commands of class CFG (06) are answered with ACK-ACK or ACK-NAK, all
/// others are expected to be polls answered with a message of the same class
/// and id.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "send")]
pub struct SendCommand {
    /// message class in hex, e.g. 06 or 0x06.
    #[argh(positional)]
    pub class: Byte,
    /// message id in hex, e.g. 01 or 0x01.
    #[argh(positional)]
    pub id: Byte,
    /// payload in hex, e.g. "F0 00 00", empty by default.
    #[argh(option, short = 'p')]
    #[serde(default)]
    pub payload: Option<HexBytes>,
    /// serial port to use, e.g. /dev/ttyUSB0 on Linux, or COM5 on Windows.
    #[argh(option, short = 's')]
    pub serial: String,
    /// baud rate of the receiver, 9600 by default.
    #[argh(option, short = 'b', default = "crate::serial::DEFAULT_BAUD")]
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// how long the receiver may stay silent before giving up, in milliseconds.
    #[argh(option, short = 't', default = "1000")]
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// how long to wait for the answer in total, in milliseconds.
    #[argh(option, short = 'w', default = "3000")]
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

/// Restore factory settings with UBX-CFG-CFG, lasting until the receiver is
/// power cycled.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "reset")]
pub struct Reset {
    /// serial port to use, e.g. /dev/ttyUSB0 on Linux, or COM5 on Windows.
    #[argh(option, short = 's')]
    pub serial: String,
    /// baud rate of the receiver, 9600 by default.
    #[argh(option, short = 'b', default = "crate::serial::DEFAULT_BAUD")]
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// how long to wait for the acknowledgement, in milliseconds.
    #[argh(option, short = 'w', default = "3000")]
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

/// Set how often the receiver outputs a message with UBX-CFG-MSG, e.g.
/// `rate F0 00 0` to turn off $GxGGA sentences.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "rate")]
pub struct Rate {
    /// class of the message to configure, in hex, e.g. F0 for NMEA.
    #[argh(positional)]
    pub class: Byte,
    /// id of the message to configure, in hex.
    #[argh(positional)]
    pub id: Byte,
    /// output the message on every n-th navigation solution, 0 turns it off.
    #[argh(positional)]
    pub rate: u8,
    /// serial port to use, e.g. /dev/ttyUSB0 on Linux, or COM5 on Windows.
    #[argh(option, short = 's')]
    pub serial: String,
    /// baud rate of the receiver, 9600 by default.
    #[argh(option, short = 'b', default = "crate::serial::DEFAULT_BAUD")]
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// how long to wait for the acknowledgement, in milliseconds.
    #[argh(option, short = 'w', default = "3000")]
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

/// Set the interval between navigation solutions with UBX-CFG-RATE.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "interval")]
pub struct Interval {
    /// time between measurements in milliseconds, e.g. 200 for 5 Hz.
    #[argh(positional)]
    pub interval_ms: u16,
    /// serial port to use, e.g. /dev/ttyUSB0 on Linux, or COM5 on Windows.
    #[argh(option, short = 's')]
    pub serial: String,
    /// baud rate of the receiver, 9600 by default.
    #[argh(option, short = 'b', default = "crate::serial::DEFAULT_BAUD")]
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// how long to wait for the acknowledgement, in milliseconds.
    #[argh(option, short = 'w', default = "3000")]
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

/// Echo everything the receiver sends, NMEA sentences and binary alike.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "listen")]
pub struct Listen {
    /// serial port to use, e.g. /dev/ttyUSB0 on Linux, or COM5 on Windows.
    #[argh(option, short = 's')]
    pub serial: String,
    /// baud rate of the receiver, 9600 by default.
    #[argh(option, short = 'b', default = "crate::serial::DEFAULT_BAUD")]
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// how long to listen, in seconds.
    #[argh(option, short = 'd', default = "5.0")]
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f64,
    /// prefix each line with the local time it was received at.
    #[argh(switch)]
    #[serde(default)]
    pub timestamps: bool,
}

/// Print a UBX frame with its checksum, without sending it anywhere.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "compose")]
pub struct Compose {
    /// message class in hex, e.g. 0A or 0x0A.
    #[argh(positional)]
    pub class: Byte,
    /// message id in hex, e.g. 04 or 0x04.
    #[argh(positional)]
    pub id: Byte,
    /// payload in hex, e.g. "FF FF 00 00", empty by default.
    #[argh(option, short = 'p')]
    #[serde(default)]
    pub payload: Option<HexBytes>,
}

/// Verify sync chars, length and checksum of a UBX frame given in hex.
#[derive(FromArgs, Deserialize)]
#[argh(subcommand, name = "verify")]
pub struct Verify {
    /// bytes of the frame in hex, e.g. B5 62 0A 04 00 00 0E 34.
    #[argh(positional)]
    pub frame: Vec<HexBytes>,
}

impl Verify {
    /// All positional arguments joined into one byte sequence.
    pub fn bytes(&self) -> Vec<u8> {
        self.frame
            .iter()
            .flat_map(|bytes| bytes.as_slice().iter().copied())
            .collect()
    }
}

fn default_baud() -> u32 {
    crate::serial::DEFAULT_BAUD
}

fn default_window_ms() -> u64 {
    2000
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_wait_ms() -> u64 {
    3000
}

fn default_duration_secs() -> f64 {
    5.0
}
