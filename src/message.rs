//! Known UBX messages: names for logging and decoding of the few responses
//! we act upon.

use crate::frame::Frame;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Message classes.
pub mod class {
    pub const NAV: u8 = 0x01;
    pub const ACK: u8 = 0x05;
    pub const CFG: u8 = 0x06;
    pub const MON: u8 = 0x0A;
    pub const TIM: u8 = 0x0D;
}

/// Message ids, prefixed with the class they belong to.
pub mod id {
    pub const ACK_NAK: u8 = 0x00;
    pub const ACK_ACK: u8 = 0x01;
    pub const CFG_PRT: u8 = 0x00;
    pub const CFG_MSG: u8 = 0x01;
    pub const CFG_RST: u8 = 0x04;
    pub const CFG_RATE: u8 = 0x08;
    pub const CFG_CFG: u8 = 0x09;
    pub const CFG_NAV5: u8 = 0x24;
    pub const CFG_GNSS: u8 = 0x3E;
    pub const MON_VER: u8 = 0x04;
    pub const MON_HW: u8 = 0x09;
    pub const NAV_POSLLH: u8 = 0x02;
    pub const NAV_STATUS: u8 = 0x03;
    pub const NAV_PVT: u8 = 0x07;
    pub const NAV_TIMEUTC: u8 = 0x21;
    pub const NAV_SAT: u8 = 0x35;
    pub const TIM_TP: u8 = 0x01;
}

lazy_static! {
    static ref NAMES: HashMap<(u8, u8), &'static str> = {
        let mut names = HashMap::new();
        names.insert((class::ACK, id::ACK_NAK), "ACK-NAK");
        names.insert((class::ACK, id::ACK_ACK), "ACK-ACK");
        names.insert((class::CFG, id::CFG_PRT), "CFG-PRT");
        names.insert((class::CFG, id::CFG_MSG), "CFG-MSG");
        names.insert((class::CFG, id::CFG_RST), "CFG-RST");
        names.insert((class::CFG, id::CFG_RATE), "CFG-RATE");
        names.insert((class::CFG, id::CFG_CFG), "CFG-CFG");
        names.insert((class::CFG, id::CFG_NAV5), "CFG-NAV5");
        names.insert((class::CFG, id::CFG_GNSS), "CFG-GNSS");
        names.insert((class::MON, id::MON_VER), "MON-VER");
        names.insert((class::MON, id::MON_HW), "MON-HW");
        names.insert((class::NAV, id::NAV_POSLLH), "NAV-POSLLH");
        names.insert((class::NAV, id::NAV_STATUS), "NAV-STATUS");
        names.insert((class::NAV, id::NAV_PVT), "NAV-PVT");
        names.insert((class::NAV, id::NAV_TIMEUTC), "NAV-TIMEUTC");
        names.insert((class::NAV, id::NAV_SAT), "NAV-SAT");
        names.insert((class::TIM, id::TIM_TP), "TIM-TP");
        names
    };
}

/// Looks up the name of a message, e.g. `MON-VER` for `0x0A 0x04`.
pub fn name(class: u8, id: u8) -> Option<&'static str> {
    NAMES.get(&(class, id)).copied()
}

/// Formats class and id with the name of the message, if known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageDisplay(pub u8, pub u8);

impl fmt::Display for MessageDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match name(self.0, self.1) {
            Some(name) => write!(f, "{} ({:02X} {:02X})", name, self.0, self.1),
            None => write!(f, "{:02X} {:02X}", self.0, self.1),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("Expected a different message, got {class:02X} {id:02X}")]
    UnexpectedMessage { class: u8, id: u8 },
    #[error("Message payload has unexpected length: {len}")]
    PayloadLength { len: usize },
}

/// Response of the receiver to a configuration command, UBX-ACK-ACK or
/// UBX-ACK-NAK, naming the class and id of the acknowledged command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
    Ack { class: u8, id: u8 },
    Nak { class: u8, id: u8 },
}

impl Ack {
    pub fn from_frame(frame: &Frame) -> Result<Self, MessageError> {
        if frame.class() != class::ACK {
            return Err(MessageError::UnexpectedMessage {
                class: frame.class(),
                id: frame.id(),
            });
        }

        let (acked_class, acked_id) = match frame.payload() {
            &[acked_class, acked_id] => (acked_class, acked_id),
            payload => {
                return Err(MessageError::PayloadLength { len: payload.len() });
            }
        };

        match frame.id() {
            id::ACK_ACK => Ok(Ack::Ack {
                class: acked_class,
                id: acked_id,
            }),
            id::ACK_NAK => Ok(Ack::Nak {
                class: acked_class,
                id: acked_id,
            }),
            other => Err(MessageError::UnexpectedMessage {
                class: class::ACK,
                id: other,
            }),
        }
    }

    /// Checks if this is the response to the given command.
    pub fn acknowledges(&self, command: &Frame) -> bool {
        let (class, id) = match *self {
            Ack::Ack { class, id } | Ack::Nak { class, id } => (class, id),
        };
        class == command.class() && id == command.id()
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Ack::Ack { .. })
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Ack::Ack { class, id } => write!(f, "ACK for {}", MessageDisplay(class, id)),
            Ack::Nak { class, id } => write!(f, "NAK for {}", MessageDisplay(class, id)),
        }
    }
}

const MON_VER_SW_LEN: usize = 30;
const MON_VER_HW_LEN: usize = 10;
const MON_VER_EXT_LEN: usize = 30;

/// Versions reported by the receiver in UBX-MON-VER.
///
/// Example from a BN-880 module: software `ROM CORE 3.01 (107888)`, hardware
/// `00080000`, extensions like `FWVER=SPG 3.01` and `PROTVER=18.00`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonVer {
    pub software: String,
    pub hardware: String,
    pub extensions: Vec<String>,
}

impl MonVer {
    pub fn from_frame(frame: &Frame) -> Result<Self, MessageError> {
        if frame.class() != class::MON || frame.id() != id::MON_VER {
            return Err(MessageError::UnexpectedMessage {
                class: frame.class(),
                id: frame.id(),
            });
        }

        let payload = frame.payload();
        let fixed_len = MON_VER_SW_LEN + MON_VER_HW_LEN;
        if payload.len() < fixed_len || (payload.len() - fixed_len) % MON_VER_EXT_LEN != 0 {
            return Err(MessageError::PayloadLength { len: payload.len() });
        }

        let (software, rest) = payload.split_at(MON_VER_SW_LEN);
        let (hardware, extensions) = rest.split_at(MON_VER_HW_LEN);
        Ok(MonVer {
            software: nul_terminated(software),
            hardware: nul_terminated(hardware),
            extensions: extensions
                .chunks(MON_VER_EXT_LEN)
                .map(nul_terminated)
                .collect(),
        })
    }
}

impl fmt::Display for MonVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "software: {}", self.software)?;
        write!(f, "hardware: {}", self.hardware)?;
        for extension in &self.extensions {
            write!(f, "\n{}", extension)?;
        }
        Ok(())
    }
}

/// Decodes the content of messages we understand for printing, `None` for
/// everything else.
pub fn describe(frame: &Frame) -> Option<String> {
    match (frame.class(), frame.id()) {
        (class::ACK, _) => Ack::from_frame(frame).ok().map(|ack| ack.to_string()),
        (class::MON, id::MON_VER) => MonVer::from_frame(frame).ok().map(|ver| ver.to_string()),
        _ => None,
    }
}

/// Fixed-size string fields are padded with NUL bytes.
fn nul_terminated(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim_end().to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    fn padded(text: &str, len: usize) -> Vec<u8> {
        let mut field = text.as_bytes().to_vec();
        field.resize(len, 0);
        field
    }

    #[test]
    fn known_names() {
        assert_eq!(name(0x0A, 0x04), Some("MON-VER"));
        assert_eq!(name(0x05, 0x01), Some("ACK-ACK"));
        assert_eq!(name(0x06, 0x09), Some("CFG-CFG"));
        assert_eq!(name(0x0A, 0xFF), None);
    }

    #[test]
    fn every_class_has_named_messages() {
        for &class in &[class::NAV, class::ACK, class::CFG, class::MON, class::TIM] {
            assert!(
                NAMES.keys().any(|&(named_class, _)| named_class == class),
                "No message names for class {:02X}",
                class
            );
        }
    }

    #[test]
    fn message_display() {
        assert_eq!(format!("{}", MessageDisplay(0x06, 0x01)), "CFG-MSG (06 01)");
        assert_eq!(format!("{}", MessageDisplay(0x66, 0x01)), "66 01");
    }

    #[test]
    fn ack_for_cfg_cfg() {
        let frame = Frame::decode_and_verify(&[
            0xB5, 0x62, 0x05, 0x01, 0x02, 0x00, 0x06, 0x09, 0x17, 0x40,
        ])
        .unwrap();
        let ack = Ack::from_frame(&frame).unwrap();
        assert_eq!(ack, Ack::Ack { class: 0x06, id: 0x09 });
        assert!(ack.is_ack());
        assert!(ack.acknowledges(&Frame::cfg_reset_to_defaults()));
        assert!(!ack.acknowledges(&Frame::mon_ver()));
        assert_eq!(format!("{}", ack), "ACK for CFG-CFG (06 09)");
    }

    #[test]
    fn nak_for_cfg_msg() {
        let frame = Frame::decode_and_verify(&[
            0xB5, 0x62, 0x05, 0x00, 0x02, 0x00, 0x06, 0x01, 0x0E, 0x33,
        ])
        .unwrap();
        let ack = Ack::from_frame(&frame).unwrap();
        assert_eq!(ack, Ack::Nak { class: 0x06, id: 0x01 });
        assert!(!ack.is_ack());
        assert!(ack.acknowledges(&Frame::cfg_msg_rate(0xF0, 0x00, 0)));
    }

    #[test]
    fn ack_with_wrong_payload_length() {
        let frame = Frame::encode(class::ACK, id::ACK_ACK, &[0x06]).unwrap();
        assert_eq!(
            Ack::from_frame(&frame).unwrap_err(),
            MessageError::PayloadLength { len: 1 }
        );
    }

    #[test]
    fn mon_ver_is_not_an_ack() {
        assert_eq!(
            Ack::from_frame(&Frame::mon_ver()).unwrap_err(),
            MessageError::UnexpectedMessage { class: 0x0A, id: 0x04 }
        );
    }

    #[test]
    fn mon_ver_response() {
        let mut payload = padded("ROM CORE 3.01 (107888)", 30);
        payload.extend(padded("00080000", 10));
        payload.extend(padded("FWVER=SPG 3.01", 30));
        payload.extend(padded("PROTVER=18.00", 30));
        let frame = Frame::encode(0x0A, 0x04, &payload).unwrap();

        let versions = MonVer::from_frame(&frame).unwrap();

        assert_eq!(versions.software, "ROM CORE 3.01 (107888)");
        assert_eq!(versions.hardware, "00080000");
        assert_eq!(versions.extensions, vec!["FWVER=SPG 3.01", "PROTVER=18.00"]);
        assert_eq!(
            format!("{}", versions),
            "software: ROM CORE 3.01 (107888)\nhardware: 00080000\nFWVER=SPG 3.01\nPROTVER=18.00"
        );
    }

    #[test]
    fn mon_ver_without_extensions() {
        let mut payload = padded("7.03 (45969)", 30);
        payload.extend(padded("00040007", 10));
        let frame = Frame::encode(0x0A, 0x04, &payload).unwrap();

        let versions = MonVer::from_frame(&frame).unwrap();

        assert!(versions.extensions.is_empty());
    }

    #[test]
    fn describe_known_and_unknown() {
        let ack = Frame::encode(class::ACK, id::ACK_NAK, &[0x06, 0x24]).unwrap();
        assert_eq!(describe(&ack).unwrap(), "NAK for CFG-NAV5 (06 24)");
        assert_eq!(describe(&Frame::poll(class::NAV, id::NAV_PVT)), None);
        assert_eq!(
            describe(&Frame::mon_ver()),
            None,
            "Expected a poll without versions not to be described"
        );
    }

    #[test]
    fn mon_ver_poll_has_no_versions() {
        assert_eq!(
            MonVer::from_frame(&Frame::mon_ver()).unwrap_err(),
            MessageError::PayloadLength { len: 0 }
        );
    }
}
