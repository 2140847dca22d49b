//! Types that generate and verify UBX frames.
//!
//! When we speak of a _frame_ in documentation, we mean one complete message of
//! the u-blox binary protocol as it travels over the wire: the two sync chars,
//! message class and id, the little-endian payload length, the payload itself
//! and the two Fletcher checksum bytes.

use crate::checksum::{checksum, Checksum};
use crate::message::{self, class, id};
use std::fmt;

use builder::Builder;
pub use parse::FrameError;

/// Sync chars that start every UBX frame.
pub const SYNC: [u8; 2] = [0xB5, 0x62];
/// Sync chars, class, id and the two length bytes.
pub const HEADER_LEN: usize = 6;
pub const CHECKSUM_LEN: usize = 2;
/// Size of a frame with an empty payload.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + CHECKSUM_LEN;
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

pub type Result<T> = std::result::Result<T, FrameError>;

/// A frame in the UBX protocol, binary, including sync chars and checksum. The
/// contained data is guaranteed to be a valid frame that can be sent to a
/// receiver, or that has been received from one and passed verification.
///
/// For example, [Frame::mon_ver()][Frame::mon_ver] produces the poll request
/// for UBX-MON-VER.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name)?,
            None => write!(f, "{:02X}-{:02X}", self.class(), self.id())?,
        }
        write!(
            f,
            "(len={len})[{payload}]<ck:{checksum}>",
            len = self.payload().len(),
            payload = HexDisplay(self.payload()),
            checksum = self.checksum()
        )
    }
}

/// The whole frame as upper-case hex, separated by spaces, e.g. `B5 62 0A 04 00 00 0E 34`.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", HexDisplay(self.as_bytes()))
    }
}

impl Frame {
    /// Builds a frame from class, id and payload, deriving length and checksum.
    ///
    /// # Errors
    /// Fails with [FrameError::InvalidPayloadLength] if the payload does not fit
    /// into the 16-bit length field, that is, if it is longer than 65535 bytes.
    pub fn encode(class: u8, id: u8, payload: &[u8]) -> Result<Frame> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::InvalidPayloadLength { len: payload.len() });
        }
        Ok(Frame::assemble(class, id, payload))
    }

    /// Checks sync chars, length and checksum of the given bytes and returns the
    /// frame at the start of the buffer if everything is in order.
    ///
    /// Bytes after the declared end of the frame are not part of the frame and
    /// are ignored, [Frame::total_len] tells how many bytes have been consumed.
    pub fn decode_and_verify(raw: &[u8]) -> Result<Frame> {
        parse::decode(raw)
    }

    /// Produces a poll request, that is, a frame with an empty payload.
    ///
    /// Receivers answer polls with a message of the same class and id, or with
    /// UBX-ACK-NAK if the message can not be polled.
    pub fn poll(class: u8, id: u8) -> Frame {
        Frame::assemble(class, id, &[])
    }

    /// Produces a UBX-MON-VER poll, querying software, hardware and protocol
    /// versions of the receiver.
    pub fn mon_ver() -> Frame {
        Frame::poll(class::MON, id::MON_VER)
    }

    /// Produces a UBX-CFG-CFG command that clears the configuration in
    /// battery-backed RAM and loads the defaults, which resets the receiver
    /// to factory settings until it is power cycled.
    ///
    /// This is `B5 62 06 09 0D 00 FF FF 00 00 00 00 00 00 FF FF 00 00 01 19 98`.
    pub fn cfg_reset_to_defaults() -> Frame {
        const ALL_SECTIONS: u32 = 0x0000_FFFF;
        const NO_SECTIONS: u32 = 0;
        const DEVICE_BBR: u8 = 0x01;
        Builder::new(class::CFG, id::CFG_CFG)
            .u32(ALL_SECTIONS) // clear
            .u32(NO_SECTIONS) // save
            .u32(ALL_SECTIONS) // load
            .u8(DEVICE_BBR)
            .finish()
    }

    /// Produces a UBX-CFG-MSG command setting the output rate of the message
    /// with the given class and id on the port the command is received on.
    ///
    /// A rate of zero disables the message, one outputs it on every navigation
    /// solution, two on every second solution, and so on.
    pub fn cfg_msg_rate(msg_class: u8, msg_id: u8, rate: u8) -> Frame {
        Builder::new(class::CFG, id::CFG_MSG)
            .u8(msg_class)
            .u8(msg_id)
            .u8(rate)
            .finish()
    }

    /// Produces a UBX-CFG-RATE command setting the interval between
    /// measurements, with one navigation solution per measurement, aligned to
    /// GPS time.
    pub fn cfg_rate(measurement_interval_ms: u16) -> Frame {
        const ONE_SOLUTION_PER_MEASUREMENT: u16 = 1;
        const GPS_TIME: u16 = 1;
        Builder::new(class::CFG, id::CFG_RATE)
            .u16(measurement_interval_ms)
            .u16(ONE_SOLUTION_PER_MEASUREMENT)
            .u16(GPS_TIME)
            .finish()
    }

    fn assemble(class: u8, id: u8, payload: &[u8]) -> Frame {
        debug_assert!(
            payload.len() <= MAX_PAYLOAD_LEN,
            "callers check the payload length before assembling"
        );
        let len = payload.len() as u16;

        let mut data = Vec::with_capacity(MIN_FRAME_LEN + payload.len());
        data.extend_from_slice(&SYNC);
        data.push(class);
        data.push(id);
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(payload);
        // everything after the sync chars is covered
        let checksum = checksum(&data[SYNC.len()..]);
        data.extend_from_slice(&checksum.to_bytes());
        Frame(data)
    }

    pub fn class(&self) -> u8 {
        self.0[2]
    }

    pub fn id(&self) -> u8 {
        self.0[3]
    }

    /// Human-readable name like `MON-VER`, if class and id are known.
    pub fn name(&self) -> Option<&'static str> {
        message::name(self.class(), self.id())
    }

    /// Gets the payload, that is, the part between length and checksum.
    pub fn payload(&self) -> &[u8] {
        &self.0[HEADER_LEN..self.0.len() - CHECKSUM_LEN]
    }

    pub fn checksum(&self) -> Checksum {
        let len = self.0.len();
        Checksum {
            a: self.0[len - 2],
            b: self.0[len - 1],
        }
    }

    /// Size of the frame on the wire, at least [MIN_FRAME_LEN].
    pub fn total_len(&self) -> usize {
        self.0.len()
    }

    /// Gets the frame as an immutable sequence of bytes, including sync chars
    /// and checksum, ready to be written to the receiver.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

/// Space separated upper-case hex.
pub struct HexDisplay<'a>(pub &'a [u8]);

impl<'a> fmt::Display for HexDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (idx, byte) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

mod builder {
    use super::Frame;

    /// Builds frames with payloads made of fixed-width fields, the way
    /// UBX message definitions describe them.
    pub struct Builder {
        class: u8,
        id: u8,
        payload: Vec<u8>,
    }

    impl Builder {
        pub fn new(class: u8, id: u8) -> Self {
            Builder {
                class,
                id,
                payload: Vec::new(),
            }
        }

        pub fn u8(mut self, byte: u8) -> Self {
            self.payload.push(byte);
            self
        }

        /// Appends a number in little-endian byte order, UBX type `U2`.
        pub fn u16(self, num: u16) -> Self {
            self.bytes(&num.to_le_bytes())
        }

        /// Appends a number in little-endian byte order, UBX type `U4`/`X4`.
        pub fn u32(self, num: u32) -> Self {
            self.bytes(&num.to_le_bytes())
        }

        fn bytes(mut self, bytes: &[u8]) -> Self {
            self.payload.extend_from_slice(bytes);
            self
        }

        /// Finishes fixed-size commands of this module, which are always far
        /// below the maximum payload length.
        pub(super) fn finish(self) -> Frame {
            Frame::assemble(self.class, self.id, &self.payload)
        }
    }

    #[cfg(test)]
    mod test {
        use super::*;

        #[test]
        fn little_endian_fields() {
            let frame = Builder::new(0x06, 0x08).u16(1000).u16(1).u16(0).finish();
            assert_eq!(frame.payload(), &[0xE8, 0x03, 0x01, 0x00, 0x00, 0x00]);
            assert_eq!(
                &frame.as_bytes()[4..6],
                &[0x06, 0x00],
                "Expected length of six bytes in little-endian"
            );
        }
    }
}

mod parse {
    use super::{Frame, Result, CHECKSUM_LEN, HEADER_LEN, MIN_FRAME_LEN, SYNC};
    use crate::checksum::{checksum, Checksum};
    use std::convert::TryFrom;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq, Eq, Clone)]
    pub enum FrameError {
        #[error("UBX payload of {len} bytes does not fit into the 16-bit length field")]
        InvalidPayloadLength { len: usize },
        #[error("Received bytes that do not start with UBX sync chars B5 62, found: {found:02X?}")]
        BadSync { found: Vec<u8> },
        #[error("Received truncated UBX frame, expected at least {expected} bytes, got {received}")]
        TruncatedFrame { expected: usize, received: usize },
        #[error("Received UBX frame with unexpected checksum {received}, expected {expected}")]
        ChecksumMismatch {
            expected: Checksum,
            received: Checksum,
        },
    }

    pub(super) fn decode(buf: &[u8]) -> Result<Frame> {
        // compare as much of the sync chars as we got, so short garbage
        // is reported as such rather than as truncated
        let sync_len = buf.len().min(SYNC.len());
        if buf[..sync_len] != SYNC[..sync_len] {
            return Err(FrameError::BadSync {
                found: buf[..sync_len].to_vec(),
            });
        }

        if buf.len() < HEADER_LEN {
            return Err(FrameError::TruncatedFrame {
                expected: MIN_FRAME_LEN,
                received: buf.len(),
            });
        }

        let payload_len = usize::from(u16::from_le_bytes([buf[4], buf[5]]));
        let total_len = MIN_FRAME_LEN + payload_len;
        if buf.len() < total_len {
            return Err(FrameError::TruncatedFrame {
                expected: total_len,
                received: buf.len(),
            });
        }

        let frame = &buf[..total_len];
        let checksum_start = total_len - CHECKSUM_LEN;
        let expected = checksum(&frame[SYNC.len()..checksum_start]);
        let received = Checksum {
            a: frame[checksum_start],
            b: frame[checksum_start + 1],
        };
        if expected != received {
            return Err(FrameError::ChecksumMismatch { expected, received });
        }

        Ok(Frame(frame.to_vec()))
    }

    impl<'a> TryFrom<&'a [u8]> for Frame {
        type Error = FrameError;

        fn try_from(buf: &'a [u8]) -> Result<Self> {
            decode(buf)
        }
    }

}
