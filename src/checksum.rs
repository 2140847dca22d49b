use std::fmt;

/// The two checksum bytes `CK_A` and `CK_B` that trail every UBX frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Checksum {
    pub a: u8,
    pub b: u8,
}

impl Checksum {
    pub fn to_bytes(self) -> [u8; 2] {
        [self.a, self.b]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.a, self.b)
    }
}

/// Calculates the 8-bit Fletcher checksum of a UBX frame. The given slice must
/// be the checksummable region only, that is class, id, both length bytes and
/// the payload, in that order, excluding the sync chars and the checksum itself.
///
/// The empty slice is a valid argument and yields `00 00`.
pub fn checksum(data: &[u8]) -> Checksum {
    data.iter().fold(Checksum::default(), |acc, next| {
        let a = acc.a.wrapping_add(*next);
        Checksum {
            a,
            b: acc.b.wrapping_add(a),
        }
    })
}
