use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::time::Duration;

/// Shorter type alias for handles to serial ports.
///
/// Functions that talk to the receiver are generic over `Read + Write` instead,
/// so tests can hand them a [mock::MockSerial].
pub type Serial = Box<dyn SerialPort>;

/// Baud rate u-blox receivers use for UART1 in factory settings.
pub const DEFAULT_BAUD: u32 = 9600;

/// Opens a connection to a receiver with 8 data bits, no parity and one
/// stop bit. Reads that see no data within the given timeout fail with
/// [std::io::ErrorKind::TimedOut].
pub fn open(port: &str, baud: u32, timeout: Duration) -> serialport::Result<Serial> {
    serialport::new(port, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(timeout)
        .open()
}

#[cfg(test)]
pub mod mock {
    use std::{
        io::{Error, ErrorKind, Read, Result, Write},
        mem::replace,
    };

    /// Replays planned reads and timeouts, and records everything written.
    ///
    /// When all planned reads are used up, every further read times out,
    /// like a receiver that went quiet.
    pub struct MockSerial {
        read_results: Vec<ReadResult>,
        written: Vec<u8>,
    }

    impl MockSerial {
        pub fn builder() -> Builder {
            Builder {
                read_results: vec![],
            }
        }

        /// Everything written to the mock so far.
        pub fn written(&self) -> &[u8] {
            &self.written[..]
        }
    }

    impl Read for MockSerial {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            if self.read_results.is_empty() {
                return Err(Error::from(ErrorKind::TimedOut));
            }

            match self.read_results[0] {
                ReadResult::Timeout => {
                    self.read_results.remove(0);
                    Err(Error::from(ErrorKind::TimedOut))
                }
                ReadResult::Data(ref mut first) => {
                    let first = if first.len() <= buf.len() {
                        // whole first vector fits into buf
                        self.read_results.remove(0)
                    } else {
                        // hand out what fits and enqueue the rest for later
                        let tail = first.split_off(buf.len());
                        replace(&mut self.read_results[0], ReadResult::Data(tail))
                    };

                    let first = match first {
                        ReadResult::Data(data) => data,
                        ReadResult::Timeout => unreachable!(),
                    };

                    buf[..first.len()].copy_from_slice(&first);
                    Ok(first.len())
                }
            }
        }
    }

    impl Write for MockSerial {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Clone)]
    enum ReadResult {
        Data(Vec<u8>),
        Timeout,
    }

    pub struct Builder {
        read_results: Vec<ReadResult>,
    }

    impl Builder {
        /// Plans that the next read attempt will read exactly the given data.
        ///
        /// If it does not fill the buffer completely, the rest will be read later.
        pub fn receive(&mut self, response: &[u8]) -> &mut Self {
            self.read_results.push(ReadResult::Data(response.to_vec()));
            self
        }

        /// Plans the next read attempt to time out.
        pub fn time_out(&mut self) -> &mut Self {
            self.read_results.push(ReadResult::Timeout);
            self
        }

        /// Finish the build.
        ///
        /// Can safely be called multiple times.
        pub fn build(&self) -> MockSerial {
            MockSerial {
                read_results: self.read_results.clone(),
                written: vec![],
            }
        }
    }

    #[cfg(test)]
    mod test {
        use super::*;

        #[test]
        fn split_reads() {
            let mut serial = MockSerial::builder().receive(b"$GN").time_out().build();
            let mut buf = [0_u8; 2];
            assert_eq!(serial.read(&mut buf).unwrap(), 2);
            assert_eq!(&buf, b"$G");
            assert_eq!(serial.read(&mut buf).unwrap(), 1);
            assert_eq!(buf[0], b'N');
            assert_eq!(
                serial.read(&mut buf).unwrap_err().kind(),
                ErrorKind::TimedOut
            );
            assert_eq!(
                serial.read(&mut buf).unwrap_err().kind(),
                ErrorKind::TimedOut,
                "Expected exhausted mock to keep timing out"
            );
        }

        #[test]
        fn records_writes() {
            let mut serial = MockSerial::builder().build();
            serial.write_all(&[0xB5, 0x62]).unwrap();
            serial.write_all(&[0x0A]).unwrap();
            assert_eq!(serial.written(), &[0xB5, 0x62, 0x0A]);
        }
    }
}
