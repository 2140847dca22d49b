use crate::args::List;
use serialport::{SerialPortInfo, SerialPortType};
use thiserror::Error;

/// USB vendor id of u-blox, used by receivers with native USB.
const UBLOX_VID: u16 = 0x1546;

pub fn list(_list: List) -> Result<(), ListError> {
    let ports = serialport::available_ports()?;
    for p in ports {
        println!("{}", describe_port(&p));
    }
    Ok(())
}

fn describe_port(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => {
            let mut description = format!("{} usb {:04x}:{:04x}", port.port_name, usb.vid, usb.pid);
            if let Some(product) = &usb.product {
                description.push(' ');
                description.push_str(product);
            }
            if usb.vid == UBLOX_VID {
                description.push_str(" (u-blox)");
            }
            description
        }
        SerialPortType::BluetoothPort => format!("{} bluetooth", port.port_name),
        SerialPortType::PciPort => format!("{} pci", port.port_name),
        SerialPortType::Unknown => port.port_name.clone(),
    }
}

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Could not list serial ports: {0}")]
    Serial(#[from] serialport::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(vid: u16, pid: u16, product: Option<&str>) -> SerialPortInfo {
        SerialPortInfo {
            port_name: "/dev/ttyACM0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid,
                pid,
                serial_number: None,
                manufacturer: None,
                product: product.map(String::from),
            }),
        }
    }

    #[test]
    fn ublox_receiver() {
        assert_eq!(
            describe_port(&usb(0x1546, 0x01a8, Some("u-blox GNSS receiver"))),
            "/dev/ttyACM0 usb 1546:01a8 u-blox GNSS receiver (u-blox)"
        );
    }

    #[test]
    fn usb_serial_adapter() {
        assert_eq!(
            describe_port(&usb(0x10c4, 0xea60, None)),
            "/dev/ttyACM0 usb 10c4:ea60"
        );
    }

    #[test]
    fn builtin_port() {
        let port = SerialPortInfo {
            port_name: "COM1".to_string(),
            port_type: SerialPortType::Unknown,
        };
        assert_eq!(describe_port(&port), "COM1");
    }
}
