use crate::error::OutletError;
use rusb::{Direction, Recipient, RequestType};
use std::time::Duration;

/// Every request and reply on the outlet's control pipe is a 6 byte report.
pub const REPORT_LENGTH: usize = 6;

pub const TRANSFER_TIMEOUT: Duration = Duration::from_millis(500);

const REQUEST_GET_REPORT: u8 = 0x01;
const REQUEST_SET_REPORT: u8 = 0x09;

// Feature report, in the high byte of wValue
const REPORT_TYPE_FEATURE: u16 = 0x03;

const SERIAL_REPORT_ID: u8 = 1;
const SWITCH_ON: u8 = 0x03;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    GetSerial,
    GetStatus(u8),
    SetStatus(u8, bool),
}

/// The five classic control transfer fields, plus the timeout to apply.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ControlRequest {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub timeout: Duration,
}

impl ControlRequest {
    pub fn direction(&self) -> Direction {
        if self.request_type & 0x80 == 0 {
            Direction::Out
        } else {
            Direction::In
        }
    }
}

impl Command {
    // Socket n lives at report n * 3, which has to fit the report's first byte.
    fn report_id(&self) -> Result<u8, OutletError> {
        match self {
            Command::GetSerial => Ok(SERIAL_REPORT_ID),
            Command::GetStatus(outlet) | Command::SetStatus(outlet, _) => outlet
                .checked_mul(3)
                .ok_or_else(|| OutletError::IllegalOutlet(outlet.to_string())),
        }
    }

    pub fn request_type(&self) -> u8 {
        match self {
            Command::GetSerial | Command::GetStatus(_) => {
                rusb::request_type(Direction::In, RequestType::Class, Recipient::Interface)
            }
            Command::SetStatus(_, _) => {
                rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface)
            }
        }
    }

    pub fn request(&self) -> u8 {
        match self {
            Command::GetSerial | Command::GetStatus(_) => REQUEST_GET_REPORT,
            Command::SetStatus(_, _) => REQUEST_SET_REPORT,
        }
    }

    pub fn value(&self) -> Result<u16, OutletError> {
        Ok((REPORT_TYPE_FEATURE << 8) | u16::from(self.report_id()?))
    }

    pub fn control_request(&self) -> Result<ControlRequest, OutletError> {
        Ok(ControlRequest {
            request_type: self.request_type(),
            request: self.request(),
            value: self.value()?,
            index: 0,
            timeout: TRANSFER_TIMEOUT,
        })
    }

    /// The report buffer sent with (or read back into by) this command.
    pub fn report(&self) -> Result<[u8; REPORT_LENGTH], OutletError> {
        let mut report = [0; REPORT_LENGTH];
        match self {
            Command::GetSerial => {}
            Command::GetStatus(_) => {
                report[0] = self.report_id()?;
            }
            Command::SetStatus(_, on) => {
                report[0] = self.report_id()?;
                if *on {
                    report[1] = SWITCH_ON;
                }
            }
        }
        Ok(report)
    }
}

pub fn format_serial(serial: &[u8]) -> String {
    serial
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(":")
}

/// An outlet is powered when the second byte of its status report is set.
pub fn parse_status(report: &[u8]) -> Result<bool, OutletError> {
    match report.get(1) {
        Some(state) => Ok(*state != 0),
        None => Err(OutletError::MalformedResponse {
            expected: REPORT_LENGTH,
            received: report.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_request_fields() {
        let request = Command::GetSerial.control_request().unwrap();
        assert_eq!(request.request_type, 0xa1);
        assert_eq!(request.request, 0x01);
        assert_eq!(request.value, 0x0301);
        assert_eq!(request.index, 0);
        assert_eq!(request.timeout, Duration::from_millis(500));
        assert_eq!(request.direction(), Direction::In);
        assert_eq!(Command::GetSerial.report().unwrap(), [0; 6]);
    }

    #[test]
    fn status_request_fields() {
        let command = Command::GetStatus(2);
        let request = command.control_request().unwrap();
        assert_eq!(request.request_type, 0x21 | 0x80);
        assert_eq!(request.request, 0x01);
        assert_eq!(request.value, 0x0306);
        assert_eq!(command.report().unwrap(), [6, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn switch_on_request_fields() {
        let command = Command::SetStatus(4, true);
        let request = command.control_request().unwrap();
        assert_eq!(request.request_type, 0x21);
        assert_eq!(request.request, 0x09);
        assert_eq!(request.value, 0x030c);
        assert_eq!(request.direction(), Direction::Out);
        assert_eq!(command.report().unwrap(), [12, 0x03, 0, 0, 0, 0]);
    }

    #[test]
    fn switch_off_leaves_state_byte_clear() {
        assert_eq!(Command::SetStatus(1, false).report().unwrap(), [3, 0, 0, 0, 0, 0]);
        assert_eq!(Command::SetStatus(1, false).value().unwrap(), 0x0303);
    }

    #[test]
    fn highest_encodable_outlet() {
        assert_eq!(Command::GetStatus(85).value().unwrap(), 0x03ff);
        assert_eq!(Command::GetStatus(85).report().unwrap()[0], 0xff);
    }

    #[test]
    fn outlet_past_the_report_byte_is_illegal() {
        for command in [Command::GetStatus(86), Command::SetStatus(100, true)] {
            assert!(matches!(command.value(), Err(OutletError::IllegalOutlet(_))));
            assert!(matches!(command.report(), Err(OutletError::IllegalOutlet(_))));
            assert!(matches!(
                command.control_request(),
                Err(OutletError::IllegalOutlet(_))
            ));
        }
        assert!(matches!(
            Command::GetStatus(100).value(),
            Err(OutletError::IllegalOutlet(ref value)) if value == "100"
        ));
    }

    #[test]
    fn serial_formatting() {
        assert_eq!(
            format_serial(&[0x1a, 0x02, 0xff, 0x00, 0x0b, 0x9c]),
            "1a:02:ff:00:0b:9c"
        );
        assert_eq!(format_serial(&[]), "");
    }

    #[test]
    fn status_parsing() {
        assert!(parse_status(&[3, 0x03, 0, 0, 0, 0]).unwrap());
        assert!(parse_status(&[3, 0x01, 0, 0, 0, 0]).unwrap());
        assert!(!parse_status(&[3, 0x00, 0, 0, 0, 0]).unwrap());
    }

    #[test]
    fn short_status_report_is_malformed() {
        let result = parse_status(&[3]);
        assert!(matches!(
            result,
            Err(OutletError::MalformedResponse {
                expected: 6,
                received: 1
            })
        ));
    }
}
