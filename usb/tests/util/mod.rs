#![allow(dead_code)]

use sispm_usb::commands::ControlRequest;
use sispm_usb::rusb;
use sispm_usb::device::base::{ExecutableOutlet, FullOutletDevice, OutletCommands, UsbData};
use sispm_usb::devices::VID_GEMBIRD;
use sispm_usb::transfer::RetryPolicy;
use std::collections::VecDeque;
use std::time::Duration;

pub const SERIAL: [u8; 6] = [0x1a, 0x02, 0xff, 0x00, 0x0b, 0x9c];

/// A transfer as seen on the wire by the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub report: Vec<u8>,
}

impl Transfer {
    pub fn is_status_read(&self) -> bool {
        self.request == 0x01 && self.value != 0x0301
    }

    pub fn is_write(&self) -> bool {
        self.request == 0x09
    }
}

/// In-memory outlet. Socket state lives in `states`, indexed by outlet number.
pub struct MockOutlet {
    pub product_id: u16,
    pub serial: [u8; 6],
    pub states: [bool; 5],
    /// Outlets which accept a write but never change state.
    pub stuck: Vec<u8>,
    /// Errors returned by the next transfers, in order.
    pub failures: VecDeque<rusb::Error>,
    pub fail_release: bool,

    pub attempts: usize,
    pub transfers: Vec<Transfer>,
    pub claims: usize,
    pub releases: usize,
    pub claimed: bool,
}

impl MockOutlet {
    pub fn new(product_id: u16) -> Self {
        Self {
            product_id,
            serial: SERIAL,
            states: [false; 5],
            stuck: vec![],
            failures: VecDeque::new(),
            fail_release: false,
            attempts: 0,
            transfers: vec![],
            claims: 0,
            releases: 0,
            claimed: false,
        }
    }

    pub fn with_states(mut self, states: &[(u8, bool)]) -> Self {
        for (outlet, state) in states {
            self.states[*outlet as usize] = *state;
        }
        self
    }

    pub fn with_serial(mut self, serial: [u8; 6]) -> Self {
        self.serial = serial;
        self
    }

    pub fn fail_next(&mut self, errors: &[rusb::Error]) {
        self.failures.extend(errors.iter().copied());
    }

    pub fn status_reads(&self) -> usize {
        self.transfers.iter().filter(|t| t.is_status_read()).count()
    }

    pub fn writes(&self) -> usize {
        self.transfers.iter().filter(|t| t.is_write()).count()
    }
}

impl ExecutableOutlet for MockOutlet {
    fn claim(&mut self) -> Result<(), rusb::Error> {
        if !self.claimed {
            self.claims += 1;
            self.claimed = true;
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), rusb::Error> {
        self.releases += 1;
        self.claimed = false;
        if self.fail_release {
            return Err(rusb::Error::NoDevice);
        }
        Ok(())
    }

    fn control_transfer(
        &mut self,
        request: &ControlRequest,
        buffer: &mut [u8],
    ) -> Result<usize, rusb::Error> {
        self.attempts += 1;
        self.claim()?;
        if let Some(error) = self.failures.pop_front() {
            return Err(error);
        }

        self.transfers.push(Transfer {
            request_type: request.request_type,
            request: request.request,
            value: request.value,
            report: buffer.to_vec(),
        });

        let report_id = (request.value & 0xff) as u8;
        match (request.request, report_id) {
            (0x01, 1) => buffer.copy_from_slice(&self.serial),
            (0x01, id) => {
                buffer[1] = if self.states[(id / 3) as usize] { 0x03 } else { 0x00 };
            }
            (0x09, id) => {
                let outlet = id / 3;
                if !self.stuck.contains(&outlet) {
                    self.states[outlet as usize] = buffer[1] != 0;
                }
            }
            _ => return Err(rusb::Error::NotSupported),
        }
        Ok(buffer.len())
    }

    fn get_descriptor(&mut self) -> Result<UsbData, rusb::Error> {
        Ok(UsbData::new(
            VID_GEMBIRD,
            self.product_id,
            Some("Gembird".to_string()),
            Some("Silver Shield".to_string()),
            self.bus_number(),
            self.address(),
        ))
    }

    fn vendor_id(&self) -> u16 {
        VID_GEMBIRD
    }

    fn product_id(&self) -> u16 {
        self.product_id
    }

    fn bus_number(&self) -> u8 {
        1
    }

    fn address(&self) -> u8 {
        4
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: 5,
            delay: Duration::ZERO,
        }
    }
}

impl OutletCommands for MockOutlet {}
impl FullOutletDevice for MockOutlet {}
