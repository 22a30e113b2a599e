use crate::commands::{format_serial, parse_status, Command, ControlRequest, REPORT_LENGTH};
use crate::error::OutletError;
use crate::transfer::RetryPolicy;
use log::debug;

// This is a basic SuperTrait which defines all the 'Parts' of an outlet device for use.
pub trait FullOutletDevice: ExecutableOutlet + OutletCommands {}

/// The host-side access layer for a single outlet device.
///
/// Implementations handle the bus itself. Claiming must be idempotent, and a
/// transfer on a released device is expected to claim it again implicitly.
pub trait ExecutableOutlet {
    fn claim(&mut self) -> Result<(), rusb::Error>;
    fn release(&mut self) -> Result<(), rusb::Error>;

    /// Perform a single control transfer, returning the number of bytes moved.
    fn control_transfer(
        &mut self,
        request: &ControlRequest,
        buffer: &mut [u8],
    ) -> Result<usize, rusb::Error>;

    fn get_descriptor(&mut self) -> Result<UsbData, rusb::Error>;

    fn vendor_id(&self) -> u16;
    fn product_id(&self) -> u16;
    fn bus_number(&self) -> u8;
    fn address(&self) -> u8;

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }
}

// These are the outlet primitives, built on top of control_transfer. They only refuse outlets
// the report can't encode, checking the number against the device's sockets is the session's job.
pub trait OutletCommands: ExecutableOutlet {
    fn perform_request(&mut self, command: Command) -> Result<Vec<u8>, OutletError> {
        let request = command.control_request()?;
        let mut report = command.report()?;

        debug!("Sending {:?}: {:x?}", command, report);
        let policy = self.retry_policy();
        let length = policy.run(|| self.control_transfer(&request, &mut report))?;

        let mut response = report.to_vec();
        response.truncate(length.min(REPORT_LENGTH));
        Ok(response)
    }

    fn get_serial(&mut self) -> Result<String, OutletError> {
        let result = self.perform_request(Command::GetSerial)?;
        Ok(format_serial(&result))
    }

    fn get_status(&mut self, outlet: u8) -> Result<bool, OutletError> {
        let result = self.perform_request(Command::GetStatus(outlet))?;
        parse_status(&result)
    }

    fn set_status(&mut self, outlet: u8, on: bool) -> Result<(), OutletError> {
        self.perform_request(Command::SetStatus(outlet, on))?;
        Ok(())
    }

    /// Powers the outlet, returning whether a follow-up status read confirms it.
    fn switch_on(&mut self, outlet: u8) -> Result<bool, OutletError> {
        if self.get_status(outlet)? {
            return Ok(true);
        }
        self.set_status(outlet, true)?;
        self.get_status(outlet)
    }

    fn switch_off(&mut self, outlet: u8) -> Result<bool, OutletError> {
        if !self.get_status(outlet)? {
            return Ok(true);
        }
        self.set_status(outlet, false)?;
        Ok(!self.get_status(outlet)?)
    }

    // The branch target checks the status again itself, so a toggle costs one extra read.
    fn toggle(&mut self, outlet: u8) -> Result<bool, OutletError> {
        if self.get_status(outlet)? {
            self.switch_off(outlet)
        } else {
            self.switch_on(outlet)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbData {
    pub(crate) vendor_id: u16,
    pub(crate) product_id: u16,
    pub(crate) device_manufacturer: Option<String>,
    pub(crate) product_name: Option<String>,
    pub(crate) bus_number: u8,
    pub(crate) address: u8,
}

impl UsbData {
    pub fn new(
        vendor_id: u16,
        product_id: u16,
        device_manufacturer: Option<String>,
        product_name: Option<String>,
        bus_number: u8,
        address: u8,
    ) -> Self {
        Self {
            vendor_id,
            product_id,
            device_manufacturer,
            product_name,
            bus_number,
            address,
        }
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }
    pub fn product_id(&self) -> u16 {
        self.product_id
    }
    pub fn device_manufacturer(&self) -> Option<String> {
        self.device_manufacturer.clone()
    }
    pub fn product_name(&self) -> Option<String> {
        self.product_name.clone()
    }
    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }
    pub fn address(&self) -> u8 {
        self.address
    }
}
