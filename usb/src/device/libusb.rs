use crate::commands::ControlRequest;
use crate::device::base::{ExecutableOutlet, FullOutletDevice, OutletCommands, UsbData};
use crate::devices::VID_GEMBIRD;
use log::{debug, info};
use rusb::{Device, DeviceDescriptor, DeviceHandle, Direction, GlobalContext};
use std::fmt;
use std::time::Duration;

const STRING_TIMEOUT: Duration = Duration::from_millis(100);

/// An outlet reached through libusb.
///
/// The handle is only held while the device is claimed, releasing it closes the
/// handle so other processes can talk to the outlet in the meantime.
pub struct LibUsbOutlet {
    device: Device<GlobalContext>,
    descriptor: DeviceDescriptor,
    handle: Option<DeviceHandle<GlobalContext>>,
    interface_claimed: bool,
}

impl LibUsbOutlet {
    pub(crate) fn new(device: Device<GlobalContext>, descriptor: DeviceDescriptor) -> Self {
        Self {
            device,
            descriptor,
            handle: None,
            interface_claimed: false,
        }
    }

    fn open_handle(&mut self) -> Result<&DeviceHandle<GlobalContext>, rusb::Error> {
        self.claim()?;
        self.handle.as_ref().ok_or(rusb::Error::NoDevice)
    }
}

fn read_string(
    handle: &DeviceHandle<GlobalContext>,
    index: Option<u8>,
) -> Result<Option<String>, rusb::Error> {
    let Some(index) = index else {
        return Ok(None);
    };

    let languages = handle.read_languages(STRING_TIMEOUT)?;
    let Some(language) = languages.first().copied() else {
        return Ok(None);
    };

    handle
        .read_string_descriptor(language, index, STRING_TIMEOUT)
        .map(Some)
}

impl ExecutableOutlet for LibUsbOutlet {
    fn claim(&mut self) -> Result<(), rusb::Error> {
        if self.handle.is_some() {
            return Ok(());
        }

        let mut handle = self.device.open()?;
        debug!("Opened outlet device at {:?}", self.device);

        // Not every platform can detach drivers, carry on regardless.
        let _ = handle.set_auto_detach_kernel_driver(true);
        debug!(
            "Set Active Config: {:?}",
            handle.set_active_configuration(1)
        );
        self.interface_claimed = handle.claim_interface(0).is_ok();
        debug!("Interface Claimed: {}", self.interface_claimed);

        self.handle = Some(handle);
        Ok(())
    }

    fn release(&mut self) -> Result<(), rusb::Error> {
        if let Some(mut handle) = self.handle.take() {
            debug!("Releasing outlet device at {:?}", self.device);
            if self.interface_claimed {
                self.interface_claimed = false;
                handle.release_interface(0)?;
            }
        }
        Ok(())
    }

    fn control_transfer(
        &mut self,
        request: &ControlRequest,
        buffer: &mut [u8],
    ) -> Result<usize, rusb::Error> {
        let handle = self.open_handle()?;
        match request.direction() {
            Direction::In => handle.read_control(
                request.request_type,
                request.request,
                request.value,
                request.index,
                buffer,
                request.timeout,
            ),
            Direction::Out => handle.write_control(
                request.request_type,
                request.request,
                request.value,
                request.index,
                buffer,
                request.timeout,
            ),
        }
    }

    fn get_descriptor(&mut self) -> Result<UsbData, rusb::Error> {
        self.claim()?;
        let handle = self.handle.as_ref().ok_or(rusb::Error::NoDevice)?;

        let device_manufacturer =
            read_string(handle, self.descriptor.manufacturer_string_index())?;
        let product_name = read_string(handle, self.descriptor.product_string_index())?;

        Ok(UsbData {
            vendor_id: self.descriptor.vendor_id(),
            product_id: self.descriptor.product_id(),
            device_manufacturer,
            product_name,
            bus_number: self.device.bus_number(),
            address: self.device.address(),
        })
    }

    fn vendor_id(&self) -> u16 {
        self.descriptor.vendor_id()
    }

    fn product_id(&self) -> u16 {
        self.descriptor.product_id()
    }

    fn bus_number(&self) -> u8 {
        self.device.bus_number()
    }

    fn address(&self) -> u8 {
        self.device.address()
    }
}

impl OutletCommands for LibUsbOutlet {}
impl FullOutletDevice for LibUsbOutlet {}

impl fmt::Debug for LibUsbOutlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibUsbOutlet")
            .field("device", &self.device)
            .field("claimed", &self.handle.is_some())
            .finish()
    }
}

// Product IDs outside the device table are let through when the caller asks for them, they're
// only rejected once the table is consulted.
fn is_outlet(vendor_id: u16, product_id: u16, product_ids: &[u16]) -> bool {
    vendor_id == VID_GEMBIRD && product_ids.contains(&product_id)
}

pub(crate) fn find_devices(product_ids: &[u16]) -> Result<Vec<LibUsbOutlet>, rusb::Error> {
    let mut found_devices = Vec::new();

    for device in rusb::devices()?.iter() {
        if let Ok(descriptor) = device.device_descriptor() {
            if is_outlet(descriptor.vendor_id(), descriptor.product_id(), product_ids) {
                info!(
                    "Found outlet device {:04x}:{:04x} at Bus {:03} Address {:03}",
                    descriptor.vendor_id(),
                    descriptor.product_id(),
                    device.bus_number(),
                    device.address()
                );
                found_devices.push(LibUsbOutlet::new(device, descriptor));
            }
        }
    }

    Ok(found_devices)
}
