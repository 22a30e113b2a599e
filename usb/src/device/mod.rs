// Lookup of outlet devices on the bus. Everything here hands back sessions, callers shouldn't need
// to poll USB directly.
use crate::device::base::FullOutletDevice;
use crate::device::libusb::LibUsbOutlet;
use crate::devices::known_product_ids;
use crate::error::ConnectError;
use crate::outlet::OutletDevice;
use log::debug;

pub mod base;
pub mod libusb;

/// Every known Gembird outlet on the bus.
pub fn find_devices()
-> Result<impl Iterator<Item = Result<OutletDevice<LibUsbOutlet>, ConnectError>>, ConnectError> {
    find_devices_with_products(&known_product_ids())
}

/// Every Gembird device on the bus with one of `product_ids`.
///
/// The bus is scanned on each call, while sessions are only opened as the iterator is
/// consumed. Product ids outside of [`known_product_ids`] are not rejected here, so take
/// care: the outlet commands may upset an unrelated device.
pub fn find_devices_with_products(
    product_ids: &[u16],
) -> Result<
    impl Iterator<Item = Result<OutletDevice<LibUsbOutlet>, ConnectError>> + use<>,
    ConnectError,
> {
    let devices = libusb::find_devices(product_ids)?;
    Ok(devices.into_iter().map(OutletDevice::from_device))
}

pub fn find_device_by_serial(
    serial: &str,
) -> Result<Option<OutletDevice<LibUsbOutlet>>, ConnectError> {
    find_device_by_serial_with_products(serial, &known_product_ids())
}

pub fn find_device_by_serial_with_products(
    serial: &str,
    product_ids: &[u16],
) -> Result<Option<OutletDevice<LibUsbOutlet>>, ConnectError> {
    find_by_serial(find_devices_with_products(product_ids)?, serial)
}

/// Returns the first session whose serial matches `serial` exactly, reading each in turn.
pub fn find_by_serial<T, I>(
    devices: I,
    serial: &str,
) -> Result<Option<OutletDevice<T>>, ConnectError>
where
    T: FullOutletDevice,
    I: IntoIterator<Item = Result<OutletDevice<T>, ConnectError>>,
{
    for device in devices {
        let mut device = device?;
        let device_serial = device.serial()?;
        debug!("Found device {} with serial {}", device, device_serial);

        if device_serial == serial {
            return Ok(Some(device));
        }
    }
    Ok(None)
}
