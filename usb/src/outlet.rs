use crate::device::base::FullOutletDevice;
use crate::devices::DeviceType;
use crate::error::{ConnectError, OutletError};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Selects which socket an operation applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outlet {
    Number(u8),
    All,
}

impl From<u8> for Outlet {
    fn from(number: u8) -> Self {
        Outlet::Number(number)
    }
}

impl FromStr for Outlet {
    type Err = OutletError;

    /// Accepts exactly `all`, or a socket number written as plain decimal digits.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "all" {
            return Ok(Outlet::All);
        }
        if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(OutletError::IllegalOutlet(value.to_string()));
        }
        value
            .parse::<u8>()
            .map(Outlet::Number)
            .map_err(|_| OutletError::IllegalOutlet(value.to_string()))
    }
}

impl fmt::Display for Outlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outlet::Number(number) => write!(f, "{}", number),
            Outlet::All => write!(f, "all"),
        }
    }
}

/// The result of an outlet operation, one value for a single socket, or one per socket for `All`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum OutletReport {
    Single(bool),
    All(BTreeMap<u8, bool>),
}

impl OutletReport {
    pub fn all_succeeded(&self) -> bool {
        match self {
            OutletReport::Single(result) => *result,
            OutletReport::All(results) => results.values().all(|result| *result),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DeviceInfo {
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub vendor_id: String,
    pub product_id: String,
    pub serial: String,
    pub device_type: String,
    pub outlets: Vec<u8>,
    pub bus: u8,
    pub address: u8,
}

/// A session on a single Gembird outlet device.
///
/// By default the device is released after every call, so other applications
/// can still reach it in between. Turn `auto_release` off to hold the device
/// across a batch of calls, then call [`OutletDevice::dispose`] when finished.
#[derive(Debug)]
pub struct OutletDevice<T: FullOutletDevice> {
    device: T,
    auto_release: bool,
}

impl<T: FullOutletDevice> OutletDevice<T> {
    pub fn from_device(mut device: T) -> Result<Self, ConnectError> {
        device.claim()?;
        info!(
            "Connected to outlet device {:04x}:{:04x} at Bus {:03} Address {:03}",
            device.vendor_id(),
            device.product_id(),
            device.bus_number(),
            device.address()
        );

        Ok(Self {
            device,
            auto_release: true,
        })
    }

    pub fn auto_release(&self) -> bool {
        self.auto_release
    }

    pub fn set_auto_release(&mut self, auto_release: bool) {
        self.auto_release = auto_release;
    }

    pub fn device(&self) -> &T {
        &self.device
    }

    pub fn device_type(&self) -> Result<DeviceType, OutletError> {
        let product_id = self.device.product_id();
        DeviceType::from_product_id(product_id).ok_or(OutletError::UnknownProduct(product_id))
    }

    pub fn outlets(&self) -> Result<&'static [u8], OutletError> {
        Ok(self.device_type()?.outlets())
    }

    pub fn bus_number(&self) -> u8 {
        self.device.bus_number()
    }

    pub fn address(&self) -> u8 {
        self.device.address()
    }

    /// Release the device so other applications can use it. It is claimed again on the next call.
    pub fn dispose(&mut self) -> Result<(), OutletError> {
        debug!(
            "Disposing of device at Bus {:03} Address {:03}",
            self.bus_number(),
            self.address()
        );
        self.device.release()?;
        Ok(())
    }

    pub fn serial(&mut self) -> Result<String, OutletError> {
        self.with_release(|session| session.device.get_serial())
    }

    pub fn status(&mut self, outlet: impl Into<Outlet>) -> Result<OutletReport, OutletError> {
        let outlet = outlet.into();
        self.with_release(|session| for_outlets(session, outlet, T::get_status))
    }

    /// Power on the outlet(s). Each result is `true` once a status read confirms the change.
    pub fn on(&mut self, outlet: impl Into<Outlet>) -> Result<OutletReport, OutletError> {
        let outlet = outlet.into();
        self.with_release(|session| for_outlets(session, outlet, T::switch_on))
    }

    pub fn off(&mut self, outlet: impl Into<Outlet>) -> Result<OutletReport, OutletError> {
        let outlet = outlet.into();
        self.with_release(|session| for_outlets(session, outlet, T::switch_off))
    }

    pub fn toggle(&mut self, outlet: impl Into<Outlet>) -> Result<OutletReport, OutletError> {
        let outlet = outlet.into();
        self.with_release(|session| for_outlets(session, outlet, T::toggle))
    }

    pub fn info(&mut self) -> Result<DeviceInfo, OutletError> {
        self.with_release(|session| {
            let device_type = session.device_type()?;
            let descriptor = session.device.get_descriptor()?;
            let serial = session.device.get_serial()?;

            Ok(DeviceInfo {
                manufacturer: descriptor.device_manufacturer(),
                product: descriptor.product_name(),
                vendor_id: format!("0x{:04x}", descriptor.vendor_id()),
                product_id: format!("0x{:04x}", descriptor.product_id()),
                serial,
                device_type: device_type.label(),
                outlets: device_type.outlets().to_vec(),
                bus: descriptor.bus_number(),
                address: descriptor.address(),
            })
        })
    }

    // Runs the call, then hands the device back to the bus if we're auto releasing. A failed
    // release never replaces the call's own result.
    fn with_release<R>(
        &mut self,
        call: impl FnOnce(&mut Self) -> Result<R, OutletError>,
    ) -> Result<R, OutletError> {
        let result = call(self);
        if self.auto_release {
            if let Err(error) = self.device.release() {
                warn!("Unable to release device, ignoring: {}", error);
            }
        }
        result
    }
}

fn for_outlets<T, F>(
    session: &mut OutletDevice<T>,
    outlet: Outlet,
    mut operation: F,
) -> Result<OutletReport, OutletError>
where
    T: FullOutletDevice,
    F: FnMut(&mut T, u8) -> Result<bool, OutletError>,
{
    let outlets = session.outlets()?;
    match outlet {
        Outlet::Number(number) if outlets.contains(&number) => {
            Ok(OutletReport::Single(operation(&mut session.device, number)?))
        }
        Outlet::All => {
            let mut results = BTreeMap::new();
            for &number in outlets {
                results.insert(number, operation(&mut session.device, number)?);
            }
            Ok(OutletReport::All(results))
        }
        Outlet::Number(number) => Err(OutletError::IllegalOutlet(number.to_string())),
    }
}

impl<T: FullOutletDevice> fmt::Display for OutletDevice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SiS-PM Bus {:03} Address {:03} ID {:04x}:{:04x}",
            self.device.bus_number(),
            self.device.address(),
            self.device.vendor_id(),
            self.device.product_id()
        )
    }
}
