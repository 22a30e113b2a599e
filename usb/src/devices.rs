// The static identity table for every known Gembird outlet. Anything that needs to know how many
// sockets a device has, or what to call it, should come through here rather than poking at
// product ids directly.
use strum::{Display, EnumIter, IntoEnumIterator};

pub const VID_GEMBIRD: u16 = 0x04b4;

pub const PID_MSISPM_OLD: u16 = 0xfd10;
pub const PID_SISPM: u16 = 0xfd11;
pub const PID_MSISPM_FLASH: u16 = 0xfd12;
pub const PID_MSISPM_FLASH_NEW: u16 = 0xfd13;

const SINGLE_OUTLET: &[u8] = &[1];
const FOUR_OUTLETS: &[u8] = &[1, 2, 3, 4];

#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq, Hash)]
pub enum DeviceType {
    #[strum(to_string = "1-socket mSiS-PM")]
    MsisPmOld,

    #[strum(to_string = "4-socket SiS-PM")]
    SisPm,

    #[strum(to_string = "1-socket mSiS-PM")]
    MsisPmFlash,

    #[strum(to_string = "4-socket SiS-PM")]
    MsisPmFlashNew,
}

impl DeviceType {
    pub fn from_product_id(product_id: u16) -> Option<Self> {
        DeviceType::iter().find(|device_type| device_type.product_id() == product_id)
    }

    pub fn product_id(&self) -> u16 {
        match self {
            DeviceType::MsisPmOld => PID_MSISPM_OLD,
            DeviceType::SisPm => PID_SISPM,
            DeviceType::MsisPmFlash => PID_MSISPM_FLASH,
            DeviceType::MsisPmFlashNew => PID_MSISPM_FLASH_NEW,
        }
    }

    /// The socket numbers present on this device, in switching order.
    pub fn outlets(&self) -> &'static [u8] {
        match self {
            DeviceType::MsisPmOld | DeviceType::MsisPmFlash => SINGLE_OUTLET,
            DeviceType::SisPm | DeviceType::MsisPmFlashNew => FOUR_OUTLETS,
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

/// Product ids which are known to speak the outlet protocol.
///
/// Passing anything else to the enumeration functions is possible, but the
/// control requests may well do something unpleasant to an unrelated device.
pub fn known_product_ids() -> Vec<u16> {
    DeviceType::iter().map(|device_type| device_type.product_id()).collect()
}
