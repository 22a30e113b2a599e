#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("No SiS-PM device was found")]
    DeviceNotFound,

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),

    #[error("Unable to query device: {0}")]
    OutletError(#[from] OutletError),
}

#[derive(thiserror::Error, Debug)]
pub enum OutletError {
    #[error("illegal outlet id {0}")]
    IllegalOutlet(String),

    #[error("Unknown product id 0x{0:04x}, not a SiS-PM device")]
    UnknownProduct(u16),

    #[error("Malformed response from device, expected {expected} bytes, received {received}")]
    MalformedResponse { expected: usize, received: usize },

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),
}
