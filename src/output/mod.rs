pub mod pwm_pled;
pub mod usb_hid;
pub mod ws2812;

pub use pwm_pled::{pled_pwm_config, PwmPlayerLeds};
pub use usb_hid::{configure_usb_hid, GamepadReport, GamepadRequestHandler, UsbHidOutput};
pub use ws2812::{PioStrip, PioStripFactory, Ws2812};
