//! USB HID gamepad output and host feature reports.

use defmt::{trace, Format};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_usb::class::hid::{HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use fightstick_core::{GamepadPublisher, GamepadState, FEATURE_REPORT_SIZE};

/// Size of [`GamepadReport`] on the wire.
pub const REPORT_SIZE: usize = 9;

pub type GamepadWriter<'d> = HidWriter<'d, Driver<'d, USB>, REPORT_SIZE>;

/// USB HID Gamepad report structure.
///
/// This matches the HID report descriptor defined below.
/// Total size: 9 bytes (buttons: 2, hat: 1, sticks: 4x1, triggers: 2x1)
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Format)]
#[repr(C)]
pub struct GamepadReport {
    /// Button bitfield (14 buttons, 2 padding bits)
    pub buttons: u16,
    /// Hat switch, 0 (up) to 7 clockwise, 8 when centered
    pub hat: u8,
    pub left_stick_x: i8,
    pub left_stick_y: i8,
    pub right_stick_x: i8,
    pub right_stick_y: i8,
    pub left_trigger: u8,
    pub right_trigger: u8,
}

impl GamepadReport {
    pub const SIZE: usize = REPORT_SIZE;

    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let buttons_bytes = self.buttons.to_le_bytes();
        [
            buttons_bytes[0],
            buttons_bytes[1],
            self.hat,
            self.left_stick_x as u8,
            self.left_stick_y as u8,
            self.right_stick_x as u8,
            self.right_stick_y as u8,
            self.left_trigger,
            self.right_trigger,
        ]
    }
}

impl From<&GamepadState> for GamepadReport {
    fn from(state: &GamepadState) -> Self {
        Self {
            buttons: state.buttons.raw() & 0x3FFF,
            hat: state.dpad.to_hat(),
            // Scale i16 to i8 by taking the high byte
            left_stick_x: (state.left_stick.x >> 8) as i8,
            left_stick_y: (state.left_stick.y >> 8) as i8,
            right_stick_x: (state.right_stick.x >> 8) as i8,
            right_stick_y: (state.right_stick.y >> 8) as i8,
            left_trigger: state.left_trigger,
            right_trigger: state.right_trigger,
        }
    }
}

/// HID Gamepad Report Descriptor.
///
/// This descriptor defines a gamepad with:
/// - 14 buttons
/// - a hat switch with a null state
/// - 2 analog sticks (X/Y each, signed 8-bit)
/// - 2 triggers (unsigned 8-bit)
/// - a 32-byte vendor feature report carrying player LED commands
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Buttons (14 buttons) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x0E, //   Usage Maximum (Button 14)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x0E, //   Report Count (14)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x03, //   Input (Constant) - padding
    //
    // --- Hat switch ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x39, //   Usage (Hat switch)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x07, //   Logical Maximum (7)
    0x35, 0x00, //   Physical Minimum (0)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x65, 0x14, //   Unit (Degrees)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    0x65, 0x00, //   Unit (None)
    0x45, 0x00, //   Physical Maximum (0)
    0x81, 0x03, //   Input (Constant) - padding
    //
    // --- Left Stick ---
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x15, 0x81, //   Logical Minimum (-127)
    0x25, 0x7F, //   Logical Maximum (127)
    0x95, 0x02, //   Report Count (2)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Right Stick ---
    0x09, 0x32, //   Usage (Z)
    0x09, 0x35, //   Usage (Rz)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Triggers ---
    0x09, 0x33, //   Usage (Rx)
    0x09, 0x34, //   Usage (Ry)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x95, 0x02, //   Report Count (2)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Player LED commands ---
    0x06, 0x00, 0xFF, //   Usage Page (Vendor Defined)
    0x09, 0x01, //   Usage (Vendor 1)
    0x95, FEATURE_REPORT_SIZE as u8, //   Report Count (32)
    0xB1, 0x02, //   Feature (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];

/// USB HID gamepad output.
///
/// Wraps an embassy-usb HID writer to send gamepad reports.
pub struct UsbHidOutput<'d> {
    writer: GamepadWriter<'d>,
}

impl<'d> UsbHidOutput<'d> {
    pub fn new(writer: GamepadWriter<'d>) -> Self {
        Self { writer }
    }

    /// Wait until the device is ready (USB enumerated).
    pub async fn wait_ready(&mut self) {
        self.writer.ready().await;
    }

    pub async fn send(&mut self, state: &GamepadState) -> Result<(), EndpointError> {
        let report = GamepadReport::from(state);
        self.writer.write(&report.as_bytes()).await
    }
}

/// HID request handler forwarding SET_REPORT payloads to Core 1.
pub struct GamepadRequestHandler {
    publisher: GamepadPublisher<'static, CriticalSectionRawMutex>,
}

impl GamepadRequestHandler {
    pub fn new(publisher: GamepadPublisher<'static, CriticalSectionRawMutex>) -> Self {
        Self { publisher }
    }
}

impl RequestHandler for GamepadRequestHandler {
    fn get_report(&mut self, _id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn set_report(&mut self, _id: ReportId, data: &[u8]) -> OutResponse {
        if !self.publisher.publish_feature(data) {
            trace!("Feature report not queued ({} bytes)", data.len());
        }
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, _duration_ms: u32) {}

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

/// Configure the USB HID class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
    handler: &'d mut GamepadRequestHandler,
) -> GamepadWriter<'d> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: Some(handler),
        poll_ms: 1,
        max_packet_size: 16,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
