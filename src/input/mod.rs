mod buttons;

pub use buttons::GpioButtons;
