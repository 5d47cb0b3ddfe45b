#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Executor;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{DMA_CH0, PIN_14, PIO0, USB};
use embassy_rp::pio::Pio;
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_rp::pwm::Pwm;
use embassy_rp::usb::Driver;
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker, Timer};
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use fightstick::{
    board, configure_usb_hid, host_state, negotiate_boot_mode, persist_task, pled_pwm_config,
    AnimationStation, BootAction, CoalescingQueue, Core1, Core1State, CrossCoreQueues, Debouncer,
    FeatureQueue, GamepadPublisher, GamepadRequestHandler, GamepadSnapshot, GamepadState,
    GpioButtons, InputMode, LedModule, PioStripFactory, PwmPlayerLeds, PwmPledModule, RamStorage,
    SnapshotQueue, UsbHidOutput, DEFAULT_F1_MASK,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

/// Core 1 sleep between dispatcher iterations.
const CORE1_STEP: Duration = Duration::from_micros(100);
/// Core 1 sleep while parked in config mode.
const CORE1_PARKED: Duration = Duration::from_millis(1000);
/// Button sampling period on Core 0.
const SAMPLE_PERIOD: Duration = Duration::from_millis(1);

static mut CORE1_STACK: Stack<4096> = Stack::new();
static EXECUTOR0: StaticCell<Executor> = StaticCell::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

/// Latest debounced state for the HID output task ("latest value wins").
static STATE_SIGNAL: StaticCell<Signal<CriticalSectionRawMutex, GamepadState>> = StaticCell::new();

/// Queues crossing from Core 0 to Core 1.
static SNAPSHOTS: SnapshotQueue<CriticalSectionRawMutex> = CoalescingQueue::new();
static FEATURES: FeatureQueue<CriticalSectionRawMutex> = CoalescingQueue::new();

static STORAGE: StaticCell<RamStorage> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();
static HID_HANDLER: StaticCell<GamepadRequestHandler> = StaticCell::new();

fn queues() -> CrossCoreQueues<'static, CriticalSectionRawMutex> {
    CrossCoreQueues {
        snapshots: &SNAPSHOTS,
        features: &FEATURES,
    }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    info!("Fight stick starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Buttons, in ButtonLabel::ALL order ---
    let buttons = GpioButtons::new([
        Input::new(p.PIN_13, Pull::Up), // Up
        Input::new(p.PIN_11, Pull::Up), // Down
        Input::new(p.PIN_10, Pull::Up), // Left
        Input::new(p.PIN_12, Pull::Up), // Right
        Input::new(p.PIN_4, Pull::Up),  // B1
        Input::new(p.PIN_5, Pull::Up),  // B2
        Input::new(p.PIN_0, Pull::Up),  // B3
        Input::new(p.PIN_1, Pull::Up),  // B4
        Input::new(p.PIN_3, Pull::Up),  // L1
        Input::new(p.PIN_2, Pull::Up),  // R1
        Input::new(p.PIN_7, Pull::Up),  // L2
        Input::new(p.PIN_6, Pull::Up),  // R2
        Input::new(p.PIN_8, Pull::Up),  // S1
        Input::new(p.PIN_9, Pull::Up),  // S2
        Input::new(p.PIN_17, Pull::Up), // L3
        Input::new(p.PIN_16, Pull::Up), // R3
        Input::new(p.PIN_28, Pull::Up), // A1
        Input::new(p.PIN_18, Pull::Up), // A2
    ]);
    // Let the pull-ups settle before the boot sample.
    embassy_time::block_for(Duration::from_millis(1));

    let storage: &'static RamStorage =
        STORAGE.init(RamStorage::new(board::default_led_options(), InputMode::default()));

    // --- Boot mode ---
    let mode = match negotiate_boot_mode(&buttons.read(), DEFAULT_F1_MASK, storage.input_mode()) {
        BootAction::UsbBootloader => {
            info!("Rebooting to USB bootloader");
            embassy_rp::rom_data::reset_to_usb_boot(0, 0);
            loop {
                cortex_m::asm::wfi();
            }
        }
        BootAction::Start { mode, save } => {
            if save {
                storage.save_input_mode(mode);
            }
            mode
        }
    };
    info!("Input mode: {:?}", mode);

    let signal: &'static Signal<CriticalSectionRawMutex, GamepadState> =
        STATE_SIGNAL.init(Signal::new());

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust Gamepad");
    usb_config.product = Some("Fight Stick");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure HID class; SET_REPORT payloads go to Core 1
    let hid_state = HID_STATE.init(State::new());
    let hid_handler = HID_HANDLER.init(GamepadRequestHandler::new(GamepadPublisher::new(queues())));
    let hid_writer = configure_usb_hid(&mut builder, hid_state, hid_handler);

    let usb_device = builder.build();
    let usb_output = UsbHidOutput::new(hid_writer);

    // --- Core 1: LED pipeline and persistence ---
    let (pio, dma, led_pin) = (p.PIO0, p.DMA_CH0, p.PIN_14);
    // Player LEDs on board::PLED_PINS
    let pled_output = PwmPlayerLeds::new(
        Pwm::new_output_ab(p.PWM_SLICE2, p.PIN_20, p.PIN_21, pled_pwm_config()),
        Pwm::new_output_ab(p.PWM_SLICE5, p.PIN_26, p.PIN_27, pled_pwm_config()),
    );
    spawn_core1(
        p.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| {
                spawner.spawn(core1_task(storage, mode, pio, dma, led_pin, pled_output)).unwrap();
                spawner.spawn(persist_task(storage)).unwrap();
            })
        },
    );

    // --- Core 0: USB and input ---
    let executor0 = EXECUTOR0.init(Executor::new());
    executor0.run(|spawner| {
        spawner.spawn(usb_task(usb_device)).unwrap();
        spawner.spawn(input_task(buttons, signal, mode)).unwrap();
        spawner.spawn(output_task(usb_output, signal)).unwrap();
        info!("Fight stick initialized");
    })
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Input task - samples and debounces the buttons, then hands the state to
/// the HID output (without LED hotkeys) and to Core 1.
#[embassy_executor::task]
async fn input_task(
    buttons: GpioButtons<'static>,
    signal: &'static Signal<CriticalSectionRawMutex, GamepadState>,
    mode: InputMode,
) {
    let publisher = GamepadPublisher::new(queues());
    let mut debouncer = Debouncer::default();
    let mut last: Option<GamepadState> = None;
    let mut ticker = Ticker::every(SAMPLE_PERIOD);

    loop {
        let mut state = buttons.read();
        debouncer.debounce(&mut state, Instant::now());

        let snapshot = GamepadSnapshot::new(state, mode);
        let host = host_state(&snapshot);
        if last != Some(host) {
            // Signal the latest gamepad state (overwrites any pending value)
            signal.signal(host);
            last = Some(host);
        }
        publisher.publish_snapshot(snapshot);

        ticker.next().await;
    }
}

/// Output task - waits for gamepad state signals and sends to USB HID.
#[embassy_executor::task]
async fn output_task(
    mut output: UsbHidOutput<'static>,
    signal: &'static Signal<CriticalSectionRawMutex, GamepadState>,
) {
    // Wait for USB to be ready
    output.wait_ready().await;
    info!("USB HID ready, forwarding gamepad state...");

    loop {
        // Wait for the next gamepad state (blocks until signaled)
        let state = signal.wait().await;
        if let Err(e) = output.send(&state).await {
            error!("Output error: {:?}", e);
        }
    }
}

/// Core 1 task - owns the strip and the player LEDs and runs the peripheral dispatcher.
#[embassy_executor::task]
async fn core1_task(
    storage: &'static RamStorage,
    mode: InputMode,
    pio: Peri<'static, PIO0>,
    dma: Peri<'static, DMA_CH0>,
    led_pin: Peri<'static, PIN_14>,
    pled_output: PwmPlayerLeds,
) {
    let Pio {
        mut common, sm0, ..
    } = Pio::new(pio, Irqs);
    let program = PioWs2812Program::new(&mut common);
    let ws = PioWs2812::new(&mut common, sm0, dma, led_pin, &program);
    let factory = PioStripFactory::new(ws, board::LED_DATA_PIN);

    let leds = LedModule::new(storage, AnimationStation::new(), factory, &FEATURES);
    let pleds = PwmPledModule::new(storage, pled_output, &FEATURES);
    let mut core1 = Core1::new(&SNAPSHOTS, (leds, pleds));

    if let Err(e) = core1.setup(mode).await {
        warn!("LED setup failed, Core 1 parked: {:?}", e);
    }
    info!("Core 1 {:?}", core1.state());

    loop {
        if core1.state() == Core1State::Running {
            core1.step(Instant::now()).await;
            Timer::after(CORE1_STEP).await;
        } else {
            Timer::after(CORE1_PARKED).await;
        }
    }
}
