#![no_std]

use embassy_nrf::{bind_interrupts, buffered_uarte, saadc};
use embassy_time::Instant;
use static_cell::StaticCell;

use defmt_rtt as _; //logger
use panic_probe as _; //panic handler

pub mod charger_io;
pub mod hardware;
mod logger;
pub mod serial;
pub mod time;

pub use drivers_shared::sense::ChargerHardware;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    UARTE0_UART0 => buffered_uarte::InterruptHandler<serial::UartInstance>;
});

pub struct Context {
    pub charger_io: charger_io::ChargerIo,
    pub serial: serial::Serial,
    pub start_time: Instant,
}

async fn init(spawner: embassy_executor::Spawner) -> Context {
    logger::init();

    let mut conf = embassy_nrf::config::Config::default();
    conf.dcdc.reg1 = true;
    let p = embassy_nrf::init(conf);

    let charger_io =
        charger_io::ChargerIo::new(&spawner, p.SAADC, p.P0_03, p.P0_04, p.PWM0, p.P0_13);

    let serial = serial::Serial::new(
        &spawner,
        p.UARTE0,
        p.TIMER1,
        p.PPI_CH1,
        p.PPI_CH2,
        p.PPI_GROUP1,
        p.P0_08,
        p.P0_06,
    );

    defmt::info!("init done");

    Context {
        charger_io,
        serial,
        start_time: Instant::now(),
    }
}

pub enum Never {}

pub trait Main: 'static {
    fn build(self, context: Context) -> impl core::future::Future<Output = Never> + 'static;
}

impl<F: core::future::Future<Output = Never> + 'static, C: FnOnce(Context) -> F + 'static> Main
    for C
{
    fn build(self, context: Context) -> impl core::future::Future<Output = Never> + 'static {
        self(context)
    }
}

#[embassy_executor::task]
async fn main_task(main: impl Main) {
    let spawner = embassy_executor::Spawner::for_current_executor().await;
    let ctx = init(spawner).await;
    let future = main.build(ctx);
    let _ = future.await;
}

static EXECUTOR: StaticCell<embassy_executor::Executor> = StaticCell::new();

pub fn run(main: impl Main) -> ! {
    let executor = EXECUTOR.init(embassy_executor::Executor::new());

    executor.run(|spawner| {
        defmt::unwrap!(spawner.spawn(main_task(main)));
    });
}
