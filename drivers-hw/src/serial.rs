use drivers_shared::serial::{LineAssembler, INTER_CHAR_TIMEOUT_MS, LINE_CAPACITY};
use embassy_futures::select::{select, Either};
use embassy_nrf::{
    buffered_uarte::{BufferedUarte, BufferedUarteRx, BufferedUarteTx},
    peripherals::{PPI_CH1, PPI_CH2, PPI_GROUP1, TIMER1, UARTE0},
    uarte::Config,
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::{Duration, Timer};
use embedded_io_async::{Read, Write};
use static_cell::StaticCell;

use super::hardware::uart as hw;

pub use drivers_shared::serial::Line;

pub(crate) type UartInstance = UARTE0;
pub(crate) type TimerInstance = TIMER1;

type Uart = BufferedUarte<'static, UartInstance, TimerInstance>;

static UART: StaticCell<Uart> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static TX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();

static LINES: Channel<CriticalSectionRawMutex, Line, 4> = Channel::new();

fn warn_truncated(assembler: &LineAssembler) {
    if assembler.truncated() {
        defmt::warn!("command longer than {} characters, truncated", LINE_CAPACITY);
    }
}

#[embassy_executor::task]
async fn rx_task(mut rx: BufferedUarteRx<'static, 'static, UartInstance, TimerInstance>) {
    let mut assembler = LineAssembler::new();
    let mut buf = [0u8; 16];
    loop {
        let timeout = Timer::after(Duration::from_millis(INTER_CHAR_TIMEOUT_MS));
        let n = match select(rx.read(&mut buf), timeout).await {
            Either::First(Ok(n)) => n,
            Either::First(Err(e)) => {
                defmt::warn!("uart rx error: {:?}", e);
                continue;
            }
            Either::Second(()) => {
                if let Some(line) = assembler.flush() {
                    warn_truncated(&assembler);
                    LINES.send(line).await;
                }
                continue;
            }
        };

        for b in &buf[..n] {
            if let Some(line) = assembler.push(*b) {
                warn_truncated(&assembler);
                LINES.send(line).await;
            }
        }
    }
}

/// Command port. Received lines are assembled in the background and queued.
pub struct Serial {
    tx: BufferedUarteTx<'static, 'static, UartInstance, TimerInstance>,
}

impl Serial {
    pub(crate) fn new(
        spawner: &embassy_executor::Spawner,
        instance: UartInstance,
        timer: TimerInstance,
        ppi_ch1: PPI_CH1,
        ppi_ch2: PPI_CH2,
        ppi_group: PPI_GROUP1,
        rx: hw::RX,
        tx: hw::TX,
    ) -> Self {
        let mut config = Config::default();
        config.baudrate = hw::BAUDRATE;
        config.parity = embassy_nrf::uarte::Parity::EXCLUDED;

        let uart = UART.init(BufferedUarte::new(
            instance,
            timer,
            ppi_ch1,
            ppi_ch2,
            ppi_group,
            crate::Irqs,
            rx,
            tx,
            config,
            RX_BUF.init([0; 128]),
            TX_BUF.init([0; 1024]),
        ));
        let (rx, tx) = uart.split();
        spawner.spawn(rx_task(rx)).unwrap();

        Self { tx }
    }

    pub fn try_read_line(&mut self) -> Option<Line> {
        LINES.try_receive().ok()
    }

    pub async fn write_line(&mut self, line: &str) {
        if let Err(e) = self.write_all(line.as_bytes()).await {
            defmt::warn!("uart tx error: {:?}", e);
        }
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), embassy_nrf::buffered_uarte::Error> {
        self.tx.write_all(bytes).await?;
        self.tx.write_all(b"\r\n").await?;
        self.tx.flush().await
    }
}
