#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

use arrform::{arrform, ArrForm};
use charger::command::{self, Response};
use charger::Charger;
use drivers::time::{Duration, Ticker};
use drivers::{ChargerHardware, Context, Never};

/// Period of the main loop. The controller throttles its regulation on its own.
const LOOP_PERIOD: Duration = Duration::from_millis(10);

async fn answer(serial: &mut drivers::serial::Serial, response: &Response) {
    match response {
        Response::Help => serial.write_line(command::HELP).await,
        r => serial.write_line(arrform!(64, "{}", r).as_str()).await,
    }
}

async fn charge<H: ChargerHardware>(
    mut charger: Charger<H>,
    mut serial: drivers::serial::Serial,
) -> Never {
    charger.start();

    let mut ticker = Ticker::every(LOOP_PERIOD);
    loop {
        charger.tick();

        while let Some(line) = serial.try_read_line() {
            if let Some(response) = command::handle(&mut charger, &line) {
                answer(&mut serial, &response).await;
            }
        }

        ticker.next().await;
    }
}

#[cfg_attr(target_arch = "arm", cortex_m_rt::entry)]
fn main() -> ! {
    drivers::run(|ctx: Context| async move {
        log::info!("PWM charger up after {}ms", ctx.start_time.elapsed().as_millis());
        let charger = Charger::new(ctx.charger_io);
        charge(charger, ctx.serial).await
    });
}
