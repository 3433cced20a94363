pub mod battery;
pub mod serial;
pub mod time;

use clap::Parser;
use smol::LocalExecutor;

pub use drivers_shared::sense::ChargerHardware;

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
pub enum Chemistry {
    LiIon,
    Agm,
}

impl From<Chemistry> for battery::Chemistry {
    fn from(c: Chemistry) -> Self {
        match c {
            Chemistry::LiIon => battery::LI_ION,
            Chemistry::Agm => battery::AGM,
        }
    }
}

/// Runs the charger firmware against a simulated battery. Commands are read from stdin.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Options {
    /// Battery attached to the simulated charger.
    #[arg(long, value_enum, default_value_t = Chemistry::LiIon)]
    pub chemistry: Chemistry,

    /// Initial state of charge of the battery, 0 to 1.
    #[arg(long, default_value_t = 0.2)]
    pub soc: f32,

    /// How many times faster than real time the simulated clock runs.
    #[arg(long, default_value_t = 1)]
    pub speed: u32,

    /// Log level of the messages written to stderr.
    #[arg(long, default_value_t = log::LevelFilter::Info)]
    pub log_level: log::LevelFilter,

    /// Serial line to process before reading stdin, e.g. `-c t?1`. May be repeated.
    #[arg(short, long = "command")]
    pub commands: Vec<String>,
}

fn init_logger(level: log::LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:>10.3}s][{}][{}] {}",
                time::sim_millis() as f64 / 1000.0,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

pub struct Context {
    pub charger_io: battery::ChargerIo,
    pub serial: serial::Serial,
    pub start_time: time::Instant,
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

pub fn run(main: impl Main) -> ! {
    let options = Options::parse();
    if let Err(e) = init_logger(options.log_level) {
        eprintln!("Failed to set up logging: {}", e);
    }
    time::set_speed(options.speed);

    log::info!(
        "Simulating {:?} battery at {:.0}% charge, {}x speed",
        options.chemistry,
        options.soc * 100.0,
        options.speed
    );

    let executor = LocalExecutor::new();
    let battery = battery::SimBattery::new(options.chemistry.into(), options.soc);

    let context = Context {
        charger_io: battery::ChargerIo::new(battery),
        serial: serial::Serial::new(&executor, options.commands),
        start_time: *time::BOOT,
    };
    let _ = smol::block_on(executor.run(main.build(context)));
    panic!("Main should never return");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        let o = Options::try_parse_from([
            "simu",
            "--chemistry",
            "agm",
            "-c",
            "t?2",
            "--command",
            "a",
            "--speed",
            "60",
        ])
        .unwrap();
        assert!(matches!(o.chemistry, Chemistry::Agm));
        assert_eq!(o.commands, vec!["t?2", "a"]);
        assert_eq!(o.speed, 60);
        assert_eq!(o.soc, 0.2);
        assert_eq!(o.log_level, log::LevelFilter::Info);
    }

    #[test]
    fn test_options_reject_unknown_chemistry() {
        assert!(Options::try_parse_from(["simu", "--chemistry", "nimh"]).is_err());
    }
}
