use std::io::Write;

use drivers_shared::serial::{LineAssembler, INTER_CHAR_TIMEOUT_MS, LINE_CAPACITY};
use futures::{
    future::{self, Either},
    AsyncReadExt,
};
use smol::{
    channel::{Receiver, Sender},
    LocalExecutor,
};

use crate::time::{Duration, Timer};

pub use drivers_shared::serial::Line;

/// Serial port of the simulator: lines come from the `--command` options, then stdin.
/// Responses go to stdout.
pub struct Serial {
    lines: Receiver<Line>,
    _reader: smol::Task<()>,
}

impl Serial {
    pub(crate) fn new(executor: &LocalExecutor, commands: Vec<String>) -> Self {
        let (tx, rx) = smol::channel::unbounded();
        Self {
            lines: rx,
            _reader: executor.spawn(read_lines(tx, commands)),
        }
    }

    pub fn try_read_line(&mut self) -> Option<Line> {
        self.lines.try_recv().ok()
    }

    pub async fn write_line(&mut self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
            log::warn!("Failed to write stdout: {}", e);
        }
    }
}

fn warn_truncated(assembler: &LineAssembler) {
    if assembler.truncated() {
        log::warn!("Command longer than {} characters, truncated", LINE_CAPACITY);
    }
}

async fn read_lines(tx: Sender<Line>, commands: Vec<String>) {
    let mut assembler = LineAssembler::new();

    for command in commands {
        for b in command.bytes().chain(std::iter::once(b'\n')) {
            if let Some(line) = assembler.push(b) {
                warn_truncated(&assembler);
                if tx.send(line).await.is_err() {
                    return;
                }
            }
        }
    }

    let mut stdin = smol::Unblock::new(std::io::stdin());
    let mut byte = [0u8; 1];
    loop {
        let timeout = Timer::after(Duration::from_millis(INTER_CHAR_TIMEOUT_MS));
        let read = match future::select(stdin.read(&mut byte), timeout).await {
            Either::Left((res, _)) => Some(res),
            Either::Right(_) => None,
        };

        let line = match read {
            Some(Ok(0)) => {
                log::debug!("stdin closed");
                if let Some(line) = assembler.flush() {
                    warn_truncated(&assembler);
                    let _ = tx.send(line).await;
                }
                return;
            }
            Some(Ok(_)) => assembler.push(byte[0]),
            Some(Err(e)) => {
                log::error!("Failed to read stdin: {}", e);
                return;
            }
            None => assembler.flush(),
        };

        if let Some(line) = line {
            warn_truncated(&assembler);
            if tx.send(line).await.is_err() {
                return;
            }
        }
    }
}
