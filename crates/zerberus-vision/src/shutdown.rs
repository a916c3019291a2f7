use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit status of a process ended by a second Ctrl-C (128 + SIGINT).
const FORCED_EXIT_CODE: i32 = 130;

/// Cooperative stop flag, checked by the loops before every iteration.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag; `true` when it was already set, i.e. this is a repeat.
    fn trigger_again(&self) -> bool {
        self.flag.swap(true, Ordering::SeqCst)
    }

    /// Route Ctrl-C to this token. Only one handler per process.
    ///
    /// The first interrupt asks the loop to stop after the current frame.
    /// A second one exits straight away with [`FORCED_EXIT_CODE`], which is
    /// the only way out of a capture blocked inside the device.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            if token.trigger_again() {
                log::warn!("second interrupt, exiting");
                std::process::exit(FORCED_EXIT_CODE);
            }
            log::info!("interrupt received, stopping after the current frame (Ctrl-C again to force)");
        })
    }
}
