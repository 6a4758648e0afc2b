//! Flash command implementation

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sambaflash_core::flash::{BootBitOrder, FlashOptions, FlashProgress};
use sambaflash_core::Error;
use std::time::Duration;

use super::read_input;
use crate::cli::{FlashArgs, PortArgs};
use crate::ports;

/// Progress reporter using indicatif progress bars
///
/// A zero upper bound shows a spinner; anything else a page counter bar.
struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
    label: String,
}

impl IndicatifProgress {
    fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
            label: String::new(),
        }
    }

    fn create_bar(&mut self, total: u64) {
        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(self.label.clone());
        self.current_bar = Some(pb);
    }

    fn create_spinner(&mut self) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}...")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(self.label.clone());
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    fn finish(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish();
        }
    }

    fn abandon(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.abandon();
        }
    }
}

impl FlashProgress for IndicatifProgress {
    fn set_label(&mut self, label: &str) {
        if label == self.label {
            return;
        }
        self.finish();
        self.label = label.to_string();
    }

    fn set_bound(&mut self, min: usize, max: usize) {
        // A new bound restarts the current stage
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
        if max == 0 {
            self.create_spinner();
        } else {
            self.create_bar(max.saturating_sub(min) as u64);
        }
    }

    fn set_value(&mut self, value: usize) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(value as u64);
        }
    }

    fn show(&mut self) {
        if let Some(pb) = &self.current_bar {
            pb.tick();
        }
    }
}

/// Run the flash command
pub fn run_flash(port: &PortArgs, args: &FlashArgs) -> Result<(), Box<dyn std::error::Error>> {
    let firmware = read_input(&args.firmware)?;
    let calibration = args
        .calibration
        .as_deref()
        .map(read_input)
        .transpose()?;

    println!(
        "Read {} bytes of firmware from {}",
        firmware.len(),
        args.firmware.display()
    );
    if let (Some(path), Some(blob)) = (&args.calibration, &calibration) {
        println!("Read {} bytes of IMU calibration from {}", blob.len(), path.display());
    }

    let mut session = ports::open_session(port)?;

    let options = FlashOptions {
        lock_calibration: args.lock_calibration,
        boot_bit_order: if args.boot_bit_first {
            BootBitOrder::BeforeVerify
        } else {
            BootBitOrder::AfterVerify
        },
        reset: !args.no_reset,
    };

    let mut progress = IndicatifProgress::new();
    let result =
        session.flash_with_options(&firmware, calibration.as_deref(), &options, &mut progress);

    match result {
        Ok(()) => {
            progress.finish();
            if options.reset {
                println!("Flash written and verified, device reset");
            } else {
                println!("Flash written and verified, device left in bootloader");
            }
            Ok(())
        }
        Err(Error::ExecutionError) => {
            progress.finish();
            eprintln!("Warning: {}", Error::ExecutionError);
            eprintln!("Flash written and verified; {}", Error::ExecutionError.recovery_hint());
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            Err(e.into())
        }
    }
}
