//! Progress reporting for long flash operations

/// Progress sink driven by the flashing engine
///
/// The engine reports a label per stage, a bound once the unit count is
/// known and one value update per page. `pump_events` is called after each
/// page write and each page verify so that a host event loop can stay
/// responsive during a multi-second flash.
pub trait FlashProgress {
    /// Set the stage label
    fn set_label(&mut self, label: &str);

    /// Set the progress range; `max == 0` means the count is not known yet
    fn set_bound(&mut self, min: usize, max: usize);

    /// Set the current progress value
    fn set_value(&mut self, value: usize);

    /// Make the progress display visible
    fn show(&mut self);

    /// Service pending host events
    fn pump_events(&mut self) {}
}

impl<P: FlashProgress + ?Sized> FlashProgress for &mut P {
    fn set_label(&mut self, label: &str) {
        (**self).set_label(label)
    }

    fn set_bound(&mut self, min: usize, max: usize) {
        (**self).set_bound(min, max)
    }

    fn set_value(&mut self, value: usize) {
        (**self).set_value(value)
    }

    fn show(&mut self) {
        (**self).show()
    }

    fn pump_events(&mut self) {
        (**self).pump_events()
    }
}

/// A no-op progress reporter
pub struct NoProgress;

impl FlashProgress for NoProgress {
    fn set_label(&mut self, _label: &str) {}
    fn set_bound(&mut self, _min: usize, _max: usize) {}
    fn set_value(&mut self, _value: usize) {}
    fn show(&mut self) {}
}
