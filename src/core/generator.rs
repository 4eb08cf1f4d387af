use crate::core::timeline::Tick;

/// Increment applied to the measured value on every tick.
pub const DEFAULT_VALUE_STEP: f64 = 100.0;

/// Number of channels sampled on every tick.
pub const CHANNEL_COUNT: u8 = 12;

/// One row destined for a partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub channel: u8,
    pub measured_value: f64,
    pub recorded_time: i64,
}

/// Deterministic linear counter shared by all channels of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementGenerator {
    step: f64,
}

impl Default for MeasurementGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_STEP)
    }
}

impl MeasurementGenerator {
    pub fn new(step: f64) -> Self {
        Self { step }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Value for `tick`: zero on the first tick, `step` higher on each one after.
    pub fn value_for(&self, tick: &Tick) -> f64 {
        tick.index as f64 * self.step
    }

    /// Rows for every channel of `tick`, in channel order.
    pub fn rows_for(&self, tick: &Tick) -> impl Iterator<Item = Measurement> {
        let measured_value = self.value_for(tick);
        let recorded_time = tick.unix_secs;
        (1..=CHANNEL_COUNT).map(move |channel| Measurement {
            channel,
            measured_value,
            recorded_time,
        })
    }
}
