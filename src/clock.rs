use chrono::Local;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of completion timestamps.
pub trait Clock {
    fn now(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
pub struct FixedClock(pub &'static str);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.to_string()
    }
}
