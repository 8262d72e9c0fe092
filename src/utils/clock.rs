use chrono::{DateTime, Local, NaiveDate};

/// Represents an entity responsible for providing dates across application. This allows the day
/// boundary to be moved around in tests.
pub trait Clock: Sync + Send + 'static {
    fn now(&self) -> DateTime<Local>;

    /// Local calendar day used for day-scoped data.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
