use hifitime::Epoch;
use sgp4::chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use crate::error::{OrbitError, Result};

pub(crate) fn now() -> Result<Epoch> {
    Epoch::now().map_err(|error| OrbitError::Clock(error.to_string()))
}

/// Element set epochs are UTC calendar instants
pub(crate) fn from_element_datetime(datetime: &NaiveDateTime) -> Epoch {
    Epoch::from_gregorian_utc(
        datetime.year(), datetime.month() as u8, datetime.day() as u8, datetime.hour() as u8,
        datetime.minute() as u8, datetime.second() as u8, datetime.nanosecond())
}

pub(crate) fn to_element_datetime(epoch: Epoch) -> Result<NaiveDateTime> {
    let (year, month, day, hour, minute, second, nanos) = epoch.to_gregorian_utc();
    NaiveDate::from_ymd_opt(year, month.into(), day.into())
        .and_then(|date| date.and_hms_nano_opt(hour.into(), minute.into(), second.into(), nanos))
        .ok_or_else(|| OrbitError::Clock(format!("{epoch} has no UTC calendar representation")))
}

///
/// Minutes from an element set epoch to `to`. Counted on the UTC calendar without leap seconds,
/// which is the time scale SGP4 propagates on.
///
pub(crate) fn minutes_since(element_epoch: &NaiveDateTime, to: Epoch) -> Result<f64> {
    let elapsed = to_element_datetime(to)? - *element_epoch;
    elapsed.num_microseconds()
        .map(|micros| micros as f64 / 60e6)
        .ok_or_else(|| OrbitError::Clock(format!("{to} is too far from {element_epoch}")))
}
