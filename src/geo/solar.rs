//! Sunrise and sunset computation.
//!
//! Events are computed with the `sunrise` crate for a calendar date in the
//! location's own timezone. Sunrise and sunset are resolved independently:
//! today's sunrise can pair with tomorrow's sunset and vice versa.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::rules::{LocationConfig, SolarEventKind};

/// Number of consecutive dates tried before an event is treated as absent.
const EVENT_SEARCH_DAYS: u32 = 3;

/// Number of calendar days a computed event may drift from its requested date.
///
/// When the sun never crosses the horizon the `sunrise` crate still returns a
/// timestamp (the Unix epoch), so anything further off is treated as absent.
const MAX_EVENT_DRIFT_DAYS: i64 = 1;

/// The next sunrise and sunset after a given instant.
///
/// `None` means the event does not happen within the search window, which only
/// occurs during polar day or polar night.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarTimes {
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

impl SolarTimes {
    pub fn get(&self, kind: SolarEventKind) -> Option<DateTime<Utc>> {
        match kind {
            SolarEventKind::Sunrise => self.sunrise,
            SolarEventKind::Sunset => self.sunset,
        }
    }
}

/// Compute a solar event for a calendar date at the given location.
///
/// Returns `None` when the event does not occur on that date.
pub fn solar_event_on(
    location: &LocationConfig,
    date: NaiveDate,
    kind: SolarEventKind,
) -> Result<Option<DateTime<Utc>>> {
    let coord = Coordinates::new(location.latitude, location.longitude).ok_or_else(|| {
        anyhow!(
            "Invalid coordinates: lat={:.4}, lon={:.4}",
            location.latitude,
            location.longitude
        )
    })?;
    let event = match kind {
        SolarEventKind::Sunrise => SolarEvent::Sunrise,
        SolarEventKind::Sunset => SolarEvent::Sunset,
    };
    let instant = SolarDay::new(coord, date).event_time(event);
    let drift = (instant.date_naive() - date).num_days().abs();
    Ok((drift <= MAX_EVENT_DRIFT_DAYS).then_some(instant))
}

/// Next sunrise and sunset strictly after `now`.
///
/// Computed once per scheduling cycle and shared by every solar rule.
pub fn next_sunrise_sunset(location: &LocationConfig, now: DateTime<Utc>) -> Result<SolarTimes> {
    let today = now.with_timezone(&location.timezone).date_naive();
    Ok(SolarTimes {
        sunrise: next_event_from(location, today, now, SolarEventKind::Sunrise)?,
        sunset: next_event_from(location, today, now, SolarEventKind::Sunset)?,
    })
}

/// First occurrence of `kind` strictly after `now`, starting the search at `date`.
///
/// Near the poles an event may not happen for weeks. After
/// `EVENT_SEARCH_DAYS` dates without one this returns `None`.
pub fn next_event_from(
    location: &LocationConfig,
    date: NaiveDate,
    now: DateTime<Utc>,
    kind: SolarEventKind,
) -> Result<Option<DateTime<Utc>>> {
    let candidates = date
        .iter_days()
        .take(EVENT_SEARCH_DAYS as usize)
        .map(|day| solar_event_on(location, day, kind));

    first_after(now, candidates)
}

/// Pull candidates lazily until one lies strictly after `now`.
///
/// Dates on which the event does not occur are passed over.
pub(crate) fn first_after<I>(now: DateTime<Utc>, candidates: I) -> Result<Option<DateTime<Utc>>>
where
    I: IntoIterator<Item = Result<Option<DateTime<Utc>>>>,
{
    for candidate in candidates {
        if let Some(candidate) = candidate?
            && candidate > now
        {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
