//! Campaign calling-window evaluation

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use shared::Campaign;

/// Whether a campaign may dial at the given local instant.
///
/// True iff the campaign is active, the local hour falls inside the
/// inclusive `[dial_start_hour, dial_end_hour]` window, and the local
/// weekday (Sunday = 0) is one of the campaign's dial days.
pub fn is_schedulable<Tz: TimeZone>(campaign: &Campaign, local: &DateTime<Tz>) -> bool {
    if !campaign.active {
        return false;
    }

    let hour = local.hour();
    let weekday = local.weekday().num_days_from_sunday();

    hour >= campaign.dial_start_hour
        && hour <= campaign.dial_end_hour
        && campaign.dial_days.contains(&weekday)
}
