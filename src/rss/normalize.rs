//! Turning parsed feed items into posts.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Utc};
use tracing::debug;
use uuid::Uuid;

use super::types::{NewPost, ParsedItem};

/// RFC 1123 after the weekday, with a numeric zone: `02 Jan 2006 15:04:05 -0700`.
const RFC1123Z_DATE: &str = "%d %b %Y %H:%M:%S %z";

/// RFC 1123 after the weekday, without the zone, which is handled separately.
const RFC1123_DATE_NO_ZONE: &str = "%d %b %Y %H:%M:%S";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Years that keep the fixed-width storage encoding.
const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

/// Offset in hours for a named zone.
///
/// Unknown alphabetic zones are read as UTC.
fn zone_offset_hours(zone: &str) -> Option<i32> {
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let hours = match zone.to_ascii_uppercase().as_str() {
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => 0,
    };
    Some(hours)
}

/// Drop the leading `Ddd, `.
///
/// The weekday must be a day name but need not match the date; feeds get it
/// wrong often enough.
fn strip_weekday(raw: &str) -> Option<&str> {
    let (day, rest) = raw.split_once(',')?;
    WEEKDAYS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(day.trim()))
        .then_some(rest.trim_start())
}

fn parse_named_zone(date: &str) -> Option<DateTime<Utc>> {
    let (stamp, zone) = date.rsplit_once(' ')?;
    let hours = zone_offset_hours(zone)?;
    let naive = NaiveDateTime::parse_from_str(stamp.trim_end(), RFC1123_DATE_NO_ZONE).ok()?;
    let offset = FixedOffset::east_opt(hours * 3600)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decode a `pubDate`.
///
/// Tries RFC 1123 with a numeric zone, then with a named zone, and finally
/// settles for `now`. Years outside 0000-9999 also fall back to `now`.
/// Never fails.
pub fn parse_pub_date(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return now;
    };

    let parsed = strip_weekday(raw).and_then(|date| {
        DateTime::parse_from_str(date, RFC1123Z_DATE)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| parse_named_zone(date))
    });

    match parsed {
        Some(dt) if (MIN_YEAR..=MAX_YEAR).contains(&dt.year()) => dt,
        Some(dt) => {
            debug!("pubDate {:?} is out of range ({}), using ingestion time", raw, dt);
            now
        }
        None => {
            debug!("Unparseable pubDate {:?}, using ingestion time", raw);
            now
        }
    }
}

/// Build the post for an item of `feed_id`.
///
/// Returns `None` for items without a link: the link is the post's identity.
pub fn normalize_item(feed_id: Uuid, item: &ParsedItem, now: DateTime<Utc>) -> Option<NewPost> {
    let link = item.link.as_deref().map(str::trim).filter(|l| !l.is_empty())?;

    let mut post = NewPost::new(
        feed_id,
        item.title.as_str(),
        link,
        parse_pub_date(item.pub_date.as_deref(), now),
        now,
    );
    if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
        post = post.with_description(description);
    }
    Some(post)
}
