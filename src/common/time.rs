use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Layout used for human-facing timestamps and for envelopes rebuilt from
/// stored rows, e.g. `2019-10-29 04:30:04 PDT`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render an instant in the civil timezone using [`TIME_FORMAT`].
#[must_use]
pub fn format_civil(instant: DateTime<Utc>, zone: Tz) -> String {
    instant.with_timezone(&zone).format(TIME_FORMAT).to_string()
}

/// Parse a [`TIME_FORMAT`] timestamp.
///
/// The zone token may be `UTC`/`GMT`/`Z`, a numeric offset (`-07`, `+0800`,
/// `-07:00`), an IANA name, or an abbreviation used by `civil` at that local
/// time (`PST`/`PDT` for `America/Los_Angeles`). Returns `None` if the text
/// does not match or the zone cannot be resolved.
#[must_use]
pub fn parse_civil(value: &str, civil: Tz) -> Option<DateTime<Utc>> {
    let (local, zone) = value.trim().rsplit_once(' ')?;
    let naive = NaiveDateTime::parse_from_str(local, NAIVE_FORMAT).ok()?;

    if matches!(zone, "UTC" | "GMT" | "Z") {
        return Some(naive.and_utc());
    }

    if let Some(offset) = parse_offset(zone) {
        return offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc));
    }

    if let Ok(named) = zone.parse::<Tz>() {
        return named
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc));
    }

    // The abbreviation also picks the right side of a DST fall-back overlap
    let candidates = civil.from_local_datetime(&naive);
    [candidates.earliest(), candidates.latest()]
        .into_iter()
        .flatten()
        .find(|dt| dt.format("%Z").to_string() == zone)
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let (sign, digits) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let digits = digits.replace(':', "");
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
