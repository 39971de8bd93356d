//! Fixed-width UTC timestamps.
//!
//! Millisecond precision and a constant layout, so timestamp strings compare
//! lexicographically in chronological order. Store `updatedAt` monotonicity
//! relies on that.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

static FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

pub(crate) fn utc_now() -> String {
    format_utc(OffsetDateTime::now_utc())
}

pub(crate) fn format_utc(ts: OffsetDateTime) -> String {
    ts.format(FORMAT)
        .unwrap_or_else(|_| "1970-01-01T00:00:00.000Z".to_string())
}
