use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};

/// All timestamps are stored as naive UTC.
pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// RFC 3339, or a browser `datetime-local` value (`YYYY-MM-DDTHH:MM[:SS]`)
/// read as UTC.
pub(crate) fn parse_datetime_flexible(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(to_primitive_utc(value));
    }

    PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
        .or_else(|_| {
            PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        })
        .ok()
}
