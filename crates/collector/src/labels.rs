/// Placeholder published for any label the API left out, so every series of a
/// metric keeps the same label shape.
pub const NULL_LABEL: &str = "null";

pub fn or_null(value: Option<&str>) -> &str {
    value.unwrap_or(NULL_LABEL)
}

/// First present value of `primary` and `fallback`, or the null sentinel.
pub fn first_or_null<'a>(primary: Option<&'a str>, fallback: Option<&'a str>) -> &'a str {
    primary.or(fallback).unwrap_or(NULL_LABEL)
}
