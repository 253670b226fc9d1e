//! `application/x-www-form-urlencoded` body decoding

use url::form_urlencoded;

/// A single decoded form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Decoded value, empty when the field is missing or the body is unusable
    pub value: String,
    pub malformed: bool,
}

/// Decode `field` from a form body. The first occurrence wins.
///
/// A body that is not UTF-8 is treated as carrying no fields at all.
pub fn form_field(body: &[u8], field: &str) -> FormField {
    if std::str::from_utf8(body).is_err() {
        return FormField {
            value: String::new(),
            malformed: true,
        };
    }

    let value = form_urlencoded::parse(body)
        .find(|(key, _)| key == field)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();

    FormField {
        value,
        malformed: false,
    }
}
