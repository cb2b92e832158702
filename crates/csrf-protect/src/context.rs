//! Values the protection attaches to request extensions, and the helpers
//! handlers use to read them.

use crate::error::Error;
use http::Extensions;

/// Template variable name conventionally bound to [`template_field`]
pub const TEMPLATE_TAG: &str = "csrfField";

#[derive(Clone, Debug)]
pub(crate) struct MaskedToken(pub(crate) String);

#[derive(Clone, Debug)]
pub(crate) struct FieldName(pub(crate) String);

#[derive(Clone, Debug)]
pub(crate) struct FailureReason(pub(crate) Error);

#[derive(Clone, Copy, Debug)]
pub(crate) struct SkipCheck;

/// Masked token for a request that went through the protection
///
/// A new mask is drawn for every request, so embedding the value in
/// compressed responses does not leak the real token.
pub fn token(extensions: &Extensions) -> Option<String> {
    extensions.get::<MaskedToken>().map(|t| t.0.clone())
}

/// Hidden `<input>` carrying the masked token under the configured field name
///
/// Empty when the request did not go through the protection.
pub fn template_field(extensions: &Extensions) -> String {
    match (extensions.get::<FieldName>(), extensions.get::<MaskedToken>()) {
        (Some(name), Some(token)) => format!(
            r#"<input type="hidden" name="{}" value="{}">"#,
            escape_attr(&name.0),
            escape_attr(&token.0)
        ),
        _ => String::new(),
    }
}

/// Why the request was rejected, for use inside a custom error handler
pub fn failure_reason(extensions: &Extensions) -> Option<Error> {
    extensions.get::<FailureReason>().map(|r| r.0.clone())
}

/// Exempt this request from token checks
///
/// Must be called before the request reaches the protection, e.g. from an
/// outer middleware for webhook endpoints. The token and cookie are still
/// issued.
pub fn unsafe_skip_check(extensions: &mut Extensions) {
    extensions.insert(SkipCheck);
}

pub(crate) fn skip_check(extensions: &Extensions) -> bool {
    extensions.get::<SkipCheck>().is_some()
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_field() {
        let mut extensions = Extensions::new();
        assert_eq!(template_field(&extensions), "");

        extensions.insert(FieldName("_csrf".to_string()));
        extensions.insert(MaskedToken("abc+/=".to_string()));
        assert_eq!(
            template_field(&extensions),
            r#"<input type="hidden" name="_csrf" value="abc+/=">"#
        );
    }

    #[test]
    fn test_template_field_escapes_name() {
        let mut extensions = Extensions::new();
        extensions.insert(FieldName(r#"a"><script>"#.to_string()));
        extensions.insert(MaskedToken("t".to_string()));
        assert!(!template_field(&extensions).contains("<script>"));
    }

    #[test]
    fn test_skip_and_reason() {
        let mut extensions = Extensions::new();
        assert!(!skip_check(&extensions));
        assert_eq!(failure_reason(&extensions), None);

        unsafe_skip_check(&mut extensions);
        extensions.insert(FailureReason(Error::BadToken));
        assert!(skip_check(&extensions));
        assert_eq!(failure_reason(&extensions), Some(Error::BadToken));
    }
}
