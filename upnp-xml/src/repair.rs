//! Textual repairs for malformed bodies sent by real devices
//!
//! Each function returns `Cow::Borrowed` when nothing had to change, so
//! callers can tell whether a retry is worth it.

use std::borrow::Cow;

use tracing::warn;

/// Namespace of GENA propertysets
pub const EVENT_NAMESPACE: &str = "urn:schemas-upnp-org:event-1-0";

const PREDEFINED_ENTITIES: [&str; 5] = ["amp;", "lt;", "gt;", "quot;", "apos;"];

const LAST_CHANGE_OPEN: &str = "<LastChange>";
const LAST_CHANGE_CLOSE: &str = "</LastChange>";

const TRUNCATED_ENVELOPE_END: &str = "</s:Envelop";

/// Escape the five XML special characters
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

fn starts_with_entity(rest: &str) -> bool {
    if PREDEFINED_ENTITIES.iter().any(|e| rest.starts_with(e)) {
        return true;
    }

    let Some(reference) = rest.strip_prefix('#') else {
        return false;
    };
    let (digits, is_digit): (&str, fn(&char) -> bool) = match reference.strip_prefix('x') {
        Some(hex) => (hex, char::is_ascii_hexdigit),
        None => (reference, char::is_ascii_digit),
    };
    let len = digits.chars().take_while(is_digit).count();
    len > 0 && digits[len..].starts_with(';')
}

/// Encode every `&` that does not start a predefined entity or a character
/// reference as `&amp;`.
///
/// Typical offender: an unescaped URL with a query string inside
/// `CurrentURI`, e.g. `...wav?profile_id=0&convert=wav`.
pub fn fix_xml_entities(xml: &str) -> Cow<'_, str> {
    if xml
        .match_indices('&')
        .all(|(index, _)| starts_with_entity(&xml[index + 1..]))
    {
        return Cow::Borrowed(xml);
    }

    let mut out = String::with_capacity(xml.len() + 16);
    let mut last = 0;
    for (index, _) in xml.match_indices('&') {
        out.push_str(&xml[last..index]);
        if starts_with_entity(&xml[index + 1..]) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        last = index + 1;
    }
    out.push_str(&xml[last..]);
    Cow::Owned(out)
}

/// Repair a `LastChange` value that was not XML-encoded by the device.
///
/// The content between the first `<LastChange>` and the last
/// `</LastChange>` is examined:
///
/// - content starting with `<` is raw nested XML and gets escaped;
/// - otherwise any `<` and `>` are deleted (garbage markup injected by some
///   renderers).
///
/// When content changed, a fresh propertyset holding only the repaired
/// `LastChange` property is returned. Other properties of the original body
/// are dropped.
pub fn fix_last_change(xml: &str) -> Cow<'_, str> {
    let Some(open) = xml.find(LAST_CHANGE_OPEN) else {
        return Cow::Borrowed(xml);
    };
    let content_start = open + LAST_CHANGE_OPEN.len();
    let Some(close) = xml.rfind(LAST_CHANGE_CLOSE) else {
        return Cow::Borrowed(xml);
    };
    if close < content_start {
        return Cow::Borrowed(xml);
    }

    let content = xml[content_start..close].trim();
    if content.is_empty() {
        return Cow::Borrowed(xml);
    }

    let fixed = if content.starts_with('<') {
        warn!("Fixed LastChange that was not XML encoded");
        escape_xml(content).into_owned()
    } else {
        let stripped: String = content.chars().filter(|c| !matches!(c, '<' | '>')).collect();
        if stripped == content {
            return Cow::Borrowed(xml);
        }
        warn!("Deleted invalid characters in LastChange");
        stripped
    };

    Cow::Owned(format!(
        r#"<?xml version="1.0" encoding="utf-8"?><e:propertyset xmlns:e="{}"><e:property><LastChange>{}</LastChange></e:property></e:propertyset>"#,
        EVENT_NAMESPACE, fixed
    ))
}

/// Complete an envelope whose final `</s:Envelope>` lost its last two characters
pub fn fix_truncated_envelope(xml: &str) -> Cow<'_, str> {
    if xml.ends_with(TRUNCATED_ENVELOPE_END) {
        warn!("Completed truncated </s:Envelope> end tag");
        Cow::Owned(format!("{}e>", xml))
    } else {
        Cow::Borrowed(xml)
    }
}
