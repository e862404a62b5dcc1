//! Formatting helpers shared by the emitters

use std::borrow::Cow;

/// Milliseconds as seconds with exactly three decimals (`1234` -> `1.234`)
pub fn format_time(millis: i64) -> String {
    format!("{:.3}", millis as f64 / 1000.0)
}

/// Milliseconds as `#,##0.0 seconds`
pub fn format_seconds(millis: i64) -> String {
    let tenths = (millis as f64 / 100.0).round() as i64;
    let sign = if tenths < 0 { "-" } else { "" };
    let tenths = tenths.abs();
    format!(
        "{}{}.{} seconds",
        sign,
        group_thousands(tenths / 10),
        tenths % 10
    )
}

fn group_thousands(value: i64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

#[derive(PartialEq, Clone, Copy)]
enum CharKind {
    Upper,
    Lower,
    Digit,
    Other,
}

impl CharKind {
    fn of(c: char) -> Self {
        if c.is_uppercase() {
            CharKind::Upper
        } else if c.is_lowercase() {
            CharKind::Lower
        } else if c.is_numeric() {
            CharKind::Digit
        } else {
            CharKind::Other
        }
    }
}

/// Split an identifier where the character type changes, joining the words
/// with spaces: `BrowserTestSuite` -> `Browser Test Suite`,
/// `HTMLParserTest` -> `HTML Parser Test`.
pub fn split_camel_case(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous: Option<CharKind> = None;

    for c in name.chars() {
        let kind = CharKind::of(c);
        match previous {
            Some(prev) if prev != kind => {
                if prev == CharKind::Upper && kind == CharKind::Lower {
                    // An uppercase run ending in a capitalized word: "HTMLParser"
                    if current.chars().count() > 1 {
                        if let Some(last) = current.pop() {
                            words.push(std::mem::take(&mut current));
                            current.push(last);
                        }
                    }
                } else {
                    words.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
        current.push(c);
        previous = Some(kind);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "0.000")]
    #[test_case(7, "0.007")]
    #[test_case(1234, "1.234")]
    #[test_case(60_000, "60.000")]
    fn test_format_time(millis: i64, expected: &str) {
        assert_eq!(format_time(millis), expected);
    }

    #[test_case(0, "0.0 seconds")]
    #[test_case(1_250, "1.3 seconds")]
    #[test_case(1_234_567, "1,234.6 seconds")]
    fn test_format_seconds(millis: i64, expected: &str) {
        assert_eq!(format_seconds(millis), expected);
    }

    #[test_case("BrowserTestSuite", "Browser Test Suite")]
    #[test_case("HTMLParserTest", "HTML Parser Test")]
    #[test_case("Suite2Run", "Suite 2 Run")]
    #[test_case("lower", "lower")]
    #[test_case("", "")]
    fn test_split_camel_case(name: &str, expected: &str) {
        assert_eq!(split_camel_case(name), expected);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"a" & 'b'</b>"#),
            "&lt;b&gt;&quot;a&quot; &amp; &apos;b&apos;&lt;/b&gt;"
        );
    }
}
