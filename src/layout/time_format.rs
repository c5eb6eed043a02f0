// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Translate reference-date time layouts into strftime strings.
//!
//! Timestamp formats in templates are written by example, using the reference time
//! `Mon Jan 2 15:04:05 MST 2006` (`01/02 03:04:05PM '06 -0700`). For example
//! `2006-01-02 15:04:05.000` becomes `%Y-%m-%d %H:%M:%S.%3f`.
//!
//! A format that already contains a `%` is assumed to be a strftime string and used verbatim.

/// Known reference tokens, longest first where they share a prefix.
const TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("2006", "%Y"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("_2", "%e"),
    ("15", "%H"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
    ("PM", "%p"),
    ("pm", "%P"),
];

/// Translate a time layout into a strftime string understood by [`jiff`].
pub fn to_strftime(layout: &str) -> String {
    if layout.contains('%') {
        return layout.to_string();
    }

    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    'scan: while let Some(ch) = rest.chars().next() {
        if let Some((directive, len)) = fractional_seconds(rest) {
            out.push_str(&directive);
            rest = &rest[len..];
            continue;
        }

        for (token, directive) in TOKENS {
            if rest.starts_with(token) {
                out.push_str(directive);
                rest = &rest[token.len()..];
                continue 'scan;
            }
        }

        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// `.000` style (always printed) or `.999` style (trailing zeros dropped) fractional seconds.
fn fractional_seconds(s: &str) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || (bytes[0] != b'.' && bytes[0] != b',') {
        return None;
    }

    let digit = bytes[1];
    if digit != b'0' && digit != b'9' {
        return None;
    }

    let width = bytes[1..].iter().take_while(|b| **b == digit).count();
    let after = 1 + width;
    if width > 9 || bytes.get(after).is_some_and(u8::is_ascii_digit) {
        return None;
    }

    let separator = bytes[0] as char;
    let directive = if digit == b'0' {
        format!("{separator}%{width}f")
    } else {
        // jiff only knows a dot for the optional form
        format!("%.{width}f")
    };
    Some((directive, after))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format() {
        assert_eq!(
            to_strftime("2006-01-02 15:04:05.000"),
            "%Y-%m-%d %H:%M:%S.%3f"
        );
    }

    #[test]
    fn test_date_only() {
        assert_eq!(to_strftime("2006-01-02"), "%Y-%m-%d");
        assert_eq!(to_strftime("20060102"), "%Y%m%d");
    }

    #[test]
    fn test_names_and_zones() {
        assert_eq!(to_strftime("Mon Jan _2 15:04:05 MST 2006"), "%a %b %e %H:%M:%S %Z %Y");
        assert_eq!(to_strftime("Monday, January 2"), "%A, %B %-d");
        assert_eq!(to_strftime("03:04PM -07:00"), "%I:%M%p %:z");
        assert_eq!(to_strftime("3:4:5 pm -0700"), "%-I:%-M:%-S %P %z");
        assert_eq!(to_strftime("06/1/2 day 002"), "%y/%-m/%-d day %j");
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(to_strftime("05.000000"), "%S.%6f");
        assert_eq!(to_strftime("05,000"), "%S,%3f");
        assert_eq!(to_strftime("05.999"), "%S%.3f");
        // digits after the run mean it is not a fraction
        assert_eq!(to_strftime(".0001"), ".00%m");
    }

    #[test]
    fn test_literals_and_strftime_passthrough() {
        assert_eq!(to_strftime("T"), "T");
        assert_eq!(to_strftime("at 15h"), "at %Hh");
        assert_eq!(to_strftime("%Y/%m"), "%Y/%m");
        assert_eq!(to_strftime(""), "");
    }
}
