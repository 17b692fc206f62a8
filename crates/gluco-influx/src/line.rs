//! Line protocol encoding.
//!
//! `measurement[,tag=value...] field=value[,field=value...] timestamp`, timestamps in
//! nanoseconds. Tags and fields come out in key order.

use gluco_core::types::Point;

use crate::{InfluxError, Result};

/// Encodes one point.
///
/// Non-finite field values cannot be stored and are dropped; a point left without
/// fields is rejected.
pub fn encode(point: &Point) -> Result<String> {
    if point.measurement.is_empty() {
        return Err(InfluxError::InvalidPoint("empty measurement".into()));
    }

    let mut line = String::with_capacity(64);
    escape_into(&mut line, &point.measurement, &[',', ' ']);

    for (key, value) in &point.tags {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        line.push(',');
        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        escape_into(&mut line, value, &[',', '=', ' ']);
    }

    let mut separator = ' ';
    for (key, value) in point.fields.iter().filter(|(_, v)| v.is_finite()) {
        line.push(separator);
        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push_str(&format!("={value:?}"));
        separator = ',';
    }

    if separator == ' ' {
        return Err(InfluxError::InvalidPoint(
            format!("'{}' has no finite fields", point.measurement).into(),
        ));
    }

    line.push_str(&format!(" {}", point.timestamp.as_nanosecond()));
    Ok(line)
}

fn escape_into(out: &mut String, value: &str, special: &[char]) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use gluco_core::types::{GlucoseSample, ProviderType, Reading, UserId};
    use jiff::Timestamp;

    use super::*;

    #[test]
    fn encodes_glucose_reading() {
        let observed_at = Timestamp::from_second(1_700_000_000).unwrap();
        let reading = Reading::new(
            UserId::new(42),
            ProviderType::Dexcom,
            GlucoseSample::new(5.6, Some(observed_at)),
        );

        let line = encode(&Point::from_reading(&reading)).unwrap();
        assert_eq!(
            line,
            "glucose,provider_type=dexcom,user_id=42 value=5.6 1700000000000000000"
        );
    }

    #[test]
    fn escapes_special_characters() {
        let point = Point::new("blood glucose", Timestamp::UNIX_EPOCH)
            .with_tag("site name", "a,b=c")
            .with_field("mmol/L value", 7.0);

        assert_eq!(
            encode(&point).unwrap(),
            r"blood\ glucose,site\ name=a\,b\=c mmol/L\ value=7.0 0"
        );
    }

    #[test]
    fn escapes_backslashes_before_separators() {
        let point = Point::new(r"glu\cose", Timestamp::UNIX_EPOCH)
            .with_tag("source", r"C:\")
            .with_tag(r"dev\ice", r"a\,b")
            .with_field("value", 4.2);

        assert_eq!(
            encode(&point).unwrap(),
            r"glu\\cose,dev\\ice=a\\\,b,source=C:\\ value=4.2 0"
        );
    }

    #[test]
    fn drops_non_finite_fields() {
        let point = Point::new("glucose", Timestamp::UNIX_EPOCH)
            .with_field("value", 5.5)
            .with_field("trend", f64::NAN);
        assert_eq!(encode(&point).unwrap(), "glucose value=5.5 0");

        let point = Point::new("glucose", Timestamp::UNIX_EPOCH).with_field("value", f64::INFINITY);
        assert!(encode(&point).is_err());
    }
}
