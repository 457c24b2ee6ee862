use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// HumanDuration
// ---------------------------------------------------------------------------

/// A duration such as `"500ms"`, `"0.5"`, `"30s"`, `"5m"`, `"1h"` or `"2d"`.
///
/// A bare decimal is seconds with millisecond precision. `Display` picks the
/// largest unit that keeps the value whole and writes sub-second values as
/// bare decimals, the only fractional form fluentd's time parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(Duration);

impl HumanDuration {
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Whole seconds; sub-second durations round down.
    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

impl From<Duration> for HumanDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl FromStr for HumanDuration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("empty duration string");
        }

        if let Some((whole, frac)) = s.split_once('.') {
            return decimal_seconds(whole, frac)
                .map(|ms| Self(Duration::from_millis(ms)))
                .ok_or_else(|| anyhow::anyhow!("invalid decimal duration: {s:?}"));
        }

        let (num_part, suffix) = split_number_suffix(s)?;
        let value: u64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid number in duration: {s:?}"))?;

        let millis_per_unit: u64 = match suffix {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            _ => {
                anyhow::bail!("unsupported duration suffix {suffix:?} in {s:?} (expected ms/s/m/h/d)")
            }
        };
        let millis = value
            .checked_mul(millis_per_unit)
            .ok_or_else(|| anyhow::anyhow!("duration out of range: {s:?}"))?;

        Ok(Self(Duration::from_millis(millis)))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        if millis == 0 {
            return write!(f, "0s");
        }
        if !millis.is_multiple_of(1_000) {
            let frac = format!("{:03}", millis % 1_000);
            return write!(f, "{}.{}", millis / 1_000, frac.trim_end_matches('0'));
        }
        let secs = millis / 1_000;
        if secs.is_multiple_of(86_400) {
            write!(f, "{}d", secs / 86_400)
        } else if secs.is_multiple_of(3_600) {
            write!(f, "{}h", secs / 3_600)
        } else if secs.is_multiple_of(60) {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{secs}s")
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ByteSize
// ---------------------------------------------------------------------------

/// A byte size such as `"8m"`, `"256MB"`, `"2g"` or a plain byte count.
///
/// Suffixes are case-insensitive and binary (`k` = 1024). The trailing `B`
/// is optional, so the collector-style `"8m"` and the human `"8MB"` parse to
/// the same value. `Display` renders the collector-style short form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(u64);

impl ByteSize {
    pub fn as_bytes(&self) -> u64 {
        self.0
    }
}

impl From<ByteSize> for u64 {
    fn from(bs: ByteSize) -> Self {
        bs.0
    }
}

impl From<u64> for ByteSize {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl FromStr for ByteSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("empty byte-size string");
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            let value: u64 = s
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid number in byte-size: {s:?}"))?;
            return Ok(Self(value));
        }

        let upper = s.to_ascii_uppercase();
        let (num_part, suffix) = split_number_suffix(&upper)?;
        let value: u64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid number in byte-size: {s:?}"))?;

        let unit: u64 = match suffix {
            "B" => 1,
            "K" | "KB" => 1 << 10,
            "M" | "MB" => 1 << 20,
            "G" | "GB" => 1 << 30,
            _ => anyhow::bail!(
                "unsupported byte-size suffix {suffix:?} in {s:?} (expected B/K/M/G)"
            ),
        };
        let bytes = value
            .checked_mul(unit)
            .ok_or_else(|| anyhow::anyhow!("byte-size out of range: {s:?}"))?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        if b == 0 {
            return write!(f, "0");
        }
        if b.is_multiple_of(1024 * 1024 * 1024) {
            write!(f, "{}g", b / (1024 * 1024 * 1024))
        } else if b.is_multiple_of(1024 * 1024) {
            write!(f, "{}m", b / (1024 * 1024))
        } else if b.is_multiple_of(1024) {
            write!(f, "{}k", b / 1024)
        } else {
            write!(f, "{b}")
        }
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ByteSizeVisitor;

        impl de::Visitor<'_> for ByteSizeVisitor {
            type Value = ByteSize;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte size string like \"8m\" or an integer byte count")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ByteSize, E> {
                Ok(ByteSize(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ByteSize, E> {
                u64::try_from(v)
                    .map(ByteSize)
                    .map_err(|_| E::custom(format!("negative byte size: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ByteSize, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ByteSizeVisitor)
    }
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// `"1.25"` seconds as milliseconds; at most three fractional digits.
fn decimal_seconds(whole: &str, frac: &str) -> Option<u64> {
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !digits(frac) || frac.len() > 3 {
        return None;
    }
    let frac_ms: u64 = format!("{frac:0<3}").parse().ok()?;
    whole.parse::<u64>().ok()?.checked_mul(1_000)?.checked_add(frac_ms)
}

/// Split a string like `"30s"` into `("30", "s")`.
/// Returns an error if the string is all-digits or all-letters.
fn split_number_suffix(s: &str) -> anyhow::Result<(&str, &str)> {
    let idx = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| anyhow::anyhow!("missing suffix in {s:?}"))?;
    if idx == 0 {
        anyhow::bail!("missing numeric part in {s:?}");
    }
    Ok((&s[..idx], &s[idx..]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- HumanDuration --

    #[test]
    fn duration_seconds() {
        let d: HumanDuration = "30s".parse().unwrap();
        assert_eq!(d.as_duration(), Duration::from_secs(30));
        assert_eq!(d.to_string(), "30s");
    }

    #[test]
    fn duration_collapses_to_largest_unit() {
        let d: HumanDuration = "60m".parse().unwrap();
        assert_eq!(d.as_secs(), 3600);
        assert_eq!(d.to_string(), "1h");
    }

    #[test]
    fn duration_milliseconds() {
        let d: HumanDuration = "500ms".parse().unwrap();
        assert_eq!(d.as_duration(), Duration::from_millis(500));
        assert_eq!(d.as_secs(), 0);
        assert_eq!(d.to_string(), "0.5");
        assert_eq!(d, "0.5".parse().unwrap());
        let d: HumanDuration = "1250ms".parse().unwrap();
        assert_eq!(d.to_string(), "1.25");
        let d: HumanDuration = "2000ms".parse().unwrap();
        assert_eq!(d.to_string(), "2s");
        assert!("0.1234".parse::<HumanDuration>().is_err());
        assert!(".5".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn duration_errors() {
        assert!("99999999999999999d".parse::<HumanDuration>().is_err());
        assert!("".parse::<HumanDuration>().is_err());
        assert!("30".parse::<HumanDuration>().is_err());
        assert!("30x".parse::<HumanDuration>().is_err());
        assert!("s".parse::<HumanDuration>().is_err());
    }

    // -- ByteSize --

    #[test]
    fn bytesize_collector_style() {
        let b: ByteSize = "8m".parse().unwrap();
        assert_eq!(b.as_bytes(), 8 * 1024 * 1024);
        assert_eq!(b.to_string(), "8m");
    }

    #[test]
    fn bytesize_human_style() {
        let b: ByteSize = "256MB".parse().unwrap();
        assert_eq!(b, "256m".parse().unwrap());
        let g: ByteSize = "2GB".parse().unwrap();
        assert_eq!(g.to_string(), "2g");
    }

    #[test]
    fn bytesize_plain_integer() {
        let b: ByteSize = "800000001".parse().unwrap();
        assert_eq!(b.as_bytes(), 800_000_001);
        assert_eq!(b.to_string(), "800000001");

        let b: ByteSize = "800000000".parse().unwrap();
        assert_eq!(b.to_string(), "781250k");
        assert_eq!(b, b.to_string().parse().unwrap());
    }

    #[test]
    fn bytesize_overflow_is_an_error() {
        let err = "99999999999G".parse::<ByteSize>().unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
        assert!("18446744073709551615".parse::<ByteSize>().is_ok());
        assert!("18446744073709551616".parse::<ByteSize>().is_err());
    }

    #[test]
    fn bytesize_errors() {
        assert!("".parse::<ByteSize>().is_err());
        assert!("256TB".parse::<ByteSize>().is_err());
        assert!("MB".parse::<ByteSize>().is_err());
    }

    #[test]
    fn bytesize_from_toml_integer_or_string() {
        #[derive(Deserialize)]
        struct Holder {
            a: ByteSize,
            b: ByteSize,
        }
        let h: Holder = toml::from_str("a = 1024\nb = \"1k\"").unwrap();
        assert_eq!(h.a, h.b);
    }

    #[test]
    fn serde_roundtrip_duration() {
        let d: HumanDuration = "30s".parse().unwrap();
        let json = serde_json::to_string(&d).unwrap();
        let d2: HumanDuration = serde_json::from_str(&json).unwrap();
        assert_eq!(d, d2);
    }
}
