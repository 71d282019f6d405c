use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use either::Either;
use regex::Regex;

/// Span of time in seconds
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(try_from = "SerializedSeconds")]
pub struct Seconds(pub f64);

impl Seconds {
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.0)
    }

    pub fn as_millis(&self) -> i64 {
        (self.0 * 1_000.0).round() as i64
    }
}

/// Serialized representation of Seconds
/// Either 2.5 (float) or "2.5s" (String)
#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
struct SerializedSeconds {
    #[serde(with = "either::serde_untagged")]
    seconds: Either<f64, String>
}

#[derive(thiserror::Error, Debug)]
pub struct SecondsError;

impl Display for SecondsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Wrong duration format. Example of valid format: 2.5s")
    }
}

impl TryFrom<SerializedSeconds> for Seconds {
    type Error = SecondsError;

    fn try_from(value: SerializedSeconds) -> Result<Self, Self::Error> {
        let seconds = match value.seconds {
            Either::Right(value) => {
                let regex = Regex::new(r"^(\d+\.?\d*)s?$").unwrap();
                let cleaned_value = regex.captures(value.trim())
                    .map(|caps| Ok(caps[1].to_string()))
                    .unwrap_or(Err(SecondsError))?;

                f64::from_str(cleaned_value.as_str())
                    .map_err(|_| SecondsError)
            }
            Either::Left(value) => Ok(value)
        }?;

        // Zero would disable timeouts and make empty time windows
        if seconds <= 0.0 || !seconds.is_finite() {
            return Err(SecondsError);
        }

        Ok(Self(seconds))
    }
}
