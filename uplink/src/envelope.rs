//! The text envelope wrapped around every uplink message.
//!
//! The broker hands messages over as plain text: the receipt timestamp
//! written by the gateway, a literal ` : Msg: ` marker, and the hex-encoded
//! protocol body. Anything that does not match that shape is rejected here,
//! before any field decoding happens.

use chrono::NaiveDateTime;
use regex::Regex;

/// The regular expression used to match the outer message envelope.
pub const ENVELOPE_REGEX: &str =
    r"^(\w{3}\s+\w{3}\s+\d{1,2} \d{2}:\d{2}:\d{2} \d{4}) : Msg: (.*)$";

const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// A matched envelope: the receipt timestamp and the raw hex body.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    timestamp: String,
    body: String,
}

/// An error returned when matching the envelope.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The message does not match the envelope pattern.
    #[fail(display = "message does not match the envelope pattern: {}", _0)]
    Mismatch(String),
}

impl Envelope {
    /// Matches a raw message against the envelope pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Envelope;
    /// let envelope = Envelope::new("Mon Apr  8 07:32:39 2024 : Msg: 48455747").unwrap();
    /// assert_eq!("Mon Apr  8 07:32:39 2024", envelope.timestamp());
    /// assert_eq!("48455747", envelope.body());
    /// assert!(Envelope::new("not a logger message").is_err());
    /// ```
    pub fn new(message: &str) -> Result<Envelope, Error> {
        lazy_static! {
            static ref RE: Regex = Regex::new(ENVELOPE_REGEX).unwrap();
        }
        if let Some(captures) = RE.captures(message.trim_end()) {
            Ok(Envelope {
                timestamp: captures[1].to_string(),
                body: captures[2].to_string(),
            })
        } else {
            Err(Error::Mismatch(message.to_string()))
        }
    }

    /// Returns the receipt timestamp, verbatim.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Envelope;
    /// let envelope = Envelope::new("Mon Apr  8 07:32:39 2024 : Msg: ff").unwrap();
    /// assert_eq!("Mon Apr  8 07:32:39 2024", envelope.timestamp());
    /// ```
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns the hex body of the message.
    ///
    /// The body is whatever followed the marker; it is not validated as hex
    /// here, since bad bytes are reported per field during decoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Envelope;
    /// let envelope = Envelope::new("Mon Apr  8 07:32:39 2024 : Msg: ff00").unwrap();
    /// assert_eq!("ff00", envelope.body());
    /// ```
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the receipt timestamp parsed to a datetime, if it parses.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Envelope;
    /// let envelope = Envelope::new("Mon Apr  8 07:32:39 2024 : Msg: ff").unwrap();
    /// let datetime = envelope.datetime().unwrap();
    /// assert_eq!("2024-04-08 07:32:39", datetime.format("%Y-%m-%d %H:%M:%S").to_string());
    /// ```
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches() {
        let envelope = Envelope::new("Thu Apr  4 09:59:09 2024 : Msg: 484557474850").unwrap();
        assert_eq!("Thu Apr  4 09:59:09 2024", envelope.timestamp());
        assert_eq!("484557474850", envelope.body());
    }

    #[test]
    fn single_digit_day() {
        let envelope = Envelope::new("Mon Apr  8 10:59:24 2024 : Msg: ff").unwrap();
        assert_eq!("Mon Apr  8 10:59:24 2024", envelope.timestamp());
    }

    #[test]
    fn empty_body() {
        let envelope = Envelope::new("Mon Apr  8 10:59:24 2024 : Msg: ").unwrap();
        assert_eq!("", envelope.body());
    }

    #[test]
    fn mismatch() {
        assert_eq!(
            Error::Mismatch("beers".to_string()),
            Envelope::new("beers").unwrap_err()
        );
        assert!(Envelope::new("").is_err());
        assert!(Envelope::new("Mon Apr  8 10:59:24 2024 Msg: ff").is_err());
    }

    #[test]
    fn datetime() {
        let envelope = Envelope::new("Mon Apr  8 10:59:24 2024 : Msg: ff").unwrap();
        assert!(envelope.datetime().is_some());
    }

    #[test]
    fn trailing_newline() {
        let envelope = Envelope::new("Mon Apr  8 10:59:24 2024 : Msg: ff\n").unwrap();
        assert_eq!("ff", envelope.body());
    }
}
