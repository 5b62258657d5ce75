//! Decoded uplink records.
//!
//! A record is an insertion-ordered mapping from field name to rendered
//! value. The first two entries are always the raw body and the envelope
//! receipt timestamp; after that, every field of the decoder's schema is
//! present, defaulting to empty text when the walk never reached it.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::slice;

/// A rendered field value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// An unsigned integer field.
    Integer(u64),

    /// A text field, also used for composite bitfield and payload blocks.
    Text(String),
}

/// One decoded message, as an insertion-ordered field map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedMessage {
    fields: Vec<(&'static str, Value)>,
}

impl Value {
    /// Returns this value as text, if it is text.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Value;
    /// assert_eq!(Some("beer"), Value::Text("beer".to_string()).as_text());
    /// assert_eq!(None, Value::Integer(2).as_text());
    /// ```
    pub fn as_text(&self) -> Option<&str> {
        match *self {
            Value::Text(ref text) => Some(text),
            Value::Integer(_) => None,
        }
    }

    /// Returns this value as an integer, if it is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Value;
    /// assert_eq!(Some(2), Value::Integer(2).as_integer());
    /// assert_eq!(None, Value::Text("beer".to_string()).as_integer());
    /// ```
    pub fn as_integer(&self) -> Option<u64> {
        match *self {
            Value::Integer(n) => Some(n),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(ref text) => write!(f, "{}", text),
        }
    }
}

impl DecodedMessage {
    pub(crate) fn new() -> DecodedMessage {
        DecodedMessage::default()
    }

    /// Appends a field. The caller keeps names unique.
    pub(crate) fn push(&mut self, name: &'static str, value: Value) {
        self.fields.push((name, value));
    }

    /// Replaces an existing field's value in place, or appends it.
    pub(crate) fn set(&mut self, name: &'static str, value: Value) {
        if let Some(entry) = self.fields.iter_mut().find(|entry| entry.0 == name) {
            entry.1 = value;
            return;
        }
        self.fields.push((name, value));
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|entry| entry.0 == name)
    }

    /// Returns the value for the given field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|entry| entry.0 == name)
            .map(|entry| &entry.1)
    }

    /// Returns the field's value as text, if the field exists and is text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.as_text())
    }

    /// Returns the field's value as an integer, if the field exists and is one.
    pub fn integer(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(|value| value.as_integer())
    }

    /// Returns the device identity, if the walk decoded one.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::{Decoder, Passthrough, Schema};
    /// let decoder = Decoder::new(Schema::get(1).unwrap(), Box::new(Passthrough));
    /// let record = decoder.decode(include_str!("../fixtures/v1-sleep.msg")).unwrap();
    /// assert_eq!(Some("HEWGHP"), record.device_id());
    /// ```
    pub fn device_id(&self) -> Option<&str> {
        self.text("device_id").filter(|id| !id.is_empty())
    }

    /// Returns the message sequence number, if the walk decoded one.
    pub fn seq_num(&self) -> Option<u64> {
        self.integer("seq_num")
    }

    /// Returns the fields in insertion order.
    pub fn iter(&self) -> slice::Iter<(&'static str, Value)> {
        self.fields.iter()
    }

    /// Returns the number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for DecodedMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for &(name, ref value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    fn record() -> DecodedMessage {
        let mut record = DecodedMessage::new();
        record.push("data_msg", Value::Text("ff00".to_string()));
        record.push("seq_num", Value::Integer(136));
        record.push("trumi_st", Value::Text("TRUMI_STATE_SLEEP".to_string()));
        record
    }

    #[test]
    fn accessors() {
        let record = record();
        assert_eq!(Some(136), record.integer("seq_num"));
        assert_eq!(Some(136), record.seq_num());
        assert_eq!(Some("ff00"), record.text("data_msg"));
        assert_eq!(None, record.text("seq_num"));
        assert_eq!(None, record.get("nope"));
        assert_eq!(3, record.len());
    }

    #[test]
    fn set_replaces_in_place() {
        let mut record = record();
        record.set("trumi_st", Value::Text("VARIOUS".to_string()));
        assert_eq!(Some("VARIOUS"), record.text("trumi_st"));
        assert_eq!(3, record.len());
        let names: Vec<&str> = record.iter().map(|entry| entry.0).collect();
        assert_eq!(vec!["data_msg", "seq_num", "trumi_st"], names);
    }

    #[test]
    fn serializes_in_insertion_order() {
        let json = serde_json::to_string(&record()).unwrap();
        assert_eq!(
            "{\"data_msg\":\"ff00\",\"seq_num\":136,\"trumi_st\":\"TRUMI_STATE_SLEEP\"}",
            json
        );
    }
}
