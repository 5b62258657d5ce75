//! The device registry: who reported, when, and with which sequences.
//!
//! Records are keyed by device identity and sequence number, the same key
//! the persistence layer uses, so a message replayed by the broker collapses
//! onto the record it already produced. Boot banners and other records that
//! never reach a sequence number are kept unsequenced.

use chrono::NaiveDateTime;
use std::collections::btree_map::{BTreeMap, Values};
use storage::Spool;
use uplink::{Decoder, DecodedMessage, Envelope};

/// The bucket for records whose device identity did not decode.
pub const UNKNOWN_DEVICE: &str = "UNKNOWN";

/// All devices seen in a spool, with their decoded records.
#[derive(Debug, Default)]
pub struct Registry {
    devices: BTreeMap<String, Device>,
    rejects: Vec<Reject>,
}

/// One reporting device and its records.
#[derive(Debug)]
pub struct Device {
    id: String,
    last_seen: Option<NaiveDateTime>,
    sequenced: BTreeMap<u64, DecodedMessage>,
    unsequenced: Vec<DecodedMessage>,
}

/// A message that did not match the envelope, kept instead of dropped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reject {
    /// The raw message text, verbatim.
    pub message: String,

    /// The decode error, rendered.
    pub error: String,
}

impl Registry {
    /// Creates an empty registry.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker::Registry;
    /// let registry = Registry::new();
    /// assert!(registry.is_empty());
    /// ```
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Builds a registry by decoding every message in a spool.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker::{Registry, Spool};
    /// use uplink::{Decoder, Passthrough, Schema};
    /// let spool = Spool::open("fixtures/spool").unwrap();
    /// let decoder = Decoder::new(Schema::latest(), Box::new(Passthrough));
    /// let registry = Registry::from_spool(&spool, &decoder).unwrap();
    /// assert_eq!(2, registry.devices().count());
    /// assert_eq!(1, registry.rejects().len());
    /// ```
    pub fn from_spool(spool: &Spool, decoder: &Decoder) -> Result<Registry, ::failure::Error> {
        let mut registry = Registry::new();
        for message in spool.messages()? {
            registry.add(decoder, &message);
        }
        Ok(registry)
    }

    /// Decodes one message into the registry.
    ///
    /// An envelope mismatch becomes a reject; anything else lands on its
    /// device, keyed by sequence number when the record has one.
    pub fn add(&mut self, decoder: &Decoder, message: &str) {
        match decoder.decode(message) {
            Ok(record) => {
                let id = record
                    .device_id()
                    .unwrap_or(UNKNOWN_DEVICE)
                    .to_string();
                let datetime = Envelope::new(message)
                    .ok()
                    .and_then(|envelope| envelope.datetime());
                let device = self
                    .devices
                    .entry(id.clone())
                    .or_insert_with(|| Device::new(id));
                device.add(record, datetime);
            }
            Err(error) => self.rejects.push(Reject {
                message: message.to_string(),
                error: error.to_string(),
            }),
        }
    }

    /// Returns the devices, ordered by identity.
    pub fn devices(&self) -> Values<String, Device> {
        self.devices.values()
    }

    /// Returns the device with the given identity, if it has reported.
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    /// Returns the messages that did not decode, in arrival order.
    pub fn rejects(&self) -> &[Reject] {
        &self.rejects
    }

    /// Returns true if no device has reported and nothing was rejected.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.rejects.is_empty()
    }
}

impl Device {
    fn new(id: String) -> Device {
        Device {
            id: id,
            last_seen: None,
            sequenced: BTreeMap::new(),
            unsequenced: Vec::new(),
        }
    }

    fn add(&mut self, record: DecodedMessage, datetime: Option<NaiveDateTime>) {
        if let Some(datetime) = datetime {
            if self.last_seen.map(|seen| seen < datetime).unwrap_or(true) {
                self.last_seen = Some(datetime);
            }
        }
        match record.seq_num() {
            Some(seq_num) => {
                self.sequenced.insert(seq_num, record);
            }
            None => self.unsequenced.push(record),
        }
    }

    /// Returns this device's identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the receipt time of the most recent message, if any parsed.
    pub fn last_seen(&self) -> Option<NaiveDateTime> {
        self.last_seen
    }

    /// Returns the number of records held for this device.
    pub fn len(&self) -> usize {
        self.sequenced.len() + self.unsequenced.len()
    }

    /// Returns true if the device has no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the records: sequenced ones in order, then unsequenced ones.
    pub fn records(&self) -> Vec<&DecodedMessage> {
        self.sequenced
            .values()
            .chain(self.unsequenced.iter())
            .collect()
    }

    /// Returns the missing sequence ranges between observed records.
    ///
    /// Each entry is an inclusive `(from, to)` range of sequence numbers
    /// that were never received. Gaps before the first observed sequence
    /// can't be told apart from a device reset, so only interior gaps are
    /// reported.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker::{Registry, Spool};
    /// use uplink::{Decoder, Passthrough, Schema};
    /// let spool = Spool::open("fixtures/spool").unwrap();
    /// let decoder = Decoder::new(Schema::latest(), Box::new(Passthrough));
    /// let registry = Registry::from_spool(&spool, &decoder).unwrap();
    /// assert_eq!(vec![(258, 259)], registry.device("HEWGHP").unwrap().gaps());
    /// ```
    pub fn gaps(&self) -> Vec<(u64, u64)> {
        let mut gaps = Vec::new();
        let mut previous: Option<u64> = None;
        for &seq_num in self.sequenced.keys() {
            if let Some(previous) = previous {
                if seq_num > previous + 1 {
                    gaps.push((previous + 1, seq_num - 1));
                }
            }
            previous = Some(seq_num);
        }
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uplink::{Passthrough, Schema};

    fn decoder() -> Decoder {
        Decoder::new(Schema::latest(), Box::new(Passthrough))
    }

    fn registry() -> Registry {
        let spool = Spool::open("fixtures/spool").unwrap();
        Registry::from_spool(&spool, &decoder()).unwrap()
    }

    #[test]
    fn devices_and_rejects() {
        let registry = registry();
        let ids: Vec<&str> = registry.devices().map(|device| device.id()).collect();
        assert_eq!(vec!["HEWGHP", "TRKBX1"], ids);
        assert_eq!(1, registry.rejects().len());
        assert!(registry.rejects()[0].message.contains("not a logger message"));
    }

    #[test]
    fn sequence_gaps() {
        let registry = registry();
        let device = registry.device("HEWGHP").unwrap();
        assert_eq!(3, device.len());
        assert_eq!(vec![(258, 259)], device.gaps());
    }

    #[test]
    fn boot_records_are_unsequenced() {
        let registry = registry();
        let device = registry.device("TRKBX1").unwrap();
        assert_eq!(2, device.len());
        assert!(device.gaps().is_empty());
        let records = device.records();
        assert_eq!(Some(1), records[0].seq_num());
        assert_eq!(None, records[1].seq_num());
        assert!(records[1].text("payload").unwrap().contains("boot rom"));
    }

    #[test]
    fn last_seen_is_the_newest_receipt() {
        let registry = registry();
        let last_seen = registry.device("HEWGHP").unwrap().last_seen().unwrap();
        assert_eq!(
            "2024-04-08 09:15:02",
            last_seen.format("%Y-%m-%d %H:%M:%S").to_string()
        );
    }

    #[test]
    fn replays_collapse() {
        let decoder = decoder();
        let spool = Spool::open("fixtures/spool").unwrap();
        let mut registry = Registry::new();
        for message in spool.messages().unwrap() {
            registry.add(&decoder, &message);
            registry.add(&decoder, &message);
        }
        assert_eq!(3, registry.device("HEWGHP").unwrap().len());
        // Unsequenced records have no key to collapse on.
        assert_eq!(3, registry.device("TRKBX1").unwrap().len());
        assert_eq!(2, registry.rejects().len());
    }

    #[test]
    fn empty_registry() {
        assert!(Registry::new().is_empty());
        assert!(!registry().is_empty());
    }
}
