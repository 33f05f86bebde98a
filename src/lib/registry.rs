//! Stream registry keyed by stream id.

use log::{debug, warn};
use std::collections::BTreeMap;

use crate::recordable::StreamRecordable;

/// Map from stream id to its recordable, iterated in ascending id order.
///
/// Registering an id that is already present replaces the earlier stream.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: BTreeMap<u32, StreamRecordable>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a recordable, returning the one it replaced
    pub fn register(&mut self, recordable: StreamRecordable) -> Option<StreamRecordable> {
        let stream_id = recordable.stream_id();
        let previous = self.streams.insert(stream_id, recordable);
        match &previous {
            Some(old) => warn!(
                "Stream {} '{}' replaced by a new registration",
                stream_id,
                old.name()
            ),
            None => debug!("Registered stream {}", stream_id),
        }
        previous
    }

    pub fn lookup(&self, stream_id: u32) -> Option<&StreamRecordable> {
        self.streams.get(&stream_id)
    }

    pub fn lookup_mut(&mut self, stream_id: u32) -> Option<&mut StreamRecordable> {
        self.streams.get_mut(&stream_id)
    }

    pub fn contains(&self, stream_id: u32) -> bool {
        self.streams.contains_key(&stream_id)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamRecordable> {
        self.streams.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_unknown_id() {
        let registry = StreamRegistry::new();
        assert!(registry.lookup(1).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = StreamRegistry::new();
        assert!(registry.register(StreamRecordable::new(5, "first")).is_none());
        let replaced = registry.register(StreamRecordable::new(5, "second"));

        assert_eq!(replaced.unwrap().name(), "first");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(5));
        assert_eq!(registry.lookup(5).unwrap().name(), "second");
    }

    #[test]
    fn test_iterates_in_id_order() {
        let mut registry = StreamRegistry::new();
        for id in [30, 10, 20] {
            registry.register(StreamRecordable::new(id, "s"));
        }
        let ids: Vec<u32> = registry.iter().map(|r| r.stream_id()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
