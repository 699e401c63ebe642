use std::collections::BTreeMap;

/// State of one registration.
enum Slot<L> {
    /// Registered and not running.
    Idle(L),

    /// Registered; the listener has been taken out and is running.
    Busy,
}

/// A keyed registry of listeners with take-out/restore semantics.
///
/// A listener is taken out with [`take`](Self::take) before it is called
/// and handed back with [`restore`](Self::restore) afterwards. If the key
/// was removed or replaced in between, the restored listener is dropped
/// and the newer state is kept.
pub(crate) struct Slots<K, L> {
    map: BTreeMap<K, Slot<L>>,
}

impl<K: Ord + Copy, L> Slots<K, L> {
    pub(crate) fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Registers `listener`, replacing any previous one.
    ///
    /// Returns `true` if a registration already existed.
    pub(crate) fn set(&mut self, key: K, listener: L) -> bool {
        self.map.insert(key, Slot::Idle(listener)).is_some()
    }

    /// Removes a registration. Returns `false` if there was none.
    pub(crate) fn remove(&mut self, key: K) -> bool {
        self.map.remove(&key).is_some()
    }

    pub(crate) fn contains(&self, key: K) -> bool {
        self.map.contains_key(&key)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Removes every registration, including running ones.
    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }

    /// Registered keys in ascending order.
    pub(crate) fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.map.keys().copied()
    }

    /// Takes the listener out, leaving the key registered.
    ///
    /// Returns `None` if the key is unknown or its listener is running.
    pub(crate) fn take(&mut self, key: K) -> Option<L> {
        let slot = self.map.get_mut(&key)?;

        match std::mem::replace(slot, Slot::Busy) {
            Slot::Idle(listener) => Some(listener),
            Slot::Busy => None,
        }
    }

    /// Hands a taken listener back.
    pub(crate) fn restore(&mut self, key: K, listener: L) {
        if let Some(slot) = self.map.get_mut(&key) {
            if matches!(slot, Slot::Busy) {
                *slot = Slot::Idle(listener);
            }
        }
    }
}
