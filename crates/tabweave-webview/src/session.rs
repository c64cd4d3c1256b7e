//! One session per partition, created lazily and kept for the life of the
//! coordinator.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::host::Session;
use crate::partition::Partition;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<Partition, Rc<dyn Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `partition`, calling `create` only if none
    /// exists yet.
    pub fn get_or_create<F>(&mut self, partition: &Partition, create: F) -> Rc<dyn Session>
    where
        F: FnOnce(&Partition) -> Rc<dyn Session>,
    {
        if let Some(session) = self.sessions.get(partition) {
            return Rc::clone(session);
        }
        let session = create(partition);
        debug!(%partition, durable = partition.is_durable(), "session created");
        self.sessions.insert(partition.clone(), Rc::clone(&session));
        session
    }

    pub fn get(&self, partition: &Partition) -> Option<Rc<dyn Session>> {
        self.sessions.get(partition).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Known partitions, sorted.
    pub fn partitions(&self) -> Vec<Partition> {
        let mut partitions: Vec<_> = self.sessions.keys().cloned().collect();
        partitions.sort();
        partitions
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::memory_host::MemoryHost;
    use crate::host::Host;

    #[test]
    fn creates_once_per_partition() {
        let host = MemoryHost::new();
        let calls = Cell::new(0);
        let mut registry = SessionRegistry::new();
        let work = Partition::new("persist:work");

        let first = registry.get_or_create(&work, |p| {
            calls.set(calls.get() + 1);
            host.create_session(p)
        });
        let second = registry.get_or_create(&work, |p| {
            calls.set(calls.get() + 1);
            host.create_session(p)
        });

        assert_eq!(calls.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_partitions_get_distinct_sessions() {
        let host = MemoryHost::new();
        let mut registry = SessionRegistry::new();
        let a = registry.get_or_create(&Partition::new("persist:a"), |p| host.create_session(p));
        let b = registry.get_or_create(&Partition::new("memory:b"), |p| host.create_session(p));

        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(a.partition().as_str(), "persist:a");
        assert_eq!(
            registry.partitions(),
            vec![Partition::new("memory:b"), Partition::new("persist:a")]
        );
    }

    #[test]
    fn get_does_not_create() {
        let registry = SessionRegistry::new();
        assert!(registry.get(&Partition::default()).is_none());
        assert!(registry.is_empty());
    }
}
