use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::{ContentHandle, Listener, ListenerId};

/// A listener attached to a content handle. Dropping it detaches the
/// listener.
pub struct Subscription {
    handle: Rc<dyn ContentHandle>,
    id: ListenerId,
}

impl Subscription {
    pub fn attach(handle: &Rc<dyn ContentHandle>, listener: Listener) -> Self {
        let id = handle.subscribe(listener);
        Self {
            handle: Rc::clone(handle),
            id,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let removed = self.handle.unsubscribe(self.id);
        trace!(
            surface_id = %self.handle.surface_id(),
            listener = self.id,
            removed,
            "listener detached"
        );
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("surface_id", &self.handle.surface_id())
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::host::ContentEvent;
    use crate::memory_host::MemoryHost;
    use tabweave_common::SurfaceId;

    #[test]
    fn drop_detaches_listener() {
        let host = MemoryHost::new();
        let content = host.spawn_surface("https://a.test");
        let handle: Rc<dyn ContentHandle> = content.clone();

        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let sub = Subscription::attach(&handle, Rc::new(move |_: &ContentEvent| {
            counter.set(counter.get() + 1);
        }));
        assert_eq!(content.listener_count(), 1);

        content.emit(ContentEvent::DidNavigate { url: "https://b.test".into() });
        assert_eq!(hits.get(), 1);

        drop(sub);
        assert_eq!(content.listener_count(), 0);

        content.emit(ContentEvent::DidNavigate { url: "https://c.test".into() });
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn ids_are_distinct_per_listener() {
        let host = MemoryHost::new();
        let content = host.spawn_surface("about:blank");
        let handle: Rc<dyn ContentHandle> = content.clone();

        let a = Subscription::attach(&handle, Rc::new(|_: &ContentEvent| {}));
        let b = Subscription::attach(&handle, Rc::new(|_: &ContentEvent| {}));
        assert_ne!(a.id(), b.id());
        assert_ne!(content.surface_id(), SurfaceId(0));
    }
}
