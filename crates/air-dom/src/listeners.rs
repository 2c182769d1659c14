//! Event listeners scoped to the element that owns them.
//!
//! Hosts keep each listener they attach in a [`ListenerRegistry`] under the
//! element it was attached to. Listener types detach themselves in `Drop`,
//! so removing an entry is all it takes to release the callback and
//! everything it captured.

use std::cell::RefCell;
use std::fmt;

use crate::Dom;

/// Listeners keyed by owner element.
pub struct ListenerRegistry<N, L> {
    entries: RefCell<Vec<(N, L)>>,
}

impl<N, L> Default for ListenerRegistry<N, L> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<N, L> fmt::Debug for ListenerRegistry<N, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.entries.borrow().len())
            .finish()
    }
}

impl<N: Clone + PartialEq, L> ListenerRegistry<N, L> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `listener` alive for as long as `owner` is attached.
    pub fn add(&self, owner: &N, listener: L) {
        self.entries.borrow_mut().push((owner.clone(), listener));
    }

    /// Drop every listener owned by `owner`. Returns how many were dropped.
    pub fn release(&self, owner: &N) -> usize {
        self.remove_where(|o| o == owner)
    }

    /// Drop listeners whose owner is no longer attached to `dom`.
    pub fn prune<D: Dom<Node = N>>(&self, dom: &D) -> usize {
        self.remove_where(|owner| !dom.is_connected(owner))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn remove_where(&self, mut remove: impl FnMut(&N) -> bool) -> usize {
        // Listener drops run after the borrow ends; they may call back in.
        let removed: Vec<(N, L)> = {
            let mut entries = self.entries.borrow_mut();
            let (gone, kept) = std::mem::take(&mut *entries)
                .into_iter()
                .partition(|(owner, _)| remove(owner));
            *entries = kept;
            gone
        };
        let count = removed.len();
        drop(removed);
        if count > 0 {
            tracing::trace!(count, "Released event listeners");
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::MemoryDom;

    struct Detach(Rc<Cell<usize>>);

    impl Drop for Detach {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_prune_drops_listeners_of_detached_owners() {
        let dom = MemoryDom::parse(r#"<main><img id="a"><img id="b"></main>"#);
        let a = dom.find("#a").unwrap();
        let b = dom.find("#b").unwrap();
        let detached = Rc::new(Cell::new(0));
        let registry = ListenerRegistry::new();
        registry.add(&a, Detach(Rc::clone(&detached)));
        registry.add(&a, Detach(Rc::clone(&detached)));
        registry.add(&b, Detach(Rc::clone(&detached)));

        assert_eq!(registry.prune(&dom), 0);
        dom.remove(&a);

        assert_eq!(registry.prune(&dom), 2);
        assert_eq!(detached.get(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_swapped_content_releases_listeners() {
        let dom = MemoryDom::parse(r#"<main><form id="f"></form></main>"#);
        let main = dom.find("main").unwrap();
        let form = dom.find("#f").unwrap();
        let detached = Rc::new(Cell::new(0));
        let registry = ListenerRegistry::new();
        registry.add(&form, Detach(Rc::clone(&detached)));

        dom.set_inner_html(&main, "<p>novo</p>");
        registry.prune(&dom);

        assert!(registry.is_empty());
        assert_eq!(detached.get(), 1);
    }

    #[test]
    fn test_release_by_owner() {
        let dom = MemoryDom::parse(r#"<div id="overlay"></div><img id="foto">"#);
        let overlay = dom.find("#overlay").unwrap();
        let foto = dom.find("#foto").unwrap();
        let detached = Rc::new(Cell::new(0));
        let registry = ListenerRegistry::new();
        registry.add(&overlay, Detach(Rc::clone(&detached)));
        registry.add(&foto, Detach(Rc::clone(&detached)));

        assert_eq!(registry.release(&overlay), 1);
        assert_eq!(registry.release(&overlay), 0);
        assert_eq!(detached.get(), 1);
        assert_eq!(registry.len(), 1);
    }
}
