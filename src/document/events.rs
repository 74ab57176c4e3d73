//! Document change notifications.

/// A change observed on a [`Document`](super::Document).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocumentEvent {
    /// A document was loaded
    Loaded {
        /// Number of paragraphs loaded
        paragraph_count: usize,
    },
    /// A paragraph's height changed
    ParagraphHeightChanged {
        /// Paragraph index
        index: usize,
        /// New height
        height: f64,
    },
    /// The document's total height changed
    TotalHeightChanged {
        /// New total height
        height: f64,
    },
    /// A paragraph's content changed
    ParagraphChanged {
        /// Paragraph index
        index: usize,
    },
    /// A paragraph was inserted
    ParagraphInserted {
        /// Index of the new paragraph
        index: usize,
    },
    /// A paragraph was removed
    ParagraphRemoved {
        /// Index the paragraph had
        index: usize,
    },
}

/// Receives document events synchronously, in the order they happen.
pub trait DocumentListener {
    /// Handle one event.
    fn on_event(&mut self, event: &DocumentEvent);
}

impl<F> DocumentListener for F
where
    F: FnMut(&DocumentEvent),
{
    fn on_event(&mut self, event: &DocumentEvent) {
        self(event)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Subscription list.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<(ListenerId, Box<dyn DocumentListener>)>,
    next_id: u64,
}

impl Listeners {
    pub(crate) fn subscribe(&mut self, listener: Box<dyn DocumentListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn emit(&mut self, event: DocumentEvent) {
        for (_, listener) in &mut self.entries {
            listener.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_subscribe_emit_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        let sink = Rc::clone(&seen);
        let id = listeners.subscribe(Box::new(move |e: &DocumentEvent| sink.borrow_mut().push(*e)));
        listeners.emit(DocumentEvent::ParagraphChanged { index: 2 });
        assert_eq!(
            *seen.borrow(),
            vec![DocumentEvent::ParagraphChanged { index: 2 }]
        );

        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(DocumentEvent::ParagraphRemoved { index: 0 });
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(listeners.len(), 0);
    }
}
