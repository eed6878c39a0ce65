use std::{cell::RefCell, fmt::Display, rc::Rc};

/// Ordered log of the side effects a pipeline produced.
///
/// Clones share the same log, so one clone can live inside a `peek` observer
/// and another inside the terminal while the test keeps a third for asserting.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, line: impl Display) {
        self.lines.borrow_mut().push(line.to_string());
    }

    /// Observer for `peek`: records every element it sees.
    pub fn observer<T: Display + ?Sized>(&self) -> impl FnMut(&T) + use<T> {
        let log = self.clone();
        move |item: &T| log.record(item)
    }

    /// Action for `for_each`: records every element it receives.
    pub fn consumer<T: Display>(&self) -> impl FnMut(T) + use<T> {
        let log = self.clone();
        move |item: T| log.record(item)
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}
