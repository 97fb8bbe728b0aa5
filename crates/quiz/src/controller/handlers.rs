use html::Id;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Input,
    Submit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handler {
    SelectAlternative { index: usize },
    Autosave,
    Submit,
    Edit,
}

impl Handler {
    pub fn listens_to(self) -> EventKind {
        match self {
            Handler::SelectAlternative { .. } | Handler::Edit => EventKind::Click,
            Handler::Autosave => EventKind::Input,
            Handler::Submit => EventKind::Submit,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Index of the bound block in the controller.
    pub block: usize,
    pub handler: Handler,
}

/// Handlers attached to document nodes. Host events reach the controller only through this
/// table, so the number of attachments per node is observable.
#[derive(Debug, Default)]
pub struct HandlerTable {
    by_node: HashMap<Id, Vec<Binding>>,
}

impl HandlerTable {
    pub fn attach(&mut self, node: Id, block: usize, handler: Handler) {
        self.by_node
            .entry(node)
            .or_default()
            .push(Binding { block, handler });
    }

    pub fn bindings(&self, node: Id) -> &[Binding] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First binding on `node` listening to `kind`.
    pub fn find(&self, node: Id, kind: EventKind) -> Option<Binding> {
        self.bindings(node)
            .iter()
            .find(|b| b.handler.listens_to() == kind)
            .copied()
    }

    pub fn total(&self) -> usize {
        self.by_node.values().map(Vec::len).sum()
    }

    /// Largest number of handlers attached to a single node.
    pub fn max_per_node(&self) -> usize {
        self.by_node.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.by_node.clear();
    }

    /// Renumbers bound blocks after some were dropped. `map` returns the new index of a block,
    /// or `None` for a dropped one whose handlers go away.
    pub fn remap(&mut self, map: impl Fn(usize) -> Option<usize>) {
        self.by_node.retain(|_, bindings| {
            bindings.retain_mut(|b| match map(b.block) {
                Some(block) => {
                    b.block = block;
                    true
                }
                None => false,
            });
            !bindings.is_empty()
        });
    }
}
