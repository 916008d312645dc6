use std::collections::VecDeque;

/// Strict FIFO of raw command lines awaiting dispatch.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    pending: VecDeque<String>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: impl Into<String>) {
        self.pending.push_back(command.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }
}

impl Extend<String> for CommandQueue {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        self.pending.extend(iter);
    }
}
