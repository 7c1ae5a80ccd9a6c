// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Items which can be ordered in a [MinHeap].
pub(crate) trait Prioritized {
    fn priority(&self) -> f64;
}

/// Array-backed binary min-heap.
///
/// Contrary to [std::collections::BinaryHeap], items are ordered by a plain `f64` priority,
/// and on equal priorities of both children the first child is preferred when sifting down.
#[derive(Debug, Clone)]
pub(crate) struct MinHeap<T> {
    items: Vec<T>,
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Prioritized> MinHeap<T> {
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        let last = self.items.len().checked_sub(1)?;
        self.items.swap(0, last);
        let top = self.items.pop();
        self.sift_down(0);
        top
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.items[i].priority() < self.items[parent].priority() {
                self.items.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            if left >= self.items.len() {
                break;
            }

            let child = if right < self.items.len()
                && self.items[right].priority() < self.items[left].priority()
            {
                right
            } else {
                left
            };

            if self.items[child].priority() < self.items[i].priority() {
                self.items.swap(i, child);
                i = child;
            } else {
                break;
            }
        }
    }

    #[cfg(test)]
    fn is_valid(&self) -> bool {
        (1..self.items.len()).all(|i| self.items[(i - 1) / 2].priority() <= self.items[i].priority())
    }
}
