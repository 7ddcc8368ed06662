use std::fmt;

/// An array-backed binary heap ordered by a "comes before" predicate.
///
/// `before(a, b)` must be a strict ordering: the element for which no other
/// element comes before it sits at the head.
pub struct PriorityQueue<T, F> {
    heap: Vec<T>,
    before: F,
}

impl<T, F> PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    pub fn new(before: F) -> Self {
        Self {
            heap: Vec::new(),
            before,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The head element without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.heap.first()
    }

    pub fn push(&mut self, item: T) {
        self.heap.push(item);
        self.sift_up(self.heap.len() - 1);
    }

    /// Remove and return the head, or `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let head = self.heap.pop();
        self.sift_down(0);
        head
    }

    /// Swap `item` in for the head and return the old head.
    ///
    /// One sift instead of a pop followed by a push. On an empty queue this
    /// just pushes.
    pub fn replace(&mut self, item: T) -> Option<T> {
        if self.heap.is_empty() {
            self.heap.push(item);
            return None;
        }
        let old = std::mem::replace(&mut self.heap[0], item);
        self.sift_down(0);
        Some(old)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !(self.before)(&self.heap[i], &self.heap[parent]) {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.heap.len();
        loop {
            let (l, r) = (2 * i + 1, 2 * i + 2);
            let mut best = i;
            if l < n && (self.before)(&self.heap[l], &self.heap[best]) {
                best = l;
            }
            if r < n && (self.before)(&self.heap[r], &self.heap[best]) {
                best = r;
            }
            if best == i {
                break;
            }
            self.heap.swap(i, best);
            i = best;
        }
    }
}

impl<T: fmt::Debug, F> fmt::Debug for PriorityQueue<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("heap", &self.heap)
            .finish_non_exhaustive()
    }
}
