// Fixed-capacity FIFO history shared by every viewer that buffers live records
use std::collections::VecDeque;

/// Append-only sequence holding at most `capacity` items. Pushing beyond
/// capacity evicts the oldest entry; order is always arrival order. Capacity
/// is a parameter, not a policy baked into any one use (cluster history keeps
/// 50, raw message viewers keep 1000).
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Drop all items; capacity is unchanged.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items oldest to newest.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T: Clone> BoundedHistory<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_items_in_arrival_order_under_capacity() {
        let mut history = BoundedHistory::new(5);
        history.push(1);
        history.push(2);
        history.push(3);

        assert_eq!(history.to_vec(), vec![1, 2, 3]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest(), Some(&3));
    }

    #[test]
    fn evicts_oldest_first_beyond_capacity() {
        let mut history = BoundedHistory::new(3);
        for i in 1..=6 {
            history.push(i);
            assert!(history.len() <= 3);
        }

        // Newest N preserved, in arrival order.
        assert_eq!(history.to_vec(), vec![4, 5, 6]);
    }

    #[test]
    fn thousand_and_one_log_lines_keep_the_last_thousand() {
        let mut history = BoundedHistory::new(1000);
        for i in 0..1001u32 {
            history.push(i);
        }

        assert_eq!(history.len(), 1000);
        assert_eq!(history.items().next(), Some(&1));
        assert_eq!(history.latest(), Some(&1000));
    }

    #[test]
    fn zero_capacity_history_never_holds_items() {
        let mut history = BoundedHistory::new(0);
        history.push(1);
        history.push(2);

        assert!(history.is_empty());
        assert!(history.len() <= history.capacity());
        assert_eq!(history.latest(), None);
    }

    #[test]
    fn clear_resets_items_but_not_capacity() {
        let mut history = BoundedHistory::new(2);
        history.push("a");
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.capacity(), 2);
        history.push("b");
        assert_eq!(history.to_vec(), vec!["b"]);
    }
}
