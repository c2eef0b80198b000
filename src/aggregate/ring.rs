use std::collections::VecDeque;

/// Prepend-only ring buffer, newest entry first.
///
/// Pushing past capacity silently evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct BoundedFeed<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedFeed<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend `item`, returning the evicted entry if the feed was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        self.items.push_front(item);
        if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        }
    }

    /// Most recent entry.
    pub fn head(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
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

    /// Newest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> BoundedFeed<T> {
    /// Newest-first copy of the contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first() {
        let mut feed = BoundedFeed::new(3);
        feed.push(1);
        feed.push(2);
        feed.push(3);
        assert_eq!(feed.to_vec(), vec![3, 2, 1]);
        assert_eq!(feed.head(), Some(&3));
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut feed = BoundedFeed::new(3);
        for i in 0..3 {
            assert_eq!(feed.push(i), None);
        }
        assert_eq!(feed.push(3), Some(0));
        assert_eq!(feed.push(4), Some(1));
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.to_vec(), vec![4, 3, 2]);
    }

    #[test]
    fn never_exceeds_capacity_under_long_runs() {
        let mut feed = BoundedFeed::new(50);
        for i in 0..1_000 {
            feed.push(i);
            assert!(feed.len() <= 50);
        }
        let items = feed.to_vec();
        assert!(items.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(items[0], 999);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut feed = BoundedFeed::new(0);
        assert_eq!(feed.push("x"), Some("x"));
        assert!(feed.is_empty());
    }
}
