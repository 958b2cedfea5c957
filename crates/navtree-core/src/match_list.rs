//! A singly linked list with ordered insertion.
//!
//! Used to keep "subroute of" listener clauses sorted from the most specific
//! route key to the least specific one, so that `find` returns the deepest
//! clause that applies.

use std::cmp::Ordering;

struct Node<T> {
    value: T,
    next: Option<Box<Node<T>>>,
}

/// A linked list ordered according to the comparator passed to `new`.
pub struct OrderedMatchList<T> {
    head: Option<Box<Node<T>>>,
    compare: Box<dyn Fn(&T, &T) -> Ordering>,
}

impl<T> OrderedMatchList<T> {
    /// Create an empty list ordered by `compare`.
    #[must_use]
    pub fn new(compare: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self {
            head: None,
            compare: Box::new(compare),
        }
    }

    /// Add an element, keeping the list ordered. O(n) in the worst case.
    ///
    /// The element is inserted before the first existing element it does not
    /// compare greater than, so equal elements keep insertion order.
    pub fn push(&mut self, value: T) {
        insert(&mut self.head, value, &self.compare);
    }

    /// The first element, in list order, for which the predicate holds.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.iter().find(|value| predicate(value))
    }

    /// Iterate in list order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let mut next = self.head.as_deref();
        std::iter::from_fn(move || {
            let node = next?;
            next = node.next.as_deref();
            Some(&node.value)
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

fn insert<T>(slot: &mut Option<Box<Node<T>>>, value: T, compare: &dyn Fn(&T, &T) -> Ordering) {
    match slot {
        Some(node) if compare(&value, &node.value) == Ordering::Greater => {
            insert(&mut node.next, value, compare);
        }
        _ => {
            let next = slot.take();
            *slot = Some(Box::new(Node { value, next }));
        }
    }
}

/// Order route keys from deeper (more dot-separated components) to
/// shallower. Keys at the same depth compare equal.
#[must_use]
pub fn compare_route_keys_desc(a: &str, b: &str) -> Ordering {
    let depth_a = a.split('.').count();
    let depth_b = b.split('.').count();
    depth_b.cmp(&depth_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_order() {
        let mut list = OrderedMatchList::new(|a: &i32, b: &i32| a.cmp(b));
        list.push(3);
        list.push(1);
        list.push(2);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn equal_elements_keep_insertion_order() {
        let mut list = OrderedMatchList::new(|a: &(i32, &str), b: &(i32, &str)| a.0.cmp(&b.0));
        list.push((1, "first"));
        list.push((1, "second"));
        list.push((0, "zero"));
        let tags: Vec<&str> = list.iter().map(|(_, tag)| *tag).collect();
        assert_eq!(tags, vec!["zero", "first", "second"]);
    }

    #[test]
    fn find_returns_first_matching_in_order() {
        let mut list = OrderedMatchList::new(|a: &i32, b: &i32| a.cmp(b));
        list.push(10);
        list.push(5);
        list.push(7);
        assert_eq!(list.find(|v| *v > 6), Some(&7));
        assert_eq!(list.find(|v| *v > 100), None);
    }

    #[test]
    fn len_and_is_empty() {
        let mut list = OrderedMatchList::new(|a: &i32, b: &i32| a.cmp(b));
        assert!(list.is_empty());
        list.push(1);
        list.push(2);
        assert_eq!(list.len(), 2);
        assert!(!list.is_empty());
    }

    #[test]
    fn deeper_keys_sort_first() {
        let mut list = OrderedMatchList::new(|a: &&str, b: &&str| compare_route_keys_desc(a, b));
        list.push("root");
        list.push("root.studios.studio");
        list.push("root.studios");
        let keys: Vec<&str> = list.iter().copied().collect();
        assert_eq!(keys, vec!["root.studios.studio", "root.studios", "root"]);
    }
}
