//! Interval index over calendar intervals.
//!
//! [`IntervalTree`] is an AVL tree keyed by `(start, end)` where every node
//! also records the largest `end` found in its subtree. The augmentation
//! lets overlap queries skip whole subtrees that finish before the query
//! begins, so a query costs `O(log n + k)` for `k` matches.
//!
//! The tree is a multiset: equal keys are kept side by side (ties descend
//! to the right), so two distinct events with the same range are both
//! returned by a query.

use std::cmp::{Ordering, max};

use crate::interval::{CalendarInterval, Interval};

type Link = Option<Box<Node>>;

#[derive(Debug, Clone)]
struct Node {
    item: CalendarInterval,
    max_end: i64,
    height: u32,
    left: Link,
    right: Link,
}

impl Node {
    fn leaf(item: CalendarInterval) -> Box<Self> {
        Box::new(Self {
            max_end: item.end(),
            height: 1,
            item,
            left: None,
            right: None,
        })
    }

    fn key(&self) -> (i64, i64) {
        (self.item.start(), self.item.end())
    }

    fn update(&mut self) {
        self.height = 1 + max(height(&self.left), height(&self.right));
        self.max_end = [max_end(&self.left), max_end(&self.right)]
            .into_iter()
            .flatten()
            .fold(self.item.end(), max);
    }

    fn balance_factor(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }
}

fn height(link: &Link) -> u32 {
    link.as_ref().map_or(0, |n| n.height)
}

fn max_end(link: &Link) -> Option<i64> {
    link.as_ref().map(|n| n.max_end)
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    match node.left.take() {
        Some(mut pivot) => {
            node.left = pivot.right.take();
            node.update();
            pivot.right = Some(node);
            pivot.update();
            pivot
        }
        None => node,
    }
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    match node.right.take() {
        Some(mut pivot) => {
            node.right = pivot.left.take();
            node.update();
            pivot.left = Some(node);
            pivot.update();
            pivot
        }
        None => node,
    }
}

fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update();
    let bf = node.balance_factor();
    if bf > 1 {
        if node.left.as_ref().is_some_and(|l| l.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        rotate_right(node)
    } else if bf < -1 {
        if node.right.as_ref().is_some_and(|r| r.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        rotate_left(node)
    } else {
        node
    }
}

fn insert_at(link: Link, item: CalendarInterval) -> Box<Node> {
    match link {
        None => Node::leaf(item),
        Some(mut node) => {
            let key = (item.start(), item.end());
            match key.cmp(&node.key()) {
                Ordering::Less => node.left = Some(insert_at(node.left.take(), item)),
                Ordering::Equal | Ordering::Greater => {
                    node.right = Some(insert_at(node.right.take(), item))
                }
            }
            rebalance(node)
        }
    }
}

fn collect_overlaps<'a>(link: &'a Link, query: &Interval, out: &mut Vec<&'a CalendarInterval>) {
    let Some(node) = link else {
        return;
    };
    // Nothing below ends after the query starts.
    if node.max_end <= query.start() {
        return;
    }
    collect_overlaps(&node.left, query, out);
    // Right subtree starts at or after this node.
    if node.item.start() < query.end() {
        if node.item.interval().overlaps(query) {
            out.push(&node.item);
        }
        collect_overlaps(&node.right, query, out);
    }
}

/// A range-queryable multiset of [`CalendarInterval`].
#[derive(Debug, Clone, Default)]
pub struct IntervalTree {
    root: Link,
    len: usize,
}

impl IntervalTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an interval. Duplicates are stored independently.
    pub fn insert(&mut self, item: CalendarInterval) {
        self.root = Some(insert_at(self.root.take(), item));
        self.len += 1;
    }

    /// Returns every stored interval `[a, b)` with `a < query.end` and
    /// `query.start < b`.
    ///
    /// Results are in ascending `(start, end)` order. An empty tree yields an
    /// empty vector.
    pub fn overlap(&self, query: &Interval) -> Vec<&CalendarInterval> {
        let mut out = Vec::new();
        collect_overlaps(&self.root, query, &mut out);
        out
    }

    /// Number of stored intervals, duplicates included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree (0 when empty).
    pub fn height(&self) -> u32 {
        height(&self.root)
    }

    /// Removes every interval.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// In-order iterator over the stored intervals.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }
}

impl Extend<CalendarInterval> for IntervalTree {
    fn extend<T: IntoIterator<Item = CalendarInterval>>(&mut self, iter: T) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl FromIterator<CalendarInterval> for IntervalTree {
    fn from_iter<T: IntoIterator<Item = CalendarInterval>>(iter: T) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a> IntoIterator for &'a IntervalTree {
    type Item = &'a CalendarInterval;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an [`IntervalTree`].
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn push_left(&mut self, mut node: Option<&'a Node>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CalendarInterval;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some(&node.item)
    }
}
