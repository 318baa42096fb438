use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::rule::RuleId;

/// One node of a counter tree: an atomic tally plus rule-keyed children in
/// first-observation order.
///
/// The activation tracker nests these four levels deep under a root; the
/// execution tally uses a single level. Counts only ever go up; `clear`
/// replaces the whole subtree, so a thread racing a clear may lose its
/// increment but never corrupts the tree.
#[derive(Debug, Default)]
pub(crate) struct CounterNode {
    count: AtomicU64,
    children: RwLock<ChildMap>,
}

/// Children plus a parallel insertion-order index. `HashMap` iteration order
/// varies per process, which would make serialized trees differ between
/// otherwise identical runs and defeat snapshot diffing.
#[derive(Debug, Default)]
struct ChildMap {
    by_rule: HashMap<RuleId, Arc<CounterNode>>,
    order: Vec<RuleId>,
}

impl CounterNode {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add one to this node's tally.
    pub(crate) fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// The child for `rule`, created on first sight.
    pub(crate) fn child(&self, rule: &RuleId) -> Arc<CounterNode> {
        if let Some(node) = self.children.read().by_rule.get(rule) {
            return Arc::clone(node);
        }
        let mut children = self.children.write();
        // Re-check under the write lock; another thread may have created it
        // between the two acquisitions.
        if let Some(node) = children.by_rule.get(rule) {
            return Arc::clone(node);
        }
        let node = Arc::new(CounterNode::new());
        children.by_rule.insert(rule.clone(), Arc::clone(&node));
        children.order.push(rule.clone());
        node
    }

    /// The child for `rule`, if one has been observed.
    pub(crate) fn get(&self, rule: &RuleId) -> Option<Arc<CounterNode>> {
        self.children.read().by_rule.get(rule).map(Arc::clone)
    }

    /// Copy of the children in first-observation order.
    pub(crate) fn children(&self) -> Vec<(RuleId, Arc<CounterNode>)> {
        let children = self.children.read();
        children
            .order
            .iter()
            .filter_map(|rule| {
                children
                    .by_rule
                    .get(rule)
                    .map(|node| (rule.clone(), Arc::clone(node)))
            })
            .collect()
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.children.read().order.is_empty()
    }

    /// Zero the tally and drop every child.
    pub(crate) fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
        let mut children = self.children.write();
        children.by_rule.clear();
        children.order.clear();
    }
}
