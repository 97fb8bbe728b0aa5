use crate::{Id, Node};

pub fn max_node_id(root: &Node) -> Id {
    let mut max = root.id();
    for c in root.children() {
        max = max.max(max_node_id(c));
    }
    max
}

/// Hands out fresh node ids for one tree, continuing after the largest id present when the
/// allocator was created.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn for_tree(root: &Node) -> Self {
        Self {
            next: max_node_id(root).0.wrapping_add(1).max(1),
        }
    }

    /// Assigns ids to every node of `node`'s subtree that does not have one yet.
    pub fn assign(&mut self, node: &mut Node) {
        if node.id() == Id::UNSET {
            node.set_id(Id(self.next));
            self.next = self.next.wrapping_add(1);
        }
        if let Some(children) = node.children_mut() {
            for c in children {
                self.assign(c);
            }
        }
    }
}

/// Assigns ids to every node that does not have one yet, continuing after the largest id
/// already present so that ids handed out earlier stay unique and stable.
pub fn assign_node_ids(root: &mut Node) {
    IdAllocator::for_tree(root).assign(root);
}

/// Ids from `root` down to `target` (both included), or `None` if `target` is not in the tree.
pub fn path_to(root: &Node, target: Id) -> Option<Vec<Id>> {
    fn walk(node: &Node, target: Id, path: &mut Vec<Id>) -> bool {
        path.push(node.id());
        if node.id() == target {
            return true;
        }
        if node.children().iter().any(|c| walk(c, target, path)) {
            return true;
        }
        path.pop();
        false
    }

    let mut path = Vec::new();
    walk(root, target, &mut path).then_some(path)
}

pub fn find_node_by_id(node: &Node, id: Id) -> Option<&Node> {
    if node.id() == id {
        return Some(node);
    }
    node.children()
        .iter()
        .find_map(|c| find_node_by_id(c, id))
}

pub fn find_node_by_id_mut(node: &mut Node, id: Id) -> Option<&mut Node> {
    if node.id() == id {
        return Some(node);
    }
    node.children_mut()?
        .iter_mut()
        .find_map(|c| find_node_by_id_mut(c, id))
}

/// First descendant (excluding `node` itself) matching `pred`, in document order.
pub fn find_descendant<'a>(node: &'a Node, pred: &dyn Fn(&Node) -> bool) -> Option<&'a Node> {
    for c in node.children() {
        if pred(c) {
            return Some(c);
        }
        if let Some(found) = find_descendant(c, pred) {
            return Some(found);
        }
    }
    None
}

/// Ids of all descendants matching `pred`, in document order.
pub fn collect_descendant_ids(node: &Node, pred: &dyn Fn(&Node) -> bool, out: &mut Vec<Id>) {
    for c in node.children() {
        if pred(c) {
            out.push(c.id());
        }
        collect_descendant_ids(c, pred, out);
    }
}

/// Replaces the node with id `target` by `replacement`, returning the old node.
pub fn replace_node(root: &mut Node, target: Id, replacement: Node) -> Option<Node> {
    let children = root.children_mut()?;
    if let Some(pos) = children.iter().position(|c| c.id() == target) {
        return Some(std::mem::replace(&mut children[pos], replacement));
    }
    let mut replacement = Some(replacement);
    for c in children.iter_mut() {
        if !contains_id(c, target) {
            continue;
        }
        let node = replacement.take()?;
        return replace_node(c, target, node);
    }
    None
}

pub fn contains_id(node: &Node, id: Id) -> bool {
    find_node_by_id(node, id).is_some()
}
