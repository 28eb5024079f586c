use crate::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub item: Item,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
}

/// Arena of decoded items. Children are owned through their index list,
/// parents are plain indices.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(root: Item) -> Self {
        Tree {
            nodes: vec![Node {
                item: root,
                parent: None,
                children: vec![],
                depth: 0,
            }],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_child(&mut self, parent: NodeId, item: Item) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(Node {
            item,
            parent: Some(parent),
            children: vec![],
            depth,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    #[inline]
    pub fn item(&self, id: NodeId) -> &Item {
        &self.nodes[id.0].item
    }

    #[inline]
    pub fn item_mut(&mut self, id: NodeId) -> &mut Item {
        &mut self.nodes[id.0].item
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.nodes[id.0].depth
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first pre-order walk starting at (and including) `start`.
    pub fn preorder(&self, start: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![start],
        }
    }

    pub fn count_elements(&self, start: NodeId) -> usize {
        self.preorder(start)
            .filter(|id| self.item(*id).is_element())
            .count()
    }
}

pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

impl std::fmt::Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for id in self.preorder(self.root()) {
            let item = self.item(id);
            let indent = "  ".repeat(self.depth(id));
            writeln!(f, "{}{}", indent, item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;

    #[test]
    fn builds_and_walks_in_preorder() {
        let mut tree = Tree::new(Item::new("Message", ItemKind::Unknown));
        let a = tree.add_child(tree.root(), Item::new("a", ItemKind::Sequence));
        let a1 = tree.add_child(a, Item::new("a1", ItemKind::Element));
        let a2 = tree.add_child(a, Item::new("a2", ItemKind::Element));
        let b = tree.add_child(tree.root(), Item::new("b", ItemKind::Element));

        let order: Vec<_> = tree
            .preorder(tree.root())
            .map(|id| tree.item(id).name.clone())
            .collect();
        assert_eq!(order, ["Message", "a", "a1", "a2", "b"]);

        assert_eq!(tree.parent(a2), Some(a));
        assert_eq!(tree.depth(a1), 2);
        assert_eq!(tree.children(a), &[a1, a2]);
        assert_eq!(tree.count_elements(tree.root()), 3);
        assert_eq!(tree.count_elements(b), 1);
    }
}
