use crate::decoder::DecodedMessage;
use crate::item::Value;
use crate::tree::NodeId;

/// Element nodes of one subset, one row per element in decode order.
///
/// Uncompressed messages have a single column. Compressed messages have one
/// column per subset and every column of a row refers to the same node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueGrid {
    rows: usize,
    cols: usize,
    cells: Vec<NodeId>,
}

impl ValueGrid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<NodeId> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }

    pub fn row(&self, row: usize) -> &[NodeId] {
        let start = (row * self.cols).min(self.cells.len());
        let end = (start + self.cols).min(self.cells.len());
        &self.cells[start..end]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[NodeId]> {
        self.cells.chunks(self.cols.max(1))
    }
}

impl DecodedMessage {
    /// Grid of the element nodes below subset `subset_index` (0-based).
    /// Out of range subsets, as in messages without data, give an empty grid.
    pub fn project_values(&self, subset_index: usize) -> ValueGrid {
        let Some(&subset) = self.subsets.get(subset_index) else {
            return ValueGrid::default();
        };

        let rows = self.tree.count_elements(subset);
        let cols = if self.compressed {
            self.number_of_subsets
        } else {
            1
        };

        let mut cells = Vec::with_capacity(rows * cols);
        for id in self.tree.preorder(subset) {
            if self.tree.item(id).is_element() {
                cells.extend(std::iter::repeat_n(id, cols));
            }
        }
        debug_assert_eq!(cells.len(), rows * cols);

        ValueGrid { rows, cols, cells }
    }

    /// Value of `node` as seen by `column`. Compressed nodes hold one value
    /// per subset, uncompressed ones a single value in column 0.
    pub fn value(&self, node: NodeId, column: usize) -> Option<&Value> {
        let item = self.tree.item(node);
        if item.missing {
            return None;
        }
        item.values.get(column)
    }

    /// Number of grids `project_values` can produce.
    pub fn subset_grids(&self) -> usize {
        self.subsets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, ItemKind};
    use crate::tree::Tree;
    use rustc_hash::FxHashMap;
    use tablelib::TableDefinitions;

    fn element(v: f64) -> Item {
        let mut item = Item::new("e", ItemKind::Element);
        item.values.push(Value::Number(v));
        item
    }

    #[test]
    fn uncompressed_grid_has_one_column_per_subset() {
        let mut tree = Tree::new(Item::new("Message", ItemKind::Unknown));
        let root = tree.root();
        let s1 = tree.add_child(root, Item::new("Subset: 1", ItemKind::Unknown));
        let seq = tree.add_child(s1, Item::new("seq", ItemKind::Sequence));
        let a = tree.add_child(seq, element(1.0));
        tree.add_child(s1, Item::new("op", ItemKind::Operator));
        let b = tree.add_child(s1, element(2.0));

        let decoded = DecodedMessage {
            tree,
            subsets: vec![s1],
            compressed: false,
            number_of_subsets: 1,
            definitions: TableDefinitions::default(),
            loaded_b: FxHashMap::default(),
        };

        let grid = decoded.project_values(0);
        assert_eq!((grid.rows(), grid.cols()), (2, 1));
        assert_eq!(grid.get(0, 0), Some(a));
        assert_eq!(grid.get(1, 0), Some(b));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(decoded.value(b, 0), Some(&Value::Number(2.0)));
        assert!(decoded.project_values(1).is_empty());
    }

    #[test]
    fn compressed_columns_share_nodes() {
        let mut tree = Tree::new(Item::new("Message", ItemKind::Unknown));
        let root = tree.root();
        let mut item = Item::new("e", ItemKind::Element);
        item.values = vec![Value::Number(10.0), Value::Number(12.0), Value::Number(15.0)];
        let e = tree.add_child(root, item);

        let decoded = DecodedMessage {
            tree,
            subsets: vec![root],
            compressed: true,
            number_of_subsets: 3,
            definitions: TableDefinitions::default(),
            loaded_b: FxHashMap::default(),
        };

        let grid = decoded.project_values(0);
        assert_eq!((grid.rows(), grid.cols()), (1, 3));
        assert_eq!(grid.row(0), &[e, e, e]);
        let values: Vec<_> = (0..3).filter_map(|c| decoded.value(e, c)).collect();
        assert_eq!(
            values,
            [&Value::Number(10.0), &Value::Number(12.0), &Value::Number(15.0)]
        );
    }
}
