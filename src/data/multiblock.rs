//! Composite data: a tree of data objects with per-block metadata.

use std::sync::Arc;

use crate::data::attributes::FieldData;
use crate::data::object::DataObject;
use crate::data::points::Bounds;
use crate::information::Information;
use crate::information::keys::NAME;

/// One child slot: metadata plus an optional (possibly shared) data object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    metadata: Information,
    data: Option<Arc<DataObject>>,
}

impl Block {
    pub fn metadata(&self) -> &Information {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Information {
        &mut self.metadata
    }

    pub fn data(&self) -> Option<&DataObject> {
        self.data.as_deref()
    }

    pub fn name(&self) -> Option<String> {
        self.metadata.get(NAME)
    }
}

/// Ordered list of blocks; a block may itself be a [`MultiBlockDataSet`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiBlockDataSet {
    blocks: Vec<Block>,
    field_data: FieldData,
}

impl MultiBlockDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Grow or shrink to `n` blocks; new blocks are null.
    pub fn set_number_of_blocks(&mut self, n: usize) {
        self.blocks.resize_with(n, Block::default);
    }

    /// Set block `i`, growing the list when needed.
    pub fn set_block(&mut self, i: usize, data: Option<Arc<DataObject>>) {
        if i >= self.blocks.len() {
            self.set_number_of_blocks(i + 1);
        }
        self.blocks[i].data = data;
    }

    /// Append a named block and return its index.
    pub fn push_block(&mut self, name: impl Into<String>, data: Option<Arc<DataObject>>) -> usize {
        let mut block = Block {
            metadata: Information::new(),
            data,
        };
        block.metadata.set(NAME, name.into());
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    pub fn block(&self, i: usize) -> Option<&DataObject> {
        self.blocks.get(i)?.data()
    }

    pub fn block_entry(&self, i: usize) -> Option<&Block> {
        self.blocks.get(i)
    }

    pub fn metadata_mut(&mut self, i: usize) -> Option<&mut Information> {
        self.blocks.get_mut(i).map(Block::metadata_mut)
    }

    pub fn block_name(&self, i: usize) -> Option<String> {
        self.blocks.get(i)?.name()
    }

    pub fn set_block_name(&mut self, i: usize, name: impl Into<String>) {
        if i >= self.blocks.len() {
            self.set_number_of_blocks(i + 1);
        }
        self.blocks[i].metadata.set(NAME, name.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Non-composite, non-null leaves in depth-first order.
    pub fn leaves(&self) -> Vec<&DataObject> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a DataObject>) {
        for block in &self.blocks {
            match block.data() {
                Some(DataObject::MultiBlockDataSet(child)) => child.collect_leaves(out),
                Some(leaf) => out.push(leaf),
                None => {}
            }
        }
    }

    pub fn number_of_points(&self) -> usize {
        self.leaves().iter().map(|d| d.number_of_points()).sum()
    }

    pub fn number_of_cells(&self) -> usize {
        self.leaves().iter().map(|d| d.number_of_cells()).sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.leaves()
            .iter()
            .filter_map(|d| d.bounds())
            .reduce(|a, b| {
                let mut u = a;
                for axis in 0..3 {
                    u[2 * axis] = a[2 * axis].min(b[2 * axis]);
                    u[2 * axis + 1] = a[2 * axis + 1].max(b[2 * axis + 1]);
                }
                u
            })
    }

    pub fn field_data(&self) -> &FieldData {
        &self.field_data
    }

    pub fn field_data_mut(&mut self) -> &mut FieldData {
        &mut self.field_data
    }

    /// Deep copy of every child.
    pub fn deep_copy(&self) -> Self {
        Self {
            blocks: self
                .blocks
                .iter()
                .map(|b| Block {
                    metadata: b.metadata.clone(),
                    data: b.data.as_ref().map(|d| Arc::new(d.deep_copy())),
                })
                .collect(),
            field_data: self.field_data.deep_copy(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.leaves().iter().map(|d| d.memory_size()).sum::<usize>() + self.field_data.memory_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::image::ImageData;
    use crate::data::table::Table;

    #[test]
    fn nested_blocks_flatten_to_leaves() {
        let mut inner = MultiBlockDataSet::new();
        inner.push_block("img", Some(Arc::new(ImageData::with_dimensions([2, 2, 1]).into())));
        inner.push_block("missing", None);
        let mut outer = MultiBlockDataSet::new();
        outer.push_block("table", Some(Arc::new(Table::new().into())));
        outer.push_block("inner", Some(Arc::new(inner.into())));
        assert_eq!(outer.number_of_blocks(), 2);
        assert_eq!(outer.block_name(1).as_deref(), Some("inner"));
        assert_eq!(outer.leaves().len(), 2);
        assert_eq!(outer.number_of_points(), 4);
    }

    #[test]
    fn deep_copy_duplicates_children() {
        let mut mb = MultiBlockDataSet::new();
        let shared = Arc::new(DataObject::from(ImageData::with_dimensions([3, 1, 1])));
        mb.push_block("a", Some(shared.clone()));
        let copy = mb.deep_copy();
        assert_eq!(copy, mb);
        let copied = copy.block_entry(0).and_then(|b| b.data.clone()).unwrap();
        assert!(!Arc::ptr_eq(&copied, &shared));
    }
}
