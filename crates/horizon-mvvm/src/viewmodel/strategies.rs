//! What a view model shows: which children become rows, and which cells a
//! row has.

use crate::error::Result;
use crate::model::SessionItem;

/// Picks the children of an item that become rows.
pub trait ChildrenStrategy {
    /// Children of `item` to show, in display order.
    fn children(&self, item: &SessionItem) -> Result<Vec<SessionItem>>;
}

/// Every child, in tag registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllChildrenStrategy;

impl ChildrenStrategy for AllChildrenStrategy {
    fn children(&self, item: &SessionItem) -> Result<Vec<SessionItem>> {
        item.children()
    }
}

/// Every child except those held in single-property tags.
///
/// Property items (the axes of a viewport, say) are part of their owner and
/// are edited through it, so a tree of "top" items hides them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopItemsStrategy;

impl ChildrenStrategy for TopItemsStrategy {
    fn children(&self, item: &SessionItem) -> Result<Vec<SessionItem>> {
        let mut children = Vec::new();
        for info in item.tag_infos()? {
            if !info.is_single_property_tag() {
                children.extend(item.items(info.name())?);
            }
        }
        Ok(children)
    }
}

/// One cell of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewColumn {
    /// The item's display name.
    Label,
    /// The named property of the item.
    Property(String),
}

/// Lays out the cells of the row showing an item.
pub trait RowStrategy {
    /// Cells of the row showing `item`.
    fn columns(&self, item: &SessionItem) -> Result<Vec<ViewColumn>>;

    /// Column header titles.
    fn horizontal_headers(&self) -> Vec<String>;
}

/// A single cell with the display name.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelRowStrategy;

impl RowStrategy for LabelRowStrategy {
    fn columns(&self, _item: &SessionItem) -> Result<Vec<ViewColumn>> {
        Ok(vec![ViewColumn::Label])
    }

    fn horizontal_headers(&self) -> Vec<String> {
        vec!["Name".to_string()]
    }
}

/// One cell per property.
///
/// With a fixed list of property names every row gets the same columns, which
/// is what a table needs; rows whose item lacks a property show an empty
/// cell. Without one, each row shows its own item's properties.
#[derive(Debug, Clone, Default)]
pub struct PropertiesRowStrategy {
    names: Vec<String>,
}

impl PropertiesRowStrategy {
    /// Columns follow each item's own properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed columns, one per name.
    pub fn with_properties<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl RowStrategy for PropertiesRowStrategy {
    fn columns(&self, item: &SessionItem) -> Result<Vec<ViewColumn>> {
        let names = if self.names.is_empty() {
            item.property_names()?
        } else {
            self.names.clone()
        };
        Ok(names.into_iter().map(ViewColumn::Property).collect())
    }

    fn horizontal_headers(&self) -> Vec<String> {
        self.names.clone()
    }
}
