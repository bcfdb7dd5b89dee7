/// Table view model: layout, row expansion, and row actions
use std::sync::Arc;

use crate::catalog::{Catalog, Snapshot};
use crate::shape::{ShapeDraft, ShapeId, ShapeKind, ShapeRecord};
use crate::storage::KeyValueStore;

/// Default collapse breakpoint, in terminal columns
pub const DEFAULT_BREAKPOINT: u16 = 60;

pub const COLUMNS: [&str; 4] = ["ID", "Name", "Type", "Actions"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Multi-column table
    Full,
    /// One name per row; tapping a row reveals its details
    Collapsed,
}

impl TableLayout {
    pub fn for_width(width: u16, breakpoint: u16) -> Self {
        if width >= breakpoint {
            TableLayout::Full
        } else {
            TableLayout::Collapsed
        }
    }
}

/// Shapes handed to the viewer
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub shapes: Snapshot,
}

/// One displayed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: ShapeId,
    pub name: String,
    pub kind: ShapeKind,
    pub type_label: String,
    pub expanded: bool,
    pub highlighted: bool,
}

#[derive(Debug)]
pub struct TableView<S> {
    catalog: Catalog<S>,
    layout: TableLayout,
    breakpoint: u16,
    cursor: usize,
}

impl<S: KeyValueStore> TableView<S> {
    pub fn new(catalog: Catalog<S>, width: u16, breakpoint: u16) -> Self {
        Self {
            catalog,
            layout: TableLayout::for_width(width, breakpoint),
            breakpoint,
            cursor: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog<S> {
        &mut self.catalog
    }

    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    /// Re-evaluate the layout for a new viewport width
    pub fn resize(&mut self, width: u16) {
        let layout = TableLayout::for_width(width, self.breakpoint);
        if layout != self.layout {
            log::debug!("table layout {:?} -> {:?}", self.layout, layout);
            if layout == TableLayout::Full {
                self.catalog.collapse();
            }
            self.layout = layout;
        }
    }

    pub fn rows(&self) -> Vec<TableRow> {
        let expanded = self.catalog.expanded();
        self.catalog
            .shapes()
            .iter()
            .enumerate()
            .map(|(i, shape)| TableRow {
                id: shape.id,
                name: shape.name.clone(),
                kind: shape.kind,
                type_label: shape.type_label().to_string(),
                expanded: self.layout == TableLayout::Collapsed && expanded == Some(shape.id),
                highlighted: i == self.cursor,
            })
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.catalog.len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    pub fn highlighted(&self) -> Option<&ShapeRecord> {
        self.catalog.shapes().get(self.cursor)
    }

    /// Toggle row details; only meaningful in the collapsed layout
    pub fn tap(&mut self, id: ShapeId) {
        if self.layout == TableLayout::Collapsed {
            self.catalog.toggle_expanded(id);
        }
    }

    pub fn create(&mut self, draft: ShapeDraft, now_ms: u64) -> ShapeRecord {
        let record = self.catalog.create(draft, now_ms);
        self.cursor = self.catalog.len() - 1;
        record
    }

    pub fn delete(&mut self, id: ShapeId) {
        self.catalog.remove(id);
        self.move_cursor(0);
    }

    /// Viewer request for a single shape
    pub fn render_one(&self, id: ShapeId) -> Option<RenderRequest> {
        self.catalog.get(id).map(|shape| RenderRequest {
            shapes: Arc::from(vec![shape.clone()]),
        })
    }

    /// Viewer request for the whole catalog
    pub fn render_all(&self) -> RenderRequest {
        RenderRequest {
            shapes: self.catalog.snapshot(),
        }
    }
}
