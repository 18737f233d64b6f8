//! Page flow – owns the vertical cursor and the page list, and decides when a
//! block no longer fits and forces a page break.
//!
//! Every atomic block goes through [`PageFlow::reserve`] (which may break)
//! and then [`PageFlow::advance`] (which moves the cursor past it). Blocks
//! are never split: a block either fits on the current page or moves, whole,
//! to a fresh one.

use serde::{Deserialize, Serialize};

use crate::document::{Page, TextBlock};
use crate::error::ExportError;

/// What to do with a block taller than a page's usable height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Start the block on a fresh page and let it run past the bottom
    /// margin. The page is then treated as full.
    #[default]
    Overflow,
    /// Fail the export with [`ExportError::BlockTooLarge`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Cursor sits after the last advanced block.
    OnPage,
    /// The last reservation broke the page; its block has not been advanced
    /// yet and will be the first block of the new page.
    JustBroke,
}

/// Vertical geometry the flow works against, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowGeometry {
    pub page_height: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    /// Gap added after every advanced block.
    pub block_spacing: f32,
}

impl FlowGeometry {
    /// Lowest y a block may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.page_height - self.bottom_margin
    }

    pub fn usable_height(&self) -> f32 {
        self.bottom_limit() - self.top_margin
    }
}

pub struct PageFlow {
    geometry: FlowGeometry,
    policy: OversizePolicy,
    cursor: f32,
    state: FlowState,
    pages: Vec<Page>,
    /// Page numbers whose content is locked in, in order.
    finalized: Vec<usize>,
    /// Height of a block reserved but not yet advanced.
    pending: Option<f32>,
}

impl PageFlow {
    pub fn new(geometry: FlowGeometry, policy: OversizePolicy) -> Self {
        Self {
            geometry,
            policy,
            cursor: geometry.top_margin,
            state: FlowState::OnPage,
            pages: vec![Page::new(1)],
            finalized: Vec::new(),
            pending: None,
        }
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn finalized_pages(&self) -> &[usize] {
        &self.finalized
    }

    pub fn geometry(&self) -> &FlowGeometry {
        &self.geometry
    }

    fn current_page_mut(&mut self) -> &mut Page {
        // `pages` always holds at least the first page.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Nothing has been advanced on the current page yet.
    fn page_is_empty(&self) -> bool {
        self.cursor <= self.geometry.top_margin
    }

    /// Make room for a block of `height`, breaking the page first when it
    /// would end below the bottom margin. Returns the 1-based page the block
    /// lands on.
    pub fn reserve(&mut self, height: f32) -> Result<usize, ExportError> {
        if self.pending.is_some() {
            return Err(ExportError::InternalLayout(
                "block reserved twice without advancing".to_string(),
            ));
        }
        if !height.is_finite() || height < 0.0 {
            return Err(ExportError::InternalLayout(format!(
                "invalid block height {height}"
            )));
        }

        let usable = self.geometry.usable_height();
        if height > usable {
            match self.policy {
                OversizePolicy::Reject => {
                    return Err(ExportError::BlockTooLarge { height, usable });
                }
                OversizePolicy::Overflow => {
                    log::warn!(
                        "block of {height:.1}pt exceeds usable height {usable:.1}pt; it will overflow the bottom margin"
                    );
                }
            }
        }

        if self.cursor + height > self.geometry.bottom_limit() && !self.page_is_empty() {
            self.break_page();
        }

        self.pending = Some(height);
        Ok(self.page_count())
    }

    /// Move the cursor past the block most recently reserved.
    pub fn advance(&mut self, height: f32) -> Result<(), ExportError> {
        let Some(reserved) = self.pending.take() else {
            return Err(ExportError::InternalLayout(
                "advance without a matching reserve".to_string(),
            ));
        };
        if (reserved - height).abs() > f32::EPSILON {
            return Err(ExportError::InternalLayout(format!(
                "advanced {height}pt but reserved {reserved}pt"
            )));
        }

        let limit = self.geometry.bottom_limit();
        let end = self.cursor + height;
        if end > limit {
            if !(self.page_is_empty() && height > self.geometry.usable_height()) {
                return Err(ExportError::InternalLayout(format!(
                    "block ends at {end:.2}pt, below bottom limit {limit:.2}pt"
                )));
            }
            // An overflowing block fills its page.
            self.cursor = limit;
        } else {
            self.cursor = (end + self.geometry.block_spacing).min(limit);
        }
        self.state = FlowState::OnPage;
        self.check_cursor()
    }

    /// Extra vertical space between blocks, clamped to the bottom limit.
    pub fn skip(&mut self, space: f32) -> Result<(), ExportError> {
        if self.pending.is_some() {
            return Err(ExportError::InternalLayout(
                "spacing added while a block is reserved".to_string(),
            ));
        }
        self.cursor = (self.cursor + space.max(0.0)).min(self.geometry.bottom_limit());
        self.check_cursor()
    }

    /// Reserve, position and advance `block` in one step.
    pub fn place(&mut self, mut block: TextBlock) -> Result<usize, ExportError> {
        let height = block.height;
        let page = self.reserve(height)?;
        block.y = self.cursor;
        log::debug!(
            "placing {:?} block ({height:.1}pt) on page {page} at y={:.1}",
            block.kind,
            block.y
        );
        self.current_page_mut().blocks.push(block);
        self.advance(height)?;
        Ok(page)
    }

    /// Lock in the last page and hand over every page.
    pub fn finish(mut self) -> Result<Vec<Page>, ExportError> {
        if self.pending.is_some() {
            return Err(ExportError::InternalLayout(
                "layout finished with a block still reserved".to_string(),
            ));
        }
        self.finalized.push(self.pages.len());
        debug_assert_eq!(self.finalized.len(), self.pages.len());
        Ok(self.pages)
    }

    fn break_page(&mut self) {
        let finished = self.pages.len();
        self.finalized.push(finished);
        self.pages.push(Page::new(finished + 1));
        self.cursor = self.geometry.top_margin;
        self.state = FlowState::JustBroke;
        log::debug!("page break after page {finished}");
    }

    fn check_cursor(&self) -> Result<(), ExportError> {
        let (top, limit) = (self.geometry.top_margin, self.geometry.bottom_limit());
        if self.cursor < top || self.cursor > limit {
            return Err(ExportError::InternalLayout(format!(
                "cursor {:.2}pt outside [{top:.2}, {limit:.2}]",
                self.cursor
            )));
        }
        Ok(())
    }
}
