//! Slide-out drawer visibility shared by both basket kinds.

use serde::{Deserialize, Serialize};

/// Whether a basket's drawer is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Drawer {
    pub is_open: bool,
}

impl Drawer {
    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }
}
