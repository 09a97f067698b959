use serde::{Deserialize, Serialize};

use crate::{Coord, GameConfig, GameError, Result};

/// Gap between neighboring cards and between the grid and the container edge.
pub const DEFAULT_SPACING: f32 = 10.0;

/// Upper bound on the card edge length, matching the original asset size.
pub const DEFAULT_CARD_SIZE: f32 = 240.0;

/// Largest square card edge that fits an `rows` x `cols` grid inside the
/// container, clamped to `max_size`.
pub fn card_size(
    container_w: f32,
    container_h: f32,
    rows: Coord,
    cols: Coord,
    spacing: f32,
    max_size: f32,
) -> Result<f32> {
    if rows == 0 || cols == 0 {
        return Err(GameError::EmptyGrid);
    }

    let rows = rows as f32;
    let cols = cols as f32;
    let max_width = (container_w - spacing * (cols + 1.0)) / cols;
    let max_height = (container_h - spacing * (rows + 1.0)) / rows;
    let fitted = max_size.min(max_width.min(max_height));

    // a NaN container fails this comparison too
    if fitted > 0.0 {
        Ok(fitted)
    } else {
        Err(GameError::ContainerTooSmall)
    }
}

/// Center of the card at `(row, col)` in a grid centered on the origin.
/// Rows grow downwards (negative y), columns grow to the right.
pub fn position(
    row: Coord,
    col: Coord,
    rows: Coord,
    cols: Coord,
    card_size: f32,
    spacing: f32,
) -> (f32, f32) {
    let step = card_size + spacing;
    let total_width = step * cols as f32 - spacing;
    let total_height = step * rows as f32 - spacing;

    let x = -total_width / 2.0 + card_size / 2.0 + step * col as f32;
    let y = total_height / 2.0 - card_size / 2.0 - step * row as f32;
    (x, y)
}

/// Resolved layout for one round: grid dimensions plus the computed card size.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: Coord,
    pub cols: Coord,
    pub card_size: f32,
    pub spacing: f32,
    pub container: (f32, f32),
}

impl GridSpec {
    pub fn compute(
        config: &GameConfig,
        container_w: f32,
        container_h: f32,
        spacing: f32,
        max_size: f32,
    ) -> Result<Self> {
        let card_size = card_size(
            container_w,
            container_h,
            config.rows,
            config.cols,
            spacing,
            max_size,
        )?;
        Ok(Self {
            rows: config.rows,
            cols: config.cols,
            card_size,
            spacing,
            container: (container_w, container_h),
        })
    }

    /// Row-major slot for a deck index.
    pub fn slot_of(&self, index: usize) -> (Coord, Coord) {
        let cols = self.cols as usize;
        ((index / cols) as Coord, (index % cols) as Coord)
    }

    pub fn position_of(&self, row: Coord, col: Coord) -> (f32, f32) {
        position(row, col, self.rows, self.cols, self.card_size, self.spacing)
    }

    /// Positions for every slot in deck order.
    pub fn iter_positions(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        let total = self.rows as usize * self.cols as usize;
        (0..total).map(|index| {
            let (row, col) = self.slot_of(index);
            self.position_of(row, col)
        })
    }
}
