//! Fixed placement of every layer, in pixels of the background layout.

use crate::raster::{PointPx, SizePx};

/// Window kept from the artwork before it is scaled onto the card.
pub const ARTWORK_WINDOW: SizePx = SizePx::new(497, 713);
pub const ARTWORK_SIZE: SizePx = SizePx::new(950, 1360);
pub const ARTWORK_OFFSET: PointPx = PointPx::new(301, 227);

pub const DIGIT_SIZE: SizePx = SizePx::new(140, 211);
pub const DIGIT_Y: i32 = 191;
pub const SINGLE_DIGIT_X: i32 = 206;
/// Tens and units x when one of the digits is a `1`.
pub const NARROW_PAIR_X: (i32, i32) = (143, 230);
pub const WIDE_PAIR_X: (i32, i32) = (160, 258);

/// Shared by the position icon and the spy token.
pub const SLOT_SIZE: SizePx = SizePx::new(236, 236);
pub const SLOT_OFFSET: PointPx = PointPx::new(150, 438);

pub const HOURGLASS_SIZE: SizePx = SizePx::new(192, 192);
pub const HOURGLASS_OFFSET: PointPx = PointPx::new(132, 811);
pub const TURNS_SIZE: SizePx = SizePx::new(121, 183);
pub const TURNS_OFFSET: PointPx = PointPx::new(272, 806);
