/// Single grid axis used for row and column counts.
pub type Coord = u8;

/// Count type used for card, pair, and match totals.
pub type CardCount = u16;

/// Index into the face-image set; exactly two cards share a face id in a valid deck.
pub type FaceId = u16;

pub const fn mult(a: Coord, b: Coord) -> CardCount {
    let a = a as CardCount;
    let b = b as CardCount;
    a.saturating_mul(b)
}
