//! Logical button to physical LED mapping.
//!
//! A [`Matrix`] is a grid of cells laid out like the buttons on the stick.
//! Every button the layout knows about occupies a fixed cell even when no LED
//! is assigned to it, so the grid shape only depends on the layout.

use heapless::Vec;

use crate::options::ButtonLabel::{
    Down, Left, Right, Up, A1, A2, B1, B2, B3, B4, L1, L2, L3, R1, R2, R3, S1, S2,
};
use crate::options::{ButtonIndices, ButtonLabel, ButtonLayout, ConfigError, MAX_LEDS_PER_BUTTON};

/// Rows in the tallest layout (hitbox).
pub const MAX_ROWS: usize = 9;
/// Cells in the widest row (arcade system row).
pub const MAX_ROW_WIDTH: usize = 10;
/// Upper bound on pixels in any layout.
pub const MAX_PIXELS: usize = ButtonLabel::COUNT;

/// One button's binding: logical index, input mask and the strip positions it lights.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pixel {
    pub index: Option<u8>,
    pub mask: u32,
    pub positions: Vec<u8, MAX_LEDS_PER_BUTTON>,
}

impl Pixel {
    /// True if any bit of `input_mask` belongs to this pixel.
    #[inline]
    #[must_use]
    pub fn is_pressed(&self, input_mask: u32) -> bool {
        self.mask & input_mask != 0
    }
}

/// A row of cells; `None` is an empty grid position.
pub type Row = Vec<Option<Pixel>, MAX_ROW_WIDTH>;

/// Pixels currently pressed, in matrix scan order.
pub type PressedPixels = Vec<Pixel, MAX_PIXELS>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Matrix {
    rows: Vec<Row, MAX_ROWS>,
}

impl Matrix {
    /// An empty matrix with no rows.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Widest row length.
    #[must_use]
    pub fn max_columns(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Iterate over every present pixel, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = &Pixel> {
        self.rows.iter().flat_map(|r| r.iter().flatten())
    }

    /// Number of strip LEDs driven by button pixels.
    #[must_use]
    pub fn led_count(&self) -> usize {
        self.pixels().map(|p| p.positions.len()).sum()
    }

    /// Pixels whose mask intersects `input_mask`.
    #[must_use]
    pub fn pressed(&self, input_mask: u32) -> PressedPixels {
        let mut out = PressedPixels::new();
        for pixel in self.pixels().filter(|p| p.is_pressed(input_mask)) {
            // A layout never holds more than MAX_PIXELS buttons.
            let _ = out.push(pixel.clone());
        }
        out
    }
}

type Cell = Option<ButtonLabel>;

const EMPTY: Cell = None;

const fn cell(label: ButtonLabel) -> Cell {
    Some(label)
}

const ARCADE: &[&[Cell]] = &[
    &[cell(B3), cell(B1)],
    &[cell(B4), cell(B2)],
    &[cell(R1), cell(R2)],
    &[cell(L1), cell(L2)],
    &[
        cell(Left),
        cell(Down),
        cell(Right),
        cell(Up),
        cell(S1),
        cell(S2),
        cell(L3),
        cell(R3),
        cell(A1),
        cell(A2),
    ],
];

const HITBOX: &[&[Cell]] = &[
    &[cell(Left), EMPTY, EMPTY],
    &[cell(Down), EMPTY, EMPTY],
    &[cell(Right), EMPTY, EMPTY],
    &[EMPTY, cell(Up)],
    &[cell(B3), cell(B1), EMPTY],
    &[cell(B4), cell(B2), EMPTY],
    &[cell(R1), cell(R2), EMPTY],
    &[cell(L1), cell(L2), EMPTY],
    &[cell(S1), cell(S2), cell(L3), cell(R3), cell(A1), cell(A2)],
];

const WASD: &[&[Cell]] = &[
    &[EMPTY, cell(Left)],
    &[cell(Up), cell(Down)],
    &[EMPTY, cell(Right)],
    &[cell(B3), cell(B1)],
    &[cell(B4), cell(B2)],
    &[cell(R1), cell(R2)],
    &[cell(L1), cell(L2)],
    &[cell(S1), cell(S2), cell(L3), cell(R3), cell(A1), cell(A2)],
];

fn cells(layout: ButtonLayout) -> &'static [&'static [Cell]] {
    match layout {
        ButtonLayout::Arcade => ARCADE,
        ButtonLayout::Hitbox => HITBOX,
        ButtonLayout::Wasd => WASD,
    }
}

/// Strip positions for logical slot `index` when each button drives `leds_per_button` LEDs.
fn positions_for(index: u8, leds_per_button: u8) -> Vec<u8, MAX_LEDS_PER_BUTTON> {
    let start = u16::from(index) * u16::from(leds_per_button);
    (start..start + u16::from(leds_per_button))
        .filter_map(|p| u8::try_from(p).ok())
        .take(MAX_LEDS_PER_BUTTON)
        .collect()
}

/// Build the LED matrix for `layout`.
///
/// `button_count` is the number of logical slots; slot `i` covers strip
/// positions `i * leds_per_button .. (i + 1) * leds_per_button`.
pub fn build_layout(
    layout: ButtonLayout,
    leds_per_button: u8,
    button_count: usize,
    indices: &ButtonIndices,
) -> Result<Matrix, ConfigError> {
    if leds_per_button == 0 || usize::from(leds_per_button) > MAX_LEDS_PER_BUTTON {
        return Err(ConfigError::InvalidLedsPerButton(leds_per_button));
    }
    indices.validate(button_count)?;

    let mut matrix = Matrix::empty();
    for source in cells(layout) {
        let mut row = Row::new();
        for cell in source.iter() {
            let pixel = cell.map(|label| {
                let index = indices.get(label);
                Pixel {
                    index,
                    mask: label.mask(),
                    positions: index
                        .map(|i| positions_for(i, leds_per_button))
                        .unwrap_or_default(),
                }
            });
            // Tables are sized to fit MAX_ROW_WIDTH and MAX_ROWS.
            let _ = row.push(pixel);
        }
        let _ = matrix.rows.push(row);
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_assigned() -> ButtonIndices {
        let mut ix = ButtonIndices::UNASSIGNED;
        for (i, label) in ButtonLabel::ALL.iter().enumerate() {
            ix.set(*label, Some(i as u8));
        }
        ix
    }

    fn shape(m: &Matrix) -> (usize, usize) {
        (m.rows().len(), m.max_columns())
    }

    #[test]
    fn test_shape_independent_of_indices() {
        for layout in [ButtonLayout::Arcade, ButtonLayout::Hitbox, ButtonLayout::Wasd] {
            let full = build_layout(layout, 2, ButtonLabel::COUNT, &all_assigned()).unwrap();
            let none = build_layout(layout, 2, 0, &ButtonIndices::UNASSIGNED).unwrap();
            assert_eq!(shape(&full), shape(&none));
            assert_eq!(full.pixels().count(), none.pixels().count());
        }
        let arcade = build_layout(ButtonLayout::Arcade, 1, 0, &ButtonIndices::UNASSIGNED).unwrap();
        assert_eq!(shape(&arcade), (5, 10));
        let hitbox = build_layout(ButtonLayout::Hitbox, 1, 0, &ButtonIndices::UNASSIGNED).unwrap();
        assert_eq!(shape(&hitbox), (9, 6));
        let wasd = build_layout(ButtonLayout::Wasd, 1, 0, &ButtonIndices::UNASSIGNED).unwrap();
        assert_eq!(shape(&wasd), (8, 6));
    }

    #[test]
    fn test_unassigned_pixel_keeps_mask() {
        let ix = ButtonIndices::UNASSIGNED.with(ButtonLabel::B1, 0);
        let m = build_layout(ButtonLayout::Arcade, 3, 1, &ix).unwrap();

        let b3 = m.rows()[0][0].as_ref().unwrap();
        assert_eq!(b3.index, None);
        assert_eq!(b3.mask, ButtonLabel::B3.mask());
        assert!(b3.positions.is_empty());

        let b1 = m.rows()[0][1].as_ref().unwrap();
        assert_eq!(b1.index, Some(0));
        assert_eq!(&b1.positions[..], &[0, 1, 2]);
        assert_eq!(m.led_count(), 3);
    }

    #[test]
    fn test_positions_follow_logical_index() {
        let ix = ButtonIndices::UNASSIGNED
            .with(ButtonLabel::Left, 0)
            .with(ButtonLabel::Up, 1);
        let m = build_layout(ButtonLayout::Hitbox, 2, 2, &ix).unwrap();
        let up = m.rows()[3][1].as_ref().unwrap();
        assert_eq!(&up.positions[..], &[2, 3]);
        assert!(m.rows()[3][0].is_none());
    }

    #[test]
    fn test_build_is_deterministic() {
        let ix = all_assigned();
        let a = build_layout(ButtonLayout::Wasd, 4, ButtonLabel::COUNT, &ix).unwrap();
        let b = build_layout(ButtonLayout::Wasd, 4, ButtonLabel::COUNT, &ix).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.led_count(), ButtonLabel::COUNT * 4);
    }

    #[test]
    fn test_pressed_includes_unlit_buttons() {
        let ix = ButtonIndices::UNASSIGNED.with(ButtonLabel::B1, 0);
        let m = build_layout(ButtonLayout::Arcade, 1, 1, &ix).unwrap();
        let pressed = m.pressed(ButtonLabel::B1.mask() | ButtonLabel::Up.mask());
        assert_eq!(pressed.len(), 2);
        assert_eq!(pressed[0].mask, ButtonLabel::B1.mask());
        assert_eq!(pressed[1].mask, ButtonLabel::Up.mask());
        assert!(m.pressed(0).is_empty());
    }

    #[test]
    fn test_rejects_bad_input() {
        let ix = ButtonIndices::UNASSIGNED
            .with(ButtonLabel::B1, 0)
            .with(ButtonLabel::B2, 0);
        assert_eq!(
            build_layout(ButtonLayout::Arcade, 1, 2, &ix),
            Err(ConfigError::DuplicateIndex(0))
        );
        assert_eq!(
            build_layout(ButtonLayout::Arcade, 5, 0, &ButtonIndices::UNASSIGNED),
            Err(ConfigError::InvalidLedsPerButton(5))
        );
    }
}
