//! Column-strobe, row-sample matrix scanner with counter-based debounce.
//!
//! Generic over `R` rows and `C` columns so the 4x4 (3 finger rows + 1
//! wide thumb row) shape is a parameter, not a hardcoded constant, the
//! way the teacher keeps its column/row counts as const generics instead
//! of baking them into the scan routine.

use crate::hal::MatrixPins;

/// Ticks the debounced matrix must stay unchanged before it's accepted
/// into the live matrix.
pub const DEBOUNCE: u8 = 5;

/// Column-strobe settle time before rows are sampled, in microseconds.
pub const SETTLE_US: u32 = 30;

/// The debounced key matrix. `R` rows by `C` columns; row `r`'s bit `c`
/// is set iff that key is currently considered pressed.
pub struct Matrix<const R: usize, const C: usize> {
    live: [u8; R],
    debouncing: [u8; R],
    countdown: u8,
    modified: bool,
}

impl<const R: usize, const C: usize> Matrix<R, C> {
    /// An empty matrix, nothing pressed, not debouncing.
    pub fn new() -> Self {
        Matrix {
            live: [0; R],
            debouncing: [0; R],
            countdown: 0,
            modified: false,
        }
    }

    /// Strobes every column, samples rows, folds any newly observed
    /// changes into `debouncing`, and (if the debounce countdown has
    /// elapsed with no further change) commits `debouncing` into `live`.
    ///
    /// `delay_us` busy-waits the column settle time; `elapsed_ms` is
    /// called once per tick to learn whether at least 1 ms has passed,
    /// matching the original's "per-loop delay while debouncing".
    pub fn scan<P: MatrixPins<C>>(&mut self, pins: &mut P, mut delay_us: impl FnMut(u32)) -> bool {
        self.modified = false;
        for c in 0..C {
            pins.select_col(c);
            delay_us(SETTLE_US);
            let rows = pins.read_rows();
            pins.unselect_cols();
            for r in 0..R {
                let bit = 1u8 << c;
                let pressed = rows & (1 << r) != 0;
                let was = self.debouncing[r] & bit != 0;
                if pressed != was {
                    if pressed {
                        self.debouncing[r] |= bit;
                    } else {
                        self.debouncing[r] &= !bit;
                    }
                    self.countdown = DEBOUNCE;
                }
            }
        }
        if self.countdown > 0 {
            self.countdown -= 1;
            if self.countdown == 0 && self.debouncing != self.live {
                self.live = self.debouncing;
                self.modified = true;
            }
        }
        self.modified
    }

    /// Is `(r, c)` currently pressed in the live (debounced) matrix?
    pub fn is_on(&self, r: usize, c: usize) -> bool {
        self.live[r] & (1 << c) != 0
    }

    /// The live bitmap for row `r`, one bit per column.
    pub fn get_row(&self, r: usize) -> u8 {
        self.live[r]
    }

    /// True only on the scan that just committed a debounced change.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl<const R: usize, const C: usize> Default for Matrix<R, C> {
    fn default() -> Self {
        Self::new()
    }
}
