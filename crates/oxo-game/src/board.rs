//! The 3x3 board and its textual rendering.

use std::fmt::Write as _;

/// One cell's mark. There is no `Mark::Null` — an empty cell is simply
/// absent from the board, represented as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn glyph(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

/// Nine cells, numbered 1-9 left-to-right, top-to-bottom, matching the
/// digit the wire protocol's move text names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Mark>; 9],
}

impl Board {
    pub fn empty() -> Self {
        Self { cells: [None; 9] }
    }

    /// `cell` is 1-9. Panics on out-of-range input — callers must
    /// validate against the move grammar first.
    pub fn get(&self, cell: u8) -> Option<Mark> {
        self.cells[(cell - 1) as usize]
    }

    pub fn set(&mut self, cell: u8, mark: Mark) {
        self.cells[(cell - 1) as usize] = mark.into();
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Returns the mark that has three in a row, if any, checking all
    /// three rows, three columns, and both diagonals.
    pub fn winning_mark(&self) -> Option<Mark> {
        const LINES: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8],
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8],
            [0, 4, 8],
            [2, 4, 6],
        ];
        LINES.iter().find_map(|line| {
            let [a, b, c] = *line;
            let mark = self.cells[a]?;
            if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                Some(mark)
            } else {
                None
            }
        })
    }

    /// Multi-line rendering of the board with grid separators, e.g.:
    /// ```text
    /// X| |O
    /// -----
    ///  |X|
    /// -----
    /// O| |X
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in 0..3 {
            if row > 0 {
                out.push_str("-----\n");
            }
            for col in 0..3 {
                if col > 0 {
                    out.push('|');
                }
                let idx = row * 3 + col;
                match self.cells[idx] {
                    Some(mark) => out.push(mark.glyph()),
                    None => out.push(' '),
                }
            }
            let _ = writeln!(out);
        }
        out
    }
}
