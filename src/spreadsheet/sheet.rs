use crate::spreadsheet::cell::Cell;

/// Represents a worksheet read from a spreadsheet file, holding its used cells in row-major order.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// All cells in the sheet
    pub(crate) cells: Vec<Cell>,
    /// Actual data range (determined from cell data)
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    /// Creates a new empty sheet.
    pub(super) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_upper_bound: None,
            col_upper_bound: None,
        }
    }

    /// Number of physical rows from the first row up to the last used row.
    pub(crate) fn row_count(&self) -> usize {
        self.row_upper_bound.map(|row| row + 1).unwrap_or(0)
    }

    /// Number of physical columns from column A up to the last used column.
    pub(crate) fn col_count(&self) -> usize {
        self.col_upper_bound.map(|col| col + 1).unwrap_or(0)
    }

    /// Adds a cell to the sheet, updating the data range.
    pub(super) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    /// Updates the actual data range boundaries based on cell positions.
    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Retrieves rows `row_lower..=row_upper` as a 2D table of optional cell references,
    /// spanning columns from A to the last used column.
    pub(crate) fn grid(&self, row_lower: usize, row_upper: usize) -> Vec<Vec<Option<&Cell>>> {
        let width = self.col_count();
        let mut table: Vec<Vec<Option<&Cell>>> = (row_lower..=row_upper)
            .map(|_| vec![None; width])
            .collect();
        for cell in &self.cells {
            if row_lower <= cell.row && cell.row <= row_upper {
                table[cell.row - row_lower][cell.col] = Some(cell);
            }
        }
        table
    }
}
