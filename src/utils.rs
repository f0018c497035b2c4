use anyhow::{anyhow, Error};
use ndarray::Array2;
use prettytable::format::consts::FORMAT_BOX_CHARS;
use prettytable::{Cell, Row, Table};
use std::fmt::Display;

const LETTERS: usize = 26;

pub trait ToCharIndex {
    /// Letter name of a city, `A` for 0. Cities past `Z` keep their number.
    fn to_char_index(&self) -> String;
}

impl ToCharIndex for usize {
    fn to_char_index(&self) -> String {
        if *self < LETTERS {
            ((b'A' + *self as u8) as char).to_string()
        } else {
            self.to_string()
        }
    }
}

pub trait ToDisplayPath {
    fn to_display_path(&self) -> Result<String, Error>;
}

impl ToDisplayPath for [usize] {
    fn to_display_path(&self) -> Result<String, Error> {
        if self.is_empty() {
            return Err(anyhow!("Cannot display an empty path"));
        }

        let names: Vec<_> = self.iter().map(ToCharIndex::to_char_index).collect();
        Ok(names.join(" -> "))
    }
}

impl ToDisplayPath for Vec<usize> {
    fn to_display_path(&self) -> Result<String, Error> {
        self.as_slice().to_display_path()
    }
}

pub fn pretty_matrix(matrix: &Array2<f64>, precision: usize) -> Table {
    let shape = matrix.shape();
    let mut table = Table::new();
    table.set_format(*FORMAT_BOX_CHARS);

    let mut header = vec![Cell::new("")];
    header.extend((0..shape[1]).map(|c| Cell::new(&c.to_char_index())));
    table.set_titles(Row::new(header));

    for (r, values) in matrix.outer_iter().enumerate() {
        let mut cells = vec![Cell::new(&r.to_char_index())];
        cells.extend(values.iter().map(|v| Cell::new(&format_value(v, precision))));
        table.add_row(Row::new(cells));
    }

    table
}

fn format_value<T: Display>(value: &T, precision: usize) -> String {
    format!("{:.*}", precision, value)
}
