use std::fmt;
use std::ops::{Index, IndexMut};

use num_traits::{One, Zero};

use crate::error::{Result, VmlError};

#[derive(Clone, Debug, PartialEq)]
pub struct Array2<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Array2<T> {
    pub fn from_shape_vec(shape: (usize, usize), data: Vec<T>) -> Result<Self> {
        let (rows, cols) = shape;
        if data.len() != rows * cols {
            return Err(VmlError::dims(
                "Array2::from_shape_vec",
                format!("{} elements for shape ({}, {})", rows * cols, rows, cols),
                format!("{} elements", data.len()),
            ));
        }
        Ok(Self { data, rows, cols })
    }

    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        Self::from_shape_vec((rows, cols), data)
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row(&self, row: usize) -> &[T] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        let start = self.offset(row, 0);
        let cols = self.cols;
        &mut self.data[start..start + cols]
    }

    /// Iterate over the rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    pub fn column(&self, col: usize) -> Vec<T>
    where
        T: Clone,
    {
        assert!(col < self.cols, "column index out of bounds");
        (0..self.rows).map(|row| self[(row, col)].clone()).collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> Array2<T>
    where
        T: Clone,
    {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &row in indices {
            data.extend_from_slice(self.row(row));
        }
        Array2 {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    pub fn mapv<U, F>(&self, mut f: F) -> Array2<U>
    where
        F: FnMut(&T) -> U,
    {
        Array2 {
            data: self.data.iter().map(|v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.clone()
    }

    /// Nested row vectors, the shape the JSON dataset format uses.
    pub fn to_rows(&self) -> Vec<Vec<T>>
    where
        T: Clone,
    {
        self.rows().map(|r| r.to_vec()).collect()
    }
}

impl<T: Clone> Array2<T> {
    /// Build a matrix from equally sized rows. An empty slice yields a 0x0 matrix.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(VmlError::dims(
                    "Array2::from_rows",
                    format!("row of length {}", cols),
                    format!("row {} of length {}", i, row.len()),
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    pub fn from_elem(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }
}

impl<T: Clone + Zero> Array2<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_elem(rows, cols, T::zero())
    }
}

impl<T: Clone + Zero + One> Array2<T> {
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = T::one();
        }
        m
    }

    pub fn from_diag(diag: &[T]) -> Self {
        let mut m = Self::zeros(diag.len(), diag.len());
        for (i, v) in diag.iter().enumerate() {
            m[(i, i)] = v.clone();
        }
        m
    }
}

impl<T> Default for Array2<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            rows: 0,
            cols: 0,
        }
    }
}

impl<T> Index<(usize, usize)> for Array2<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let offset = self.offset(index.0, index.1);
        &self.data[offset]
    }
}

impl<T> IndexMut<(usize, usize)> for Array2<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let offset = self.offset(index.0, index.1);
        &mut self.data[offset]
    }
}

impl<T: fmt::Display> fmt::Display for Array2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            write!(f, "[")?;
            for (c, value) in self.row(r).iter().enumerate() {
                write!(f, "{}", value)?;
                if c + 1 != self.cols {
                    write!(f, ", ")?;
                }
            }
            write!(f, "]")?;
            if r + 1 != self.rows {
                write!(f, ", ")?;
            }
        }
        write!(f, "]")
    }
}
