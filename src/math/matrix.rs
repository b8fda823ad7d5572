use serde::{Serialize, Deserialize};
use std::ops::{Sub, Mul};

/// Dense row-major matrix. Used for flattened feature maps (`C × H·W`) and the
/// `C × C` Gram matrices built from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Builds a matrix from row vectors. An empty `data` yields a 0×0 matrix.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let cols = data.first().map_or(0, |row| row.len());
        Matrix {
            rows: data.len(),
            cols,
            data
        }
    }

    /// Σ x² over every element.
    pub fn sum_squares(&self) -> f64 {
        self.data.iter().flatten().map(|x| x * x).sum()
    }

    /// True when the matrix is square and `|a_ij - a_ji| <= tol` everywhere.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if self.rows != self.cols {
            return false;
        }
        (0..self.rows).all(|i| {
            (i + 1..self.cols).all(|j| (self.data[i][j] - self.data[j][i]).abs() <= tol)
        })
    }

    /// `self · selfᵀ` without materializing the transpose. The result is
    /// symmetric by construction: only the upper triangle is computed.
    pub fn outer_self(&self) -> Matrix {
        let mut res = Matrix::zeros(self.rows, self.rows);
        for i in 0..self.rows {
            for j in i..self.rows {
                let dot: f64 = self.data[i].iter().zip(self.data[j].iter())
                    .map(|(a, b)| a * b)
                    .sum();
                res.data[i][j] = dot;
                res.data[j][i] = dot;
            }
        }
        res
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] - rhs.data[i][j];
            }
        }

        res
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res =  Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..res.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_self_matches_explicit_product() {
        let m = Matrix::from_data(vec![
            vec![1.0, 2.0, 3.0],
            vec![-1.0, 0.5, 4.0],
        ]);
        let explicit = m.clone() * m.transpose();
        assert_eq!(m.outer_self(), explicit);
    }

    #[test]
    fn symmetry_check_rejects_non_square() {
        assert!(!Matrix::zeros(2, 3).is_symmetric(0.0));
        assert!(Matrix::zeros(3, 3).is_symmetric(0.0));
    }
}
