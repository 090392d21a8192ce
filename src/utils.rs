use linfa::Float;
use ndarray::{Array2, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2, Zip};

/// Outer product of two vectors
pub fn outer<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix1>,
    b: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Array2<F> {
    let mut outer = Array2::zeros((a.len(), b.len()));
    Zip::from(outer.rows_mut()).and(a).for_each(|mut out, ai| {
        out.assign(&b.mapv(|v| *ai * v));
    });
    outer
}

/// Rectangular matrix with `values` on its main diagonal
///
/// ## Panics
///
/// If there are more values than fit onto the diagonal of a `nrows x ncols` matrix
pub fn rectangular_diag<F: Float>(values: ArrayView1<F>, nrows: usize, ncols: usize) -> Array2<F> {
    assert!(values.len() <= nrows.min(ncols));

    let mut diag = Array2::zeros((nrows, ncols));
    for (i, val) in values.iter().enumerate() {
        diag[(i, i)] = *val;
    }

    diag
}

/// Divides every row by its sum
pub fn row_profiles<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
    let sums = x.sum_axis(Axis(1)).insert_axis(Axis(1));
    x / &sums
}

/// Divides every column by its sum and returns the profiles as rows
pub fn column_profiles<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
    let sums = x.sum_axis(Axis(0));
    (x / &sums).reversed_axes()
}
