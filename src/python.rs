use numpy::{PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::{PyIndexError, PyValueError};
use pyo3::prelude::*;

use crate::config::PredictionConfig;
use crate::engine;
use crate::error::{CfError, PipelineError};
use crate::ranking::rank;
use crate::rating_matrix::RatingMatrix;
use crate::types::{Mode, TargetCell};

fn to_py_err(error: CfError) -> PyErr {
    match error {
        CfError::IndexOutOfBounds { .. } => PyIndexError::new_err(error.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

fn pipeline_to_py_err(error: PipelineError) -> PyErr {
    match &error.source {
        CfError::IndexOutOfBounds { .. } => PyIndexError::new_err(error.to_string()),
        _ => PyValueError::new_err(error.to_string()),
    }
}

#[pyclass]
struct Predictor {
    matrix: RatingMatrix,
}

#[pymethods]
impl Predictor {
    #[new]
    fn new(ratings: PyReadonlyArray2<'_, u32>) -> PyResult<Self> {
        let shape = ratings.shape();
        let (num_rows, num_cols) = (shape[0], shape[1]);
        let values: Vec<u32> = ratings.as_array().iter().copied().collect();

        let matrix = RatingMatrix::new(num_rows, num_cols, values).map_err(to_py_err)?;
        Ok(Self { matrix })
    }

    #[getter]
    fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    #[pyo3(signature = (row, col, k = 2, mode = "user-based"))]
    fn predict(&self, row: usize, col: usize, k: usize, mode: &str) -> PyResult<f64> {
        let mode: Mode = mode.parse().map_err(to_py_err)?;
        let config = PredictionConfig::new(TargetCell::new(row, col)).with_k(k).with_mode(mode);

        engine::run(&self.matrix, &config)
            .map(|prediction| prediction.predicted_rating)
            .map_err(pipeline_to_py_err)
    }

    #[pyo3(signature = (row, col, mode = "user-based"))]
    fn neighbors(&self, row: usize, col: usize, mode: &str) -> PyResult<Vec<(usize, f64)>> {
        let mode: Mode = mode.parse().map_err(to_py_err)?;
        let ranking = rank(&self.matrix, TargetCell::new(row, col), mode).map_err(to_py_err)?;

        Ok(ranking.iter().map(|record| (record.index, record.similarity)).collect())
    }
}

#[pymodule]
fn knn_cf(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Predictor>()?;
    Ok(())
}
