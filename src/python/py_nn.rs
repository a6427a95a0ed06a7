//! Lets a Python callable act as the policy/value network.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::codec::ACTION_SPACE_SIZE;
use crate::oracle::{EncodedState, PolicyValueNetwork};

/// Board tensor handed to a Python network.
#[pyclass(name = "EncodedState")]
#[derive(Clone, Debug)]
pub struct PyEncodedState(pub EncodedState);

#[pymethods]
impl PyEncodedState {
    #[new]
    fn new(tensor: Vec<f32>, shape: Vec<usize>) -> PyResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != tensor.len() {
            return Err(PyValueError::new_err(format!(
                "shape {shape:?} needs {expected} values, got {}",
                tensor.len()
            )));
        }
        Ok(Self(EncodedState::new(tensor, shape)))
    }

    /// Flat tensor, row-major.
    #[getter]
    fn tensor(&self) -> Vec<f32> {
        self.0.tensor.clone()
    }

    #[getter]
    fn shape(&self) -> Vec<usize> {
        self.0.shape.clone()
    }

    /// One row per cell, with that cell's channels. Handy for feeding a
    /// framework that wants a 2-D array.
    fn rows(&self) -> Vec<Vec<f32>> {
        let width = self.0.shape.last().copied().unwrap_or(1).max(1);
        self.0.tensor.chunks(width).map(<[f32]>::to_vec).collect()
    }

    fn __len__(&self) -> usize {
        self.0.len()
    }

    fn __repr__(&self) -> String {
        format!("EncodedState(shape={:?})", self.0.shape)
    }
}

/// Wraps `callback(state) -> (policy, value)`.
///
/// `policy` holds 162 floats indexed by wire id; `value` is in `[-1, 1]`
/// for the player to move. A callback that raises or returns a policy of
/// the wrong length is logged and replaced by a uniform guess, so a broken
/// network degrades advice instead of failing a move.
#[pyclass(name = "PolicyValueNetwork")]
pub struct PyPolicyValueNetwork {
    callback: PyObject,
}

#[pymethods]
impl PyPolicyValueNetwork {
    #[new]
    fn new(callback: PyObject) -> Self {
        Self { callback }
    }

    /// Run the callback without the uniform fallback.
    fn predict(&self, py: Python<'_>, encoded: &PyEncodedState) -> PyResult<(Vec<f32>, f32)> {
        let (policy, value) = self.call(py, &encoded.0)?;
        if policy.len() != ACTION_SPACE_SIZE {
            return Err(PyValueError::new_err(format!(
                "policy has {} entries, expected {ACTION_SPACE_SIZE}",
                policy.len()
            )));
        }
        Ok((policy, value))
    }

    #[getter]
    fn action_space_size(&self) -> usize {
        ACTION_SPACE_SIZE
    }
}

impl PyPolicyValueNetwork {
    pub(crate) fn clone_ref(&self, py: Python<'_>) -> Self {
        Self {
            callback: self.callback.clone_ref(py),
        }
    }

    fn call(&self, py: Python<'_>, encoded: &EncodedState) -> PyResult<(Vec<f32>, f32)> {
        self.callback
            .call1(py, (PyEncodedState(encoded.clone()),))?
            .extract(py)
    }
}

impl PolicyValueNetwork for PyPolicyValueNetwork {
    fn predict(&self, encoded: &EncodedState) -> (Vec<f32>, f32) {
        let uniform = || (vec![1.0 / ACTION_SPACE_SIZE as f32; ACTION_SPACE_SIZE], 0.0);
        Python::with_gil(|py| match self.call(py, encoded) {
            Ok((policy, value)) if policy.len() == ACTION_SPACE_SIZE => (policy, value),
            Ok((policy, _)) => {
                tracing::warn!(len = policy.len(), "python policy has the wrong length");
                uniform()
            }
            Err(error) => {
                tracing::warn!(%error, "python network failed, using uniform prediction");
                uniform()
            }
        })
    }
}
