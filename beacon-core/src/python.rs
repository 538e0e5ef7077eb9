//! Python bindings.
//!
//! Values cross the boundary as `Py<PyAny>`, which is Send + Sync, so the
//! Rust types can hold them without the GIL.

use std::sync::Arc;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::pathfinding::{FunnelAlgorithm, Point, Portal};
use crate::signals::SignalValue;

/// Python wrapper around [`SignalValue`].
#[pyclass(name = "SignalValue")]
pub struct PySignalValue {
    inner: SignalValue<Arc<Py<PyAny>>>,
}

#[pymethods]
impl PySignalValue {
    #[new]
    #[pyo3(signature = (default=None, single_value=false))]
    fn new(default: Option<PyObject>, single_value: bool) -> Self {
        Self {
            inner: SignalValue::new(default.map(Arc::new), single_value),
        }
    }

    #[getter]
    fn value(&self, py: Python<'_>) -> PyObject {
        self.inner
            .value()
            .map(|value| value.clone_ref(py))
            .unwrap_or_else(|| py.None())
    }

    /// Raises `ValueError` on a second write to a single-value slot.
    #[setter]
    fn set_value(&self, value: PyObject) -> PyResult<()> {
        self.inner
            .set(Arc::new(value))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[getter]
    fn changed(&self) -> bool {
        self.inner.changed()
    }

    #[getter]
    fn single_value(&self) -> bool {
        self.inner.is_single_value()
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        let value = self.value(py);
        let repr = value.bind(py).repr()?;
        Ok(format!(
            "SignalValue(value={}, changed={}, single_value={})",
            repr,
            self.inner.changed(),
            self.inner.is_single_value()
        ))
    }
}

/// Funnel a path through `portals`, each given as `((lx, ly), (rx, ry))`.
#[pyfunction]
#[pyo3(signature = (source, destination, portals, epsilon=1e-9))]
pub fn string_pull(
    source: (f64, f64),
    destination: (f64, f64),
    portals: Vec<((f64, f64), (f64, f64))>,
    epsilon: f64,
) -> Vec<(f64, f64)> {
    let portals: Vec<Portal> = portals
        .into_iter()
        .map(|(left, right)| Portal::new(left.into(), right.into()))
        .collect();

    FunnelAlgorithm::new(epsilon)
        .string_pull(Point::from(source), Point::from(destination), &portals)
        .into_iter()
        .map(|point| (point.x, point.y))
        .collect()
}
