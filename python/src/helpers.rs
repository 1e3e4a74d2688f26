use numpy::PyReadonlyArray1;
use pyo3::prelude::*;

/// Convert a 1D numpy array to Vec<f32>.
///
/// Supported dtypes: float32, float64, int32, int16.
pub(crate) fn array_to_f32(array: &Bound<'_, pyo3::PyAny>) -> PyResult<Vec<f32>> {
    let dtype = array.getattr("dtype")?;
    let kind: String = dtype.getattr("kind")?.extract()?;
    let itemsize: usize = dtype.getattr("itemsize")?.extract()?;

    match (kind.as_str(), itemsize) {
        ("f", 4) => {
            let arr: PyReadonlyArray1<f32> = array.extract()?;
            Ok(arr.as_array().iter().copied().collect())
        }
        ("f", 8) => {
            let arr: PyReadonlyArray1<f64> = array.extract()?;
            Ok(arr.as_array().iter().map(|&v| v as f32).collect())
        }
        ("i", 4) => {
            let arr: PyReadonlyArray1<i32> = array.extract()?;
            Ok(arr.as_array().iter().map(|&v| v as f32).collect())
        }
        ("i", 2) => {
            let arr: PyReadonlyArray1<i16> = array.extract()?;
            Ok(arr.as_array().iter().map(|&v| v as f32).collect())
        }
        _ => Err(pyo3::exceptions::PyTypeError::new_err(format!(
            "unsupported array dtype (kind '{}', {} bytes); expected float32, float64, int32 or int16",
            kind, itemsize
        ))),
    }
}

/// Parse exactly three 1D arrays (E, N, Z) from a Python sequence.
pub(crate) fn parse_triplet(arrays: &Bound<'_, pyo3::PyAny>) -> PyResult<[Vec<f32>; 3]> {
    let items: Vec<Bound<'_, pyo3::PyAny>> = arrays.extract()?;
    if items.len() != 3 {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "expected 3 channels (E, N, Z), got {}",
            items.len()
        )));
    }
    Ok([
        array_to_f32(&items[0])?,
        array_to_f32(&items[1])?,
        array_to_f32(&items[2])?,
    ])
}

/// Map a library error to a Python RuntimeError.
pub(crate) fn runtime_err(e: anyhow::Error) -> PyErr {
    pyo3::exceptions::PyRuntimeError::new_err(format!("{:#}", e))
}
