//! Python bindings for the Postpack integer codecs

use std::sync::Once;

use log::LevelFilter;
use postpack_core::postings::PostingsCodec as CorePostingsCodec;
use postpack_core::{group_varint, pfor_delta, CodecConfig, CodecError};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;

fn to_py_err(err: CodecError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Compress unsigned 32-bit integers with PForDelta
///
/// Args:
///     values: List of integers in [0, 2**32)
///
/// Returns:
///     Compressed bytes
#[pyfunction]
fn pfor_delta_compress<'py>(py: Python<'py>, values: Vec<u32>) -> PyResult<Bound<'py, PyBytes>> {
    let mut buf = vec![0u8; pfor_delta::max_compressed_len(values.len())];
    let len = py
        .allow_threads(|| pfor_delta::compress(&mut buf, &values))
        .map_err(to_py_err)?;
    Ok(PyBytes::new_bound(py, &buf[..len]))
}

/// Decompress PForDelta bytes holding `count` integers
#[pyfunction]
fn pfor_delta_decompress(data: &[u8], count: usize) -> PyResult<Vec<u32>> {
    let mut values = vec![0u32; count];
    let ints = pfor_delta::decompress(&mut values, data).map_err(to_py_err)?;
    values.truncate(ints);
    Ok(values)
}

/// Compress unsigned 32-bit integers with GroupVarint
#[pyfunction]
fn group_varint_compress<'py>(py: Python<'py>, values: Vec<u32>) -> PyResult<Bound<'py, PyBytes>> {
    let mut buf = vec![0u8; group_varint::compressed_len(&values)];
    let len = group_varint::compress(&mut buf, &values).map_err(to_py_err)?;
    Ok(PyBytes::new_bound(py, &buf[..len]))
}

/// Decompress `count` integers from GroupVarint bytes
#[pyfunction]
fn group_varint_decompress(data: &[u8], count: usize) -> PyResult<Vec<u32>> {
    let mut values = vec![0u32; count];
    group_varint::decompress(&mut values, data).map_err(to_py_err)?;
    Ok(values)
}

/// Python-exposed posting list codec
#[pyclass]
pub struct PostingsCodec {
    codec: CorePostingsCodec,
}

#[pymethods]
impl PostingsCodec {
    /// Create a codec
    ///
    /// Args:
    ///     config_json: Optional JSON with doc_id_mode, term_freq_mode and
    ///         position_mode (each one of "no_compress", "vbyte",
    ///         "group_varint", "pfor_delta")
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => CodecConfig::from_json(json).map_err(to_py_err)?,
            None => CodecConfig::default(),
        };
        Ok(Self {
            codec: CorePostingsCodec::new(config),
        })
    }

    /// Encode sorted doc ids
    fn encode_doc_ids<'py>(
        &self,
        py: Python<'py>,
        doc_ids: Vec<u32>,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let data = self.codec.encode_doc_ids(&doc_ids).map_err(to_py_err)?;
        Ok(PyBytes::new_bound(py, &data))
    }

    /// Decode `count` doc ids
    fn decode_doc_ids(&self, data: &[u8], count: usize) -> PyResult<Vec<u32>> {
        self.codec.decode_doc_ids(data, count).map_err(to_py_err)
    }

    fn encode_term_freqs<'py>(
        &self,
        py: Python<'py>,
        freqs: Vec<u32>,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let data = self.codec.encode_term_freqs(&freqs).map_err(to_py_err)?;
        Ok(PyBytes::new_bound(py, &data))
    }

    fn decode_term_freqs(&self, data: &[u8], count: usize) -> PyResult<Vec<u32>> {
        self.codec.decode_term_freqs(data, count).map_err(to_py_err)
    }

    /// Get the codec configuration as JSON
    fn config_json(&self) -> PyResult<String> {
        self.codec.config().to_json().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        let config = self.codec.config();
        format!(
            "PostingsCodec(doc_id_mode={:?}, term_freq_mode={:?}, position_mode={:?})",
            config.doc_id_mode, config.term_freq_mode, config.position_mode
        )
    }
}

static INIT_LOGGER: Once = Once::new();

/// Route codec logs to stderr
///
/// Args:
///     level: "error", "warn", "info", "debug" or "trace" (default: "warn")
#[pyfunction]
#[pyo3(signature = (level=None))]
fn enable_logging(level: Option<&str>) -> PyResult<()> {
    let filter = match level {
        Some(level) => level
            .parse::<LevelFilter>()
            .map_err(|e| PyValueError::new_err(format!("invalid log level '{}': {}", level, e)))?,
        None => LevelFilter::Warn,
    };
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new().filter_level(filter).try_init();
    });
    Ok(())
}

/// Python module
#[pymodule]
fn postpack(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(pfor_delta_compress, m)?)?;
    m.add_function(wrap_pyfunction!(pfor_delta_decompress, m)?)?;
    m.add_function(wrap_pyfunction!(group_varint_compress, m)?)?;
    m.add_function(wrap_pyfunction!(group_varint_decompress, m)?)?;
    m.add_function(wrap_pyfunction!(enable_logging, m)?)?;
    m.add_class::<PostingsCodec>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
