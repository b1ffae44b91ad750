//! Python extension module
//!
//! Every function keeps the name and argument order scripts already use
//! (`ospNewCamera("perspective")`, `ospSet3fv(cam, "dir", [0, 0, 1])`).
//! Handles are passed around as Python ints.

use std::borrow::Cow;

use pyo3::exceptions::{
    PyIOError, PyImportError, PyOverflowError, PyRuntimeError, PyTypeError, PyValueError,
};
use pyo3::prelude::*;
use pyo3::types::{PyFloat, PyIterator, PyLong, PyString};

use crate::bridge::Bridge;
use crate::config::Config;
use crate::errors::{BridgeError, BridgeResult};
use crate::interop::marshal::{self, HostValue};
use crate::interop::{
    self, CameraHandle, DataHandle, FrameBufferHandle, GeometryHandle, Handle, Kind, LightHandle,
    ModelHandle, ObjectHandle, OsprayLibrary, RendererHandle,
};
use crate::logging::{self, LogConfig};

impl From<BridgeError> for PyErr {
    fn from(err: BridgeError) -> PyErr {
        let message = err.to_string();
        match err {
            BridgeError::TypeMismatch { .. } | BridgeError::HostIteration(_) => {
                PyTypeError::new_err(message)
            }
            BridgeError::UnsupportedFormat { .. }
            | BridgeError::VectorLength { .. }
            | BridgeError::DataLength { .. }
            | BridgeError::InvalidSize(_)
            | BridgeError::InteriorNul(_) => PyValueError::new_err(message),
            BridgeError::Overflow(_) => PyOverflowError::new_err(message),
            BridgeError::MapFailed(_) => PyRuntimeError::new_err(message),
            BridgeError::Io { .. } => PyIOError::new_err(message),
            BridgeError::LibraryLoad(_) => PyImportError::new_err(message),
        }
    }
}

/// A Python object seen through [`HostValue`]
#[derive(Clone, Copy)]
pub struct PyValue<'py>(pub &'py PyAny);

impl<'py> HostValue for PyValue<'py> {
    type Iter = PyElements<'py>;

    fn type_name(&self) -> Cow<'_, str> {
        match self.0.get_type().name() {
            Ok(name) => Cow::Borrowed(name),
            Err(_) => Cow::Borrowed("object"),
        }
    }

    fn as_float(&self) -> Option<f64> {
        if let Ok(f) = self.0.downcast::<PyFloat>() {
            return Some(f.value());
        }
        // ints beyond i64 still widen, as float(2**64) does
        if self.is_integer() && self.as_integer().is_none() {
            return self.0.extract::<f64>().ok();
        }
        None
    }

    fn as_integer(&self) -> Option<i64> {
        if self.is_integer() {
            self.0.extract::<i64>().ok()
        } else {
            None
        }
    }

    fn is_integer(&self) -> bool {
        // bool is a subclass of int
        self.0.is_instance_of::<PyLong>()
    }

    fn as_text(&self) -> Option<Cow<'_, str>> {
        let text = self.0.downcast::<PyString>().ok()?;
        text.to_str().ok().map(Cow::Borrowed)
    }

    fn elements(&self) -> Option<Self::Iter> {
        if self.0.is_instance_of::<PyString>() {
            return None;
        }
        self.0.iter().ok().map(PyElements)
    }
}

/// Elements of a Python iterable
pub struct PyElements<'py>(&'py PyIterator);

impl<'py> Iterator for PyElements<'py> {
    type Item = BridgeResult<PyValue<'py>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut iter = self.0;
        iter.next().map(|item| {
            item.map(PyValue)
                .map_err(|e| BridgeError::HostIteration(e.to_string()))
        })
    }
}

impl<'source, K: Kind> FromPyObject<'source> for Handle<K> {
    fn extract(ob: &'source PyAny) -> PyResult<Self> {
        ob.extract::<i64>().map(Handle::from_raw)
    }
}

impl<K: Kind> IntoPy<PyObject> for Handle<K> {
    fn into_py(self, py: Python<'_>) -> PyObject {
        self.into_raw().into_py(py)
    }
}

fn bridge() -> PyResult<Bridge<&'static OsprayLibrary>> {
    let library = interop::shared().map_err(BridgeError::from)?;
    Ok(Bridge::new(library))
}

// ---- lifecycle ----

#[pyfunction]
#[pyo3(name = "ospInit")]
fn osp_init() -> PyResult<()> {
    Ok(bridge()?.init()?)
}

#[pyfunction]
#[pyo3(name = "ospShutdown")]
fn osp_shutdown() -> PyResult<()> {
    Ok(bridge()?.shutdown()?)
}

#[pyfunction]
#[pyo3(name = "ospCommit")]
fn osp_commit(object: ObjectHandle) -> PyResult<()> {
    Ok(bridge()?.commit(object)?)
}

#[pyfunction]
#[pyo3(name = "ospRelease")]
fn osp_release(object: ObjectHandle) -> PyResult<()> {
    Ok(bridge()?.release(object)?)
}

#[pyfunction]
#[pyo3(name = "ospAddGeometry")]
fn osp_add_geometry(model: ModelHandle, geometry: GeometryHandle) -> PyResult<()> {
    Ok(bridge()?.add_geometry(model, geometry)?)
}

// ---- constructors ----

#[pyfunction]
#[pyo3(name = "ospNewCamera")]
fn osp_new_camera(kind: &str) -> PyResult<CameraHandle> {
    Ok(bridge()?.new_camera(kind)?)
}

#[pyfunction]
#[pyo3(name = "ospNewRenderer")]
fn osp_new_renderer(kind: &str) -> PyResult<RendererHandle> {
    Ok(bridge()?.new_renderer(kind)?)
}

#[pyfunction]
#[pyo3(name = "ospNewLight")]
fn osp_new_light(kind: &str) -> PyResult<LightHandle> {
    Ok(bridge()?.new_light(kind)?)
}

#[pyfunction]
#[pyo3(name = "ospNewModel")]
fn osp_new_model() -> PyResult<ModelHandle> {
    Ok(bridge()?.new_model()?)
}

#[pyfunction]
#[pyo3(name = "ospNewGeometry")]
fn osp_new_geometry(kind: &str) -> PyResult<GeometryHandle> {
    Ok(bridge()?.new_geometry(kind)?)
}

#[pyfunction]
#[pyo3(name = "ospNewFrameBuffer")]
fn osp_new_frame_buffer(
    size: &PyAny,
    format: &str,
    channels: &PyAny,
) -> PyResult<FrameBufferHandle> {
    let size = marshal::to_size(&PyValue(size))?;
    Ok(bridge()?.new_frame_buffer(size, format, &PyValue(channels))?)
}

#[pyfunction]
#[pyo3(name = "ospNewData")]
fn osp_new_data(count: i32, format: &str, values: &PyAny) -> PyResult<DataHandle> {
    Ok(bridge()?.new_data(count, format, &PyValue(values))?)
}

// ---- parameters ----

#[pyfunction]
#[pyo3(name = "ospSetObject")]
fn osp_set_object(object: ObjectHandle, name: &str, value: ObjectHandle) -> PyResult<()> {
    Ok(bridge()?.set_object(object, name, value)?)
}

#[pyfunction]
#[pyo3(name = "ospSetData")]
fn osp_set_data(object: ObjectHandle, name: &str, value: DataHandle) -> PyResult<()> {
    Ok(bridge()?.set_data(object, name, value)?)
}

#[pyfunction]
#[pyo3(name = "ospSet1f")]
fn osp_set1f(object: ObjectHandle, name: &str, value: f32) -> PyResult<()> {
    Ok(bridge()?.set_float(object, name, value)?)
}

#[pyfunction]
#[pyo3(name = "ospSet1i")]
fn osp_set1i(object: ObjectHandle, name: &str, value: i32) -> PyResult<()> {
    Ok(bridge()?.set_int(object, name, value)?)
}

#[pyfunction]
#[pyo3(name = "ospSet3fv")]
fn osp_set3fv(object: ObjectHandle, name: &str, values: &PyAny) -> PyResult<()> {
    Ok(bridge()?.set_float3(object, name, &PyValue(values))?)
}

// ---- frame buffers ----

#[pyfunction]
#[pyo3(name = "ospFrameBufferClear")]
fn osp_frame_buffer_clear(fb: FrameBufferHandle, channels: &PyAny) -> PyResult<()> {
    Ok(bridge()?.frame_buffer_clear(fb, &PyValue(channels))?)
}

#[pyfunction]
#[pyo3(name = "ospRenderFrame")]
fn osp_render_frame(
    fb: FrameBufferHandle,
    renderer: RendererHandle,
    channels: &PyAny,
) -> PyResult<()> {
    Ok(bridge()?.render_frame(fb, renderer, &PyValue(channels))?)
}

#[pyfunction]
#[pyo3(name = "ospFrameBufferSave")]
fn osp_frame_buffer_save(
    path: &str,
    fb: FrameBufferHandle,
    size: &PyAny,
    format: &str,
) -> PyResult<()> {
    let size = marshal::to_size(&PyValue(size))?;
    Ok(bridge()?.frame_buffer_save(path, fb, size, format)?)
}

/// The `ospray` module
#[pymodule]
#[pyo3(name = "ospray")]
pub fn ospray_module(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    let (config, warnings) = Config::discover_with_warnings();
    logging::init_logging(LogConfig::from_config(&config.logging));
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "initializing ospray module");

    m.add_function(wrap_pyfunction!(osp_init, m)?)?;
    m.add_function(wrap_pyfunction!(osp_shutdown, m)?)?;
    m.add_function(wrap_pyfunction!(osp_commit, m)?)?;
    m.add_function(wrap_pyfunction!(osp_release, m)?)?;
    m.add_function(wrap_pyfunction!(osp_add_geometry, m)?)?;

    m.add_function(wrap_pyfunction!(osp_new_camera, m)?)?;
    m.add_function(wrap_pyfunction!(osp_new_renderer, m)?)?;
    m.add_function(wrap_pyfunction!(osp_new_light, m)?)?;
    m.add_function(wrap_pyfunction!(osp_new_model, m)?)?;
    m.add_function(wrap_pyfunction!(osp_new_geometry, m)?)?;
    m.add_function(wrap_pyfunction!(osp_new_frame_buffer, m)?)?;
    m.add_function(wrap_pyfunction!(osp_new_data, m)?)?;

    m.add_function(wrap_pyfunction!(osp_set_object, m)?)?;
    m.add_function(wrap_pyfunction!(osp_set_data, m)?)?;
    m.add_function(wrap_pyfunction!(osp_set1f, m)?)?;
    m.add_function(wrap_pyfunction!(osp_set1i, m)?)?;
    m.add_function(wrap_pyfunction!(osp_set3fv, m)?)?;
    m.add("ospSetf", m.getattr("ospSet1f")?)?;

    m.add_function(wrap_pyfunction!(osp_frame_buffer_clear, m)?)?;
    m.add_function(wrap_pyfunction!(osp_render_frame, m)?)?;
    m.add_function(wrap_pyfunction!(osp_frame_buffer_save, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
