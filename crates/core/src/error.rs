use crate::{DeviceError, ResourceType, layout::PrimitiveType};
use thiserror::Error;

/// Errors raised while building or driving a resource graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("declaration list is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("resource `{id}` has unknown type `{kind}`")]
    UnknownType { id: String, kind: String },
    #[error("resource `{id}` is declared more than once")]
    DuplicateId { id: String },
    #[error("invalid declaration for `{id}`: {source}")]
    InvalidDeclaration {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{from}` references missing resource `{target}`")]
    MissingReference { from: String, target: String },
    #[error("`{from}` expects `{target}` to be a {expected}, found {found}")]
    WrongKind {
        from: String,
        target: String,
        expected: &'static str,
        found: ResourceType,
    },
    #[error("`{id}` declares attribute `{name}` of type {ty:?}, which cannot be a vertex input")]
    UnsupportedAttribute { id: String, name: String, ty: PrimitiveType },
    #[error("draw operation of `{from}` does not fit program `{program}`: {reason}")]
    ProgramMismatch { from: String, program: String, reason: String },
    #[error("dependency cycle through `{id}`")]
    Cycle { id: String },
    #[error("no resource named `{id}`")]
    NotFound { id: String },
    #[error("`{id}` is a {found}, expected {expected}")]
    UnexpectedKind {
        id: String,
        expected: &'static str,
        found: ResourceType,
    },
    #[error("no texture is selected for the screen")]
    NoScreen,
    #[error("`{id}`: {source}")]
    Data {
        id: String,
        #[source]
        source: DataError,
    },
    #[error("`{id}`: {source}")]
    Device {
        id: String,
        #[source]
        source: DeviceError,
    },
}

/// A rejected data write. Raised before anything reaches the device.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("{what} {requested} exceeds capacity {capacity}")]
    CapacityExceeded {
        what: &'static str,
        requested: usize,
        capacity: usize,
    },
    #[error("no field named `{name}`")]
    UnknownField { name: String },
    #[error("`{name}` is declared as {expected:?}, got {found}")]
    TypeMismatch {
        name: String,
        expected: PrimitiveType,
        found: &'static str,
    },
    #[error("`{name}` has {len} values, not a multiple of {components}")]
    Ragged { name: String, len: usize, components: u32 },
    #[error("`{name}` supplies {rows} rows, {required} required")]
    TooFewRows { name: String, rows: usize, required: usize },
    #[error("index {index} addresses past {vertices} vertices")]
    IndexOutOfRange { index: u16, vertices: u32 },
    #[error("{0}")]
    Format(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl GraphError {
    pub(crate) fn data(id: &str) -> impl FnOnce(DataError) -> GraphError + '_ {
        move |source| GraphError::Data {
            id: id.to_string(),
            source,
        }
    }

    pub(crate) fn device(id: &str) -> impl FnOnce(DeviceError) -> GraphError + '_ {
        move |source| GraphError::Device {
            id: id.to_string(),
            source,
        }
    }
}
