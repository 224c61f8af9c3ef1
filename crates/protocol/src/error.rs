#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    Malformed(String),
    UnknownMessage(String),
    UnknownOp(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Malformed(msg) => write!(f, "malformed message: {msg}"),
            ProtocolError::UnknownMessage(name) => write!(f, "unknown message: {name}"),
            ProtocolError::UnknownOp(name) => write!(f, "unknown drawing op: {name}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

pub(crate) fn malformed(msg: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed(msg.into())
}
