use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId(pub u32);

impl std::fmt::Display for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Operand of an instruction: either the result of an earlier `Load`/`Binary`
/// instruction, or an integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Temp(TempId),
    Const(i64),
}

impl Value {
    pub fn as_temp(&self) -> Option<TempId> {
        match self {
            Value::Temp(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Const(_))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Temp(id) => write!(f, "{}", id),
            Value::Const(c) => write!(f, "{}", c),
        }
    }
}
