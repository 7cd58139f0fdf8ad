/// Tagged outcome of every call into the reasoning service.
///
/// Exactly one variant is populated: a failure carries only a user-facing message and a
/// success carries only the payload. Callers branch on the tag before reading either.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult<T> {
    Succeeded(T),
    Failed(String),
}

impl<T> OperationResult<T> {
    pub fn failed(message: impl Into<String>) -> Self {
        OperationResult::Failed(message.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, OperationResult::Succeeded(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            OperationResult::Succeeded(value) => Some(value),
            OperationResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OperationResult::Succeeded(_) => None,
            OperationResult::Failed(message) => Some(message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        match self {
            OperationResult::Succeeded(value) => OperationResult::Succeeded(f(value)),
            OperationResult::Failed(message) => OperationResult::Failed(message),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        self.into()
    }
}

impl<T> From<OperationResult<T>> for Result<T, String> {
    fn from(result: OperationResult<T>) -> Self {
        match result {
            OperationResult::Succeeded(value) => Ok(value),
            OperationResult::Failed(message) => Err(message),
        }
    }
}
