use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExprError {
    #[error("Expression parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("Unknown function: '{0}'")]
    UnknownFunction(String),

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Type error: {0}")]
    TypeError(String),
}
