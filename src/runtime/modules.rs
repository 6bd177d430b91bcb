use crate::ast::Program;

#[derive(Debug)]
pub enum ModuleError {
    NotFound,
    InvalidModule(String),
}

impl std::fmt::Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleError::NotFound => write!(f, "module not found"),
            ModuleError::InvalidModule(msg) => write!(f, "invalid module: {}", msg),
        }
    }
}

/// Resolves `req` sources to parsed programs. Names and URLs share one entry
/// point; the interpreter caches results by the source string.
pub trait ModuleLoader {
    fn load(&mut self, name_or_url: &str) -> Result<Program, ModuleError>;
}
