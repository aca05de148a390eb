mod cli;
mod io;
mod run;

pub use cli::{CanonCommand, Cli, Commands, OutputFormat, RunCommand, ValidateCommand};
pub use io::{
    expand_env_placeholders, read_bindings_document, read_template_document, Binding, DocumentError,
};
pub use run::{execute_canon, execute_run, execute_validate, RunnerError};
