//! Error handling for the CLI layer.
//!
//! The CLI does not define its own error enum; everything it can fail
//! on is already expressed by [`CoreError`], so commands return a
//! simple alias.

use shorereel_core::CoreError;

pub type CliResult<T> = Result<T, CoreError>;
