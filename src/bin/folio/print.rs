use folio::application::error::AppError;
use serde::Serialize;

use crate::io::emit;

pub fn print_json<T: Serialize>(out: &mut impl std::io::Write, value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::unexpected(format!("failed to render output: {e}")))?;
    emit(out, &format!("{rendered}\n"))
}
