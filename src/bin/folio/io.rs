use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use folio::application::error::AppError;
use folio::infra::error::InfraError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

/// Line-oriented input shared by the browse loop and confirmation prompts.
pub struct Console {
    input: Mutex<Box<dyn AsyncBufRead + Send + Unpin>>,
}

impl Console {
    pub fn new(input: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        Self {
            input: Mutex::new(Box::new(input)),
        }
    }

    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }

    /// Show `prompt` on stderr and read one line. `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> Result<Option<String>, InfraError> {
        if !prompt.is_empty() {
            let mut stderr = std::io::stderr();
            write!(stderr, "{prompt}")?;
            stderr.flush()?;
        }

        let mut input = self.input.lock().await;
        let mut line = String::new();
        let read = input.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// Contents from `--contents-file` when given, otherwise `--contents`.
pub fn read_value(val: Option<String>, file: Option<PathBuf>) -> Result<String, AppError> {
    if let Some(path) = file {
        return fs::read_to_string(&path).map_err(|err| {
            AppError::validation(format!("cannot read `{}`: {err}", path.display()))
        });
    }
    val.ok_or_else(|| AppError::validation("contents required"))
}

/// Use the given password or read one line from the console.
pub async fn read_password(console: &Console, given: Option<String>) -> Result<String, AppError> {
    if let Some(password) = given {
        return Ok(password);
    }
    match console.read_line("Password: ").await? {
        Some(password) if !password.is_empty() => Ok(password),
        _ => Err(AppError::validation("password required")),
    }
}

pub fn emit(out: &mut impl std::io::Write, text: &str) -> Result<(), AppError> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|err| AppError::from(InfraError::from(err)))
}
