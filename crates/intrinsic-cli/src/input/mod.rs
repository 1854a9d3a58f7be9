pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a document from `--input`, falling back to JSON piped on stdin.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_input(path);
    }
    if let Some(data) = stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err(format!("--input file is required for {what} (or pipe JSON on stdin)").into())
}
