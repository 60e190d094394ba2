use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::server::ApiResponse;
use crate::transcript::AcquisitionResult;

/// Render an acquisition outcome for the terminal or a file
pub fn render(result: &AcquisitionResult, format: &OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => match result {
            AcquisitionResult::Success { text } => text.clone(),
            AcquisitionResult::Failure { message, .. } => format!("Error: {}", message),
        },
        OutputFormat::Json => serde_json::to_string_pretty(&ApiResponse::from(result.clone()))?,
    };

    Ok(content)
}

/// Save rendered result to file
pub fn save_to_file(result: &AcquisitionResult, path: &Path, format: &OutputFormat) -> Result<()> {
    fs_err::write(path, render(result, format)?)?;
    Ok(())
}

/// Print rendered result to console
pub fn print_to_console(result: &AcquisitionResult, format: &OutputFormat) -> Result<()> {
    println!("{}", render(result, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::ErrorKind;

    #[test]
    fn test_render_text() {
        let success = AcquisitionResult::Success {
            text: "line one\nline two".into(),
        };
        assert_eq!(render(&success, &OutputFormat::Text).unwrap(), "line one\nline two");

        let failure = AcquisitionResult::Failure {
            kind: ErrorKind::NoTranscriptFound,
            message: "nothing".into(),
        };
        assert_eq!(render(&failure, &OutputFormat::Text).unwrap(), "Error: nothing");
    }

    #[test]
    fn test_render_json_matches_api_body() {
        let success = AcquisitionResult::Success { text: "hi".into() };
        let rendered = render(&success, &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["transcript"], "hi");
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.txt");
        let success = AcquisitionResult::Success { text: "saved".into() };

        save_to_file(&success, &path, &OutputFormat::Text).unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "saved");
    }
}
