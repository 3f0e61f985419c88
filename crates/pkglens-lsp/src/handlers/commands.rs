//! `workspace/executeCommand` handlers.

use serde_json::Value;
use tower_lsp_server::Client;
use tower_lsp_server::ls_types::MessageType;

/// Lists the files behind a resolved code lens.
///
/// Arguments: document URI, lens position, array of package-relative paths.
pub const SHOW_FILES_COMMAND: &str = "pkglens.showFiles";

/// Logs the file list to the client and echoes it back as the result.
///
/// Returns `None` when the arguments do not carry a file list.
pub async fn handle_show_files(client: &Client, arguments: &[Value]) -> Option<Value> {
    let files = show_files_arguments(arguments)?;

    let listing = if files.is_empty() {
        "(no files)".to_string()
    } else {
        files.join("\n")
    };
    client
        .log_message(
            MessageType::INFO,
            format!("{} packed {}:\n{}", files.len(), plural(files.len()), listing),
        )
        .await;

    Some(Value::Array(files.into_iter().map(Value::String).collect()))
}

fn show_files_arguments(arguments: &[Value]) -> Option<Vec<String>> {
    let files = arguments.get(2)?.as_array()?;
    files
        .iter()
        .map(|file| file.as_str().map(str::to_string))
        .collect()
}

const fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
