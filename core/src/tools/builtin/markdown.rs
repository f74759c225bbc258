//! Markdown file tools backed by a single files directory

use crate::error::Result;
use crate::tools::{Tool, ToolCall, ToolExample, ToolFactory, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Directory used when none is configured
pub const DEFAULT_FILES_DIR: &str = "files";

/// Extensions recognised as Markdown, compared case-insensitively
pub const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Failures reported back to the model as tool errors
#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("Invalid file name '{name}'. Provide a plain file name without directories.")]
    InvalidName { name: String },

    #[error("File '{path}' does not exist in files directory.")]
    NotInFilesDir { path: String },

    #[error("File '{name}' already exists. Use edit_markdown_file to modify existing files.")]
    AlreadyExists { name: String },

    #[error("File '{name}' does not exist. Use create_markdown_file to create new files.")]
    Missing { name: String },

    #[error("Invalid mode '{mode}'. Use 'replace', 'append', or 'prepend'.")]
    InvalidMode { mode: String },

    #[error("'{dir}' is not a directory.")]
    NotADirectory { dir: String },

    #[error("Error reading file: {0}")]
    Read(std::io::Error),

    #[error("Error creating file: {0}")]
    Create(std::io::Error),

    #[error("Error editing file: {0}")]
    Edit(std::io::Error),

    #[error("Error listing files: {0}")]
    List(std::io::Error),
}

/// How `edit_markdown_file` combines new content with the existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Replace,
    Append,
    Prepend,
}

impl FromStr for EditMode {
    type Err = MarkdownError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "prepend" => Ok(Self::Prepend),
            other => Err(MarkdownError::InvalidMode {
                mode: other.to_string(),
            }),
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|md| ext.eq_ignore_ascii_case(md))
        })
        .unwrap_or(false)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Markdown files living directly inside one directory
#[derive(Debug, Clone)]
pub struct MarkdownStore {
    dir: PathBuf,
}

impl MarkdownStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a user supplied name to a path inside the directory.
    ///
    /// Names without a Markdown extension get `.md` in place of whatever
    /// extension they had.
    pub fn resolve(&self, file_name: &str) -> std::result::Result<PathBuf, MarkdownError> {
        let trimmed = file_name.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains('/')
            || trimmed.contains('\\')
        {
            return Err(MarkdownError::InvalidName {
                name: file_name.to_string(),
            });
        }

        let path = self.dir.join(trimmed);
        if is_markdown(&path) {
            Ok(path)
        } else {
            Ok(path.with_extension("md"))
        }
    }

    pub async fn read(&self, file_name: &str) -> std::result::Result<String, MarkdownError> {
        let path = self.resolve(file_name)?;
        if !path.exists() {
            return Err(MarkdownError::NotInFilesDir {
                path: path.display().to_string(),
            });
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(MarkdownError::Read)?;
        Ok(format!("Content of '{}':\n\n{}", path.display(), content))
    }

    pub async fn create(
        &self,
        file_name: &str,
        content: &str,
    ) -> std::result::Result<String, MarkdownError> {
        let path = self.resolve(file_name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(MarkdownError::Create)?;

        let name = file_name_of(&path);
        // create_new makes the existence check and the creation one step
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => MarkdownError::AlreadyExists {
                    name: name.clone(),
                },
                _ => MarkdownError::Create(e),
            })?;
        file.write_all(content.as_bytes())
            .await
            .map_err(MarkdownError::Create)?;
        file.flush().await.map_err(MarkdownError::Create)?;
        tracing::debug!(path = %path.display(), "created markdown file");
        Ok(format!("Successfully created Markdown file: '{}'", name))
    }

    pub async fn edit(
        &self,
        file_name: &str,
        content: &str,
        mode: &str,
    ) -> std::result::Result<String, MarkdownError> {
        let path = self.resolve(file_name)?;
        let name = file_name_of(&path);
        if !path.exists() {
            return Err(MarkdownError::Missing { name });
        }

        match mode.parse::<EditMode>()? {
            EditMode::Replace => {
                tokio::fs::write(&path, content)
                    .await
                    .map_err(MarkdownError::Edit)?;
                Ok(format!("Successfully replaced content in '{}'", name))
            }
            EditMode::Append => {
                let mut file = tokio::fs::OpenOptions::new()
                    .append(true)
                    .open(&path)
                    .await
                    .map_err(MarkdownError::Edit)?;
                file.write_all(format!("\n{}", content).as_bytes())
                    .await
                    .map_err(MarkdownError::Edit)?;
                file.flush().await.map_err(MarkdownError::Edit)?;
                Ok(format!("Successfully appended content to '{}'", name))
            }
            EditMode::Prepend => {
                let existing = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(MarkdownError::Edit)?;
                tokio::fs::write(&path, format!("{}\n{}", content, existing))
                    .await
                    .map_err(MarkdownError::Edit)?;
                Ok(format!("Successfully prepended content to '{}'", name))
            }
        }
    }

    pub async fn list(&self) -> std::result::Result<String, MarkdownError> {
        let dir = self.dir.display().to_string();
        let empty = format!("No Markdown files found in '{}' directory", dir);

        if !self.dir.exists() {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(MarkdownError::List)?;
            return Ok(empty);
        }
        if !self.dir.is_dir() {
            return Err(MarkdownError::NotADirectory { dir });
        }

        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(MarkdownError::List)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(MarkdownError::List)? {
            let path = entry.path();
            if path.is_file() && is_markdown(&path) {
                names.push(file_name_of(&path));
            }
        }

        if names.is_empty() {
            return Ok(empty);
        }

        names.sort();
        let listing: Vec<String> = names.iter().map(|n| format!("- {}", n)).collect();
        Ok(format!(
            "Markdown files in '{}' directory:\n{}",
            dir,
            listing.join("\n")
        ))
    }
}

fn into_tool_result(
    call_id: &str,
    outcome: std::result::Result<String, MarkdownError>,
) -> ToolResult {
    match outcome {
        Ok(message) => ToolResult::success(call_id, message),
        Err(e) => {
            tracing::debug!(error = %e, "markdown tool failed");
            ToolResult::error(call_id, e.to_string())
        }
    }
}

fn file_name_schema() -> serde_json::Value {
    json!({
        "type": "string",
        "description": "Name of the Markdown file inside the files directory, without any path (e.g. 'readme.md')"
    })
}

/// Reads a Markdown file
pub struct ReadMarkdownTool {
    store: Arc<MarkdownStore>,
}

impl ReadMarkdownTool {
    pub fn new(store: Arc<MarkdownStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReadMarkdownTool {
    fn name(&self) -> &str {
        "read_markdown_file"
    }

    fn description(&self) -> &str {
        "Read the content of a Markdown file from the files directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "file_name": file_name_schema()
            },
            "required": ["file_name"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let file_name: String = call.get_parameter("file_name")?;
        Ok(into_tool_result(&call.id, self.store.read(&file_name).await))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Read the project readme".to_string(),
            parameters: json!({"file_name": "readme.md"}),
            expected_result: "Content of 'files/readme.md':\n\n# Project".to_string(),
        }]
    }
}

/// Creates a new Markdown file
pub struct CreateMarkdownTool {
    store: Arc<MarkdownStore>,
}

impl CreateMarkdownTool {
    pub fn new(store: Arc<MarkdownStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateMarkdownTool {
    fn name(&self) -> &str {
        "create_markdown_file"
    }

    fn description(&self) -> &str {
        "Create a new Markdown file in the files directory. Fails if the file already exists."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "file_name": file_name_schema(),
                "content": {
                    "type": "string",
                    "description": "The content to write to the file"
                }
            },
            "required": ["file_name", "content"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let file_name: String = call.get_parameter("file_name")?;
        let content: String = call.get_parameter("content")?;
        Ok(into_tool_result(
            &call.id,
            self.store.create(&file_name, &content).await,
        ))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Create meeting notes".to_string(),
            parameters: json!({"file_name": "notes", "content": "# Notes\n\n- item"}),
            expected_result: "Successfully created Markdown file: 'notes.md'".to_string(),
        }]
    }
}

/// Replaces, appends to or prepends to an existing Markdown file
pub struct EditMarkdownTool {
    store: Arc<MarkdownStore>,
}

impl EditMarkdownTool {
    pub fn new(store: Arc<MarkdownStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for EditMarkdownTool {
    fn name(&self) -> &str {
        "edit_markdown_file"
    }

    fn description(&self) -> &str {
        "Edit an existing Markdown file in the files directory. \
         Mode is 'replace' (default), 'append', or 'prepend'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "file_name": file_name_schema(),
                "content": {
                    "type": "string",
                    "description": "The content to add or replace"
                },
                "mode": {
                    "type": "string",
                    "enum": ["replace", "append", "prepend"],
                    "default": "replace",
                    "description": "How to combine the content with the existing file"
                }
            },
            "required": ["file_name", "content"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let file_name: String = call.get_parameter("file_name")?;
        let content: String = call.get_parameter("content")?;
        let mode: String = call.get_parameter_or("mode", "replace".to_string());
        Ok(into_tool_result(
            &call.id,
            self.store.edit(&file_name, &content, &mode).await,
        ))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Append a section to existing notes".to_string(),
            parameters: json!({"file_name": "notes.md", "content": "## Follow-up", "mode": "append"}),
            expected_result: "Successfully appended content to 'notes.md'".to_string(),
        }]
    }
}

/// Lists the Markdown files in the directory
pub struct ListMarkdownTool {
    store: Arc<MarkdownStore>,
}

impl ListMarkdownTool {
    pub fn new(store: Arc<MarkdownStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListMarkdownTool {
    fn name(&self) -> &str {
        "list_markdown_files"
    }

    fn description(&self) -> &str {
        "List all Markdown files in the files directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        Ok(into_tool_result(&call.id, self.store.list().await))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "See which files exist".to_string(),
            parameters: json!({}),
            expected_result: "Markdown files in 'files' directory:\n- notes.md".to_string(),
        }]
    }
}

/// Factory producing one of the Markdown tools over a shared store
pub struct MarkdownToolFactory {
    store: Arc<MarkdownStore>,
    name: String,
    description: String,
    build: fn(Arc<MarkdownStore>) -> Box<dyn Tool>,
}

impl MarkdownToolFactory {
    fn new(store: Arc<MarkdownStore>, build: fn(Arc<MarkdownStore>) -> Box<dyn Tool>) -> Self {
        let tool = build(store.clone());
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            store,
            build,
        }
    }
}

impl ToolFactory for MarkdownToolFactory {
    fn create(&self) -> Box<dyn Tool> {
        (self.build)(self.store.clone())
    }

    fn tool_name(&self) -> &str {
        &self.name
    }

    fn tool_description(&self) -> &str {
        &self.description
    }
}

/// Factories for all four Markdown tools sharing `files_dir`
pub fn factories(files_dir: impl Into<PathBuf>) -> Vec<Box<dyn ToolFactory>> {
    let store = Arc::new(MarkdownStore::new(files_dir));
    let builders: [fn(Arc<MarkdownStore>) -> Box<dyn Tool>; 4] = [
        |s| Box::new(ReadMarkdownTool::new(s)),
        |s| Box::new(CreateMarkdownTool::new(s)),
        |s| Box::new(EditMarkdownTool::new(s)),
        |s| Box::new(ListMarkdownTool::new(s)),
    ];

    builders
        .into_iter()
        .map(|build| Box::new(MarkdownToolFactory::new(store.clone(), build)) as Box<dyn ToolFactory>)
        .collect()
}

/// The four Markdown tools sharing `files_dir`
pub fn tools(files_dir: impl Into<PathBuf>) -> Vec<Box<dyn Tool>> {
    factories(files_dir).iter().map(|f| f.create()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, MarkdownStore) {
        let tmp = TempDir::new().unwrap();
        let store = MarkdownStore::new(tmp.path().join("files"));
        (tmp, store)
    }

    #[test]
    fn test_resolve_normalises_extension() {
        let store = MarkdownStore::new("files");
        assert_eq!(store.resolve("notes").unwrap(), PathBuf::from("files/notes.md"));
        assert_eq!(store.resolve("notes.txt").unwrap(), PathBuf::from("files/notes.md"));
        assert_eq!(
            store.resolve("Guide.MARKDOWN").unwrap(),
            PathBuf::from("files/Guide.MARKDOWN")
        );
    }

    #[test]
    fn test_resolve_rejects_directories() {
        let store = MarkdownStore::new("files");
        for bad in ["../secret.md", "sub/a.md", "..", "", "a\\b.md"] {
            let err = store.resolve(bad).unwrap_err();
            assert!(matches!(err, MarkdownError::InvalidName { .. }), "{}", bad);
        }
    }

    #[tokio::test]
    async fn test_create_then_read() {
        let (_tmp, store) = store();

        let created = store.create("notes", "# Notes").await.unwrap();
        assert_eq!(created, "Successfully created Markdown file: 'notes.md'");

        let read = store.read("notes.md").await.unwrap();
        let expected_path = store.dir().join("notes.md");
        assert_eq!(
            read,
            format!("Content of '{}':\n\n# Notes", expected_path.display())
        );
    }

    #[tokio::test]
    async fn test_create_existing_file_fails() {
        let (_tmp, store) = store();
        store.create("a.md", "x").await.unwrap();

        let err = store.create("a", "y").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "File 'a.md' already exists. Use edit_markdown_file to modify existing files."
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_have_one_winner() {
        let (_tmp, store) = store();
        let store = Arc::new(store);

        let attempts = (0..8).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { (i, store.create("race", &format!("writer {}", i)).await) })
        });
        let outcomes = futures::future::join_all(attempts).await;

        let winners: Vec<usize> = outcomes
            .iter()
            .filter_map(|o| match o.as_ref().unwrap() {
                (i, Ok(_)) => Some(*i),
                (_, Err(e)) => {
                    assert!(matches!(e, MarkdownError::AlreadyExists { .. }), "{}", e);
                    None
                }
            })
            .collect();
        assert_eq!(winners.len(), 1);

        let content = tokio::fs::read_to_string(store.dir().join("race.md"))
            .await
            .unwrap();
        assert_eq!(content, format!("writer {}", winners[0]));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (_tmp, store) = store();
        let err = store.read("ghost").await.unwrap_err();
        let path = store.dir().join("ghost.md");
        assert_eq!(
            err.to_string(),
            format!("File '{}' does not exist in files directory.", path.display())
        );
    }

    #[tokio::test]
    async fn test_edit_modes() {
        let (_tmp, store) = store();
        store.create("doc.md", "middle").await.unwrap();
        let path = store.dir().join("doc.md");

        assert_eq!(
            store.edit("doc.md", "end", "append").await.unwrap(),
            "Successfully appended content to 'doc.md'"
        );
        assert_eq!(
            store.edit("doc.md", "start", "prepend").await.unwrap(),
            "Successfully prepended content to 'doc.md'"
        );
        assert_eq!(
            tokio::fs::read_to_string(&path).await.unwrap(),
            "start\nmiddle\nend"
        );

        assert_eq!(
            store.edit("doc", "fresh", "replace").await.unwrap(),
            "Successfully replaced content in 'doc.md'"
        );
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_edit_errors() {
        let (_tmp, store) = store();
        let err = store.edit("none.md", "x", "replace").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "File 'none.md' does not exist. Use create_markdown_file to create new files."
        );

        store.create("doc.md", "x").await.unwrap();
        let err = store.edit("doc.md", "y", "overwrite").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid mode 'overwrite'. Use 'replace', 'append', or 'prepend'."
        );
    }

    #[tokio::test]
    async fn test_list_creates_missing_dir_and_sorts() {
        let (_tmp, store) = store();
        let dir = store.dir().display().to_string();

        assert_eq!(
            store.list().await.unwrap(),
            format!("No Markdown files found in '{}' directory", dir)
        );
        assert!(store.dir().is_dir());

        store.create("zeta", "z").await.unwrap();
        store.create("alpha.markdown", "a").await.unwrap();
        tokio::fs::write(store.dir().join("skip.txt"), "t").await.unwrap();

        assert_eq!(
            store.list().await.unwrap(),
            format!("Markdown files in '{}' directory:\n- alpha.markdown\n- zeta.md", dir)
        );
    }

    #[tokio::test]
    async fn test_list_rejects_plain_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("files");
        tokio::fs::write(&path, "not a dir").await.unwrap();

        let store = MarkdownStore::new(&path);
        let err = store.list().await.unwrap_err();
        assert_eq!(err.to_string(), format!("'{}' is not a directory.", path.display()));
    }

    #[tokio::test]
    async fn test_tools_prefix_errors() {
        let tmp = TempDir::new().unwrap();
        let tools = tools(tmp.path());
        let read = tools
            .iter()
            .find(|t| t.name() == "read_markdown_file")
            .unwrap();

        let result = read
            .execute(ToolCall::new("read_markdown_file", json!({"file_name": "../etc/passwd"})))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(
            result.content,
            "Error: Invalid file name '../etc/passwd'. Provide a plain file name without directories."
        );
    }

    #[tokio::test]
    async fn test_edit_tool_defaults_to_replace() {
        let tmp = TempDir::new().unwrap();
        let tools = tools(tmp.path());
        let find = |name: &str| tools.iter().find(|t| t.name() == name).unwrap();

        find("create_markdown_file")
            .execute(ToolCall::new("create_markdown_file", json!({"file_name": "a", "content": "old"})))
            .await
            .unwrap();
        let result = find("edit_markdown_file")
            .execute(ToolCall::new("edit_markdown_file", json!({"file_name": "a", "content": "new"})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.content, "Successfully replaced content in 'a.md'");
    }
}
