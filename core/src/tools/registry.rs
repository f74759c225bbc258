//! Tool registry for managing available tools

use crate::tools::builtin::{markdown, WebSearchToolFactory};
use crate::tools::{Tool, ToolExecutor};
use std::collections::HashMap;
use std::path::PathBuf;

/// Registry for managing tool creation and registration
pub struct ToolRegistry {
    factories: HashMap<String, Box<dyn ToolFactory>>,
}

/// Factory trait for creating tools
pub trait ToolFactory: Send + Sync {
    /// Create a new instance of the tool
    fn create(&self) -> Box<dyn Tool>;

    /// Get the name of the tool this factory creates
    fn tool_name(&self) -> &str;

    /// Get the description of the tool this factory creates
    fn tool_description(&self) -> &str;
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every local tool, with markdown files kept under `files_dir`
    pub fn with_files_dir(files_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register_factory(Box::new(WebSearchToolFactory));
        for factory in markdown::factories(files_dir) {
            registry.register_factory(factory);
        }
        registry
    }

    /// Register a tool factory
    pub fn register_factory(&mut self, factory: Box<dyn ToolFactory>) {
        self.factories
            .insert(factory.tool_name().to_string(), factory);
    }

    /// Create a tool by name
    pub fn create_tool(&self, name: &str) -> Option<Box<dyn Tool>> {
        self.factories.get(name).map(|factory| factory.create())
    }

    /// List all available tool names, sorted
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get tool information
    pub fn get_tool_info(&self, name: &str) -> Option<(&str, &str)> {
        self.factories
            .get(name)
            .map(|factory| (factory.tool_name(), factory.tool_description()))
    }

    /// Create a tool executor with the specified tools; unknown names are skipped
    pub fn create_executor<S: AsRef<str>>(&self, tool_names: &[S]) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for name in tool_names {
            match self.create_tool(name.as_ref()) {
                Some(tool) => executor.register_tool(tool),
                None => tracing::warn!(tool = name.as_ref(), "unknown tool requested"),
            }
        }

        executor
    }

    /// Create a tool executor with all available tools
    pub fn create_executor_with_all(&self) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for factory in self.factories.values() {
            executor.register_tool(factory.create());
        }

        executor
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_files_dir(markdown::DEFAULT_FILES_DIR)
    }
}

/// Macro to help implement factories for tools built with `new()`
#[macro_export]
macro_rules! impl_tool_factory {
    ($factory:ident, $tool:ident, $name:expr, $description:expr) => {
        pub struct $factory;

        impl $crate::tools::ToolFactory for $factory {
            fn create(&self) -> Box<dyn $crate::tools::Tool> {
                Box::new($tool::new())
            }

            fn tool_name(&self) -> &str {
                $name
            }

            fn tool_description(&self) -> &str {
                $description
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::ToolRegistry;

    const LOCAL_TOOLS: [&str; 5] = [
        "create_markdown_file",
        "edit_markdown_file",
        "list_markdown_files",
        "read_markdown_file",
        "websearch",
    ];

    #[test]
    fn test_default_registry_has_all_local_tools() {
        let registry = ToolRegistry::default();
        assert_eq!(registry.list_tools(), LOCAL_TOOLS.to_vec());
    }

    #[test]
    fn test_tool_creation_matches_factory() {
        let registry = ToolRegistry::default();

        for tool_name in LOCAL_TOOLS {
            let tool = registry
                .create_tool(tool_name)
                .unwrap_or_else(|| panic!("failed to create tool '{}'", tool_name));
            assert_eq!(tool.name(), tool_name);
            assert!(!tool.description().is_empty());

            let (name, description) = registry.get_tool_info(tool_name).unwrap();
            assert_eq!(name, tool_name);
            assert_eq!(description, tool.description());
        }
    }

    #[test]
    fn test_tool_parameter_schemas_are_objects() {
        let registry = ToolRegistry::default();

        for tool_name in registry.list_tools() {
            let schema = registry.create_tool(tool_name).unwrap().parameters_schema();
            assert_eq!(
                schema.get("type").and_then(|t| t.as_str()),
                Some("object"),
                "tool '{}' schema type is not 'object'",
                tool_name
            );
            assert!(schema.get("properties").map_or(false, |p| p.is_object()));
        }
    }

    #[test]
    fn test_create_executor_skips_unknown_names() {
        let registry = ToolRegistry::default();
        let executor = registry.create_executor(&["websearch", "bash"]);
        assert_eq!(executor.list_tools(), vec!["websearch"]);

        let all = registry.create_executor_with_all();
        assert_eq!(all.list_tools().len(), LOCAL_TOOLS.len());
    }

    #[test]
    fn test_every_tool_has_examples() {
        let registry = ToolRegistry::default();

        for tool_name in registry.list_tools() {
            let tool = registry.create_tool(tool_name).unwrap();
            let examples = tool.examples();
            assert!(!examples.is_empty(), "tool '{}' has no examples", tool_name);
            for example in examples {
                assert!(!example.description.is_empty());
                assert!(example.parameters.is_object());
                assert!(!example.expected_result.is_empty());
            }
        }
    }
}
