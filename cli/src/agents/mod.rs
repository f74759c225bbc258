//! Prompts and card metadata of each agent role

use switchboard_core::AgentConfig;

/// Static description of one agent role
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub system_prompt: &'static str,
    /// Local tools from the registry; remote proxy tools are added at startup
    pub tools: &'static [&'static str],
}

impl AgentProfile {
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            name: self.name.to_string(),
            description: self.description.to_string(),
            system_prompt: self.system_prompt.to_string(),
            tools: self.tools.iter().map(|t| t.to_string()).collect(),
            ..AgentConfig::default()
        }
    }
}

pub const SEARCH: AgentProfile = AgentProfile {
    name: "Search Agent",
    description: "An agent that can search the web to answer questions.",
    system_prompt: "You are a helpful assistant.
Help users to find information based on their queries and answer questions.
Use the websearch tool to find information.",
    tools: &["websearch"],
};

pub const MARKDOWN: AgentProfile = AgentProfile {
    name: "Markdown Agent",
    description:
        "An agent that can create, read, edit, and list Markdown files in the 'files' directory.",
    system_prompt: "You are a specialized Markdown assistant that helps
users manage Markdown files in the 'files' directory.

Your capabilities include:
1. Reading existing Markdown files from the files directory
2. Creating new Markdown files in the files directory
3. Editing existing Markdown files (replace, append, or prepend content)
4. Listing all Markdown files in the files directory
5. Using AI to help structure and improve Markdown content

Important: All file operations work within the 'files' directory.
Users only need to provide the filename (e.g., 'readme.md'), not the full path.

When users ask you to create or edit Markdown content, you should:
- Use proper Markdown syntax (headers, lists, links, code blocks, etc.)
- Structure content logically with appropriate headings
- Suggest improvements to make the content more readable
- Follow Markdown best practices

Always use the provided tools to perform file operations. When creating
content, make it well-structured and professional.",
    tools: &[
        "read_markdown_file",
        "create_markdown_file",
        "edit_markdown_file",
        "list_markdown_files",
    ],
};

pub const SUPERVISOR: AgentProfile = AgentProfile {
    name: "Supervisor Agent",
    description: "A supervisor agent that orchestrates other specialised agents.",
    system_prompt: "You are an intelligent supervisor agent.
Your job is to analyse the user's request and break it down into logical steps.
Use your tools to find the right agent for each step.
Pick the matching tool of the right specialist to get the step done.
Combine the tools to solve multi-step tasks.",
    tools: &[],
};

pub const CLIENT: AgentProfile = AgentProfile {
    name: "Client Agent",
    description: "A user-facing agent that forwards requests to the supervisor.",
    system_prompt: "You are a user-friendly client agent. Your job is to take the
user's requests and carry them out with the available tools. These tools are
proxies that call a powerful supervisor agent, which in turn orchestrates other
specialists.",
    tools: &[],
};

/// Roles that run with local tools only
pub const LOCAL: [AgentProfile; 2] = [SEARCH, MARKDOWN];
