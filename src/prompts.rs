//! Prompt templates for the LLM-backed workers.
//!
//! Every template names the worker's role, embeds the task and a JSON
//! rendering of the project context, and states the exact output shape the
//! worker's response parser expects.

use serde_json::{Map, Value};

use crate::orchestrator::ProjectContext;

/// Line prefix the tester uses to announce how to run its tests.
pub const TEST_COMMAND_PREFIX: &str = "Test command:";

fn header(prompt: &mut String, role: &str, task: &str) {
    prompt.push_str(&format!("# Role: {}\n\n", role));
    prompt.push_str(&format!("## Task\n\"{}\"\n\n", task));
}

fn context_section(prompt: &mut String, ctx: &ProjectContext) {
    prompt.push_str("## Context\n```json\n");
    prompt.push_str(&ctx.to_prompt_json());
    prompt.push_str("\n```\n\n");
}

fn file_block_rules(prompt: &mut String, example_name: &str, example_lang: &str) {
    prompt.push_str(
        "## Output\n\
         Code in markdown blocks. Precede each code block with \"Filename: <relative path>\" \
         on its own line.\n\n",
    );
    prompt.push_str(&format!(
        "Example:\nFilename: {}\n```{}\n...\n```\n\n",
        example_name, example_lang
    ));
}

/// Stack selection. Expects a single JSON object back.
pub fn language_selector(goal: &str) -> String {
    let mut prompt = String::new();
    header(&mut prompt, "Language Selector", &format!("Choose a stack for: {}", goal));
    prompt.push_str(
        "## Output (JSON ONLY)\n\
         {\"language\": \"lang\", \"framework\": \"framework\", \"reasoning\": \"why\"}\n\n\
         ## Rules\n\
         - Standard, well-supported technology\n\
         - Be concise\n",
    );
    prompt
}

/// Architecture plan. Expects the seven plan sections as one JSON object.
pub fn planner(goal: &str, language_config: Option<&Map<String, Value>>) -> String {
    let stack = language_config
        .and_then(|c| serde_json::to_string_pretty(c).ok())
        .unwrap_or_else(|| "{}".to_string());

    let mut prompt = String::new();
    prompt.push_str("# Role: Planner\n");
    prompt.push_str("You are an expert software architect creating detailed implementation plans.\n\n");
    prompt.push_str(&format!(
        "## Task\nCreate a comprehensive architecture plan for: \"{}\"\n\n",
        goal
    ));
    prompt.push_str(&format!("## Tech Stack\n{}\n\n", stack));
    prompt.push_str(
        "## Output Format (JSON ONLY)\n\
         Return a single JSON object with these exact keys:\n\
         {\n\
         \x20 \"overview\": \"2-3 sentence high-level project description\",\n\
         \x20 \"file_structure\": \"ASCII tree of all files\",\n\
         \x20 \"frontend_architecture\": \"Frontend design and components\",\n\
         \x20 \"backend_architecture\": \"Server design, request flow, data model\",\n\
         \x20 \"api_endpoints\": \"All endpoints as 'METHOD /path - description'\",\n\
         \x20 \"dependencies\": [\"dep==version\"],\n\
         \x20 \"build_commands\": [\"command\"],\n\
         \x20 \"plan\": [{\"step_id\": 1, \"description\": \"desc\", \"files\": [\"file.ext\"]}]\n\
         }\n\n\
         ## Rules\n\
         - Include all seven sections, overview through build_commands\n\
         - Dependencies carry exact versions\n\
         - Plan steps are small and concrete\n",
    );
    prompt
}

/// Frontend code generation.
pub fn frontend_coder(task: &str, ctx: &ProjectContext, plan: Option<&str>) -> String {
    let mut prompt = String::new();
    header(&mut prompt, "Frontend Coder", task);
    context_section(&mut prompt, ctx);
    plan_section(&mut prompt, plan);
    file_block_rules(&mut prompt, "index.html", "html");
    prompt.push_str(
        "## Rules\n\
         1. Clean, semantic code using modern practices.\n\
         2. No placeholders. Write the full code.\n\
         3. Close every tag and keep the syntax valid.\n",
    );
    prompt
}

/// Backend code generation.
pub fn backend_coder(task: &str, ctx: &ProjectContext, plan: Option<&str>) -> String {
    let mut prompt = String::new();
    header(&mut prompt, "Backend Coder", task);
    context_section(&mut prompt, ctx);
    plan_section(&mut prompt, plan);
    file_block_rules(&mut prompt, "app.py", "python");
    prompt.push_str(
        "## Rules\n\
         1. Secure and efficient. Handle errors.\n\
         2. No placeholders. Write the full code.\n\
         3. Include every import.\n",
    );
    prompt
}

fn plan_section(prompt: &mut String, plan: Option<&str>) {
    if let Some(plan) = plan {
        prompt.push_str("## Plan\n");
        prompt.push_str(plan.trim());
        prompt.push_str("\n\n");
    }
}

/// Dependency installation commands. Expects `{"commands": [...]}`.
pub fn terminal_agent(task: &str, ctx: &ProjectContext) -> String {
    let mut prompt = String::new();
    header(&mut prompt, "Terminal Agent", task);
    context_section(&mut prompt, ctx);
    prompt.push_str(
        "## Output (JSON ONLY)\n\
         {\"commands\": [\"cmd1\", \"cmd2\"], \"reasoning\": \"why\"}\n\n\
         ## Rules\n\
         - Safe, non-interactive commands only\n\
         - Commands run from the project root\n",
    );
    prompt
}

/// Test generation. File blocks plus an optional run command line.
pub fn tester(task: &str, ctx: &ProjectContext) -> String {
    let mut prompt = String::new();
    header(&mut prompt, "Tester", task);
    context_section(&mut prompt, ctx);
    file_block_rules(&mut prompt, "tests/test_app.py", "python");
    prompt.push_str(&format!(
        "After the code blocks, add one line of the form\n\
         {} <command that runs the tests>\n\n",
        TEST_COMMAND_PREFIX
    ));
    prompt.push_str(
        "## Rules\n\
         - Independent tests\n\
         - Cover success and failure paths\n",
    );
    prompt
}

/// Failure analysis and fixes.
pub fn debugger(task: &str, ctx: &ProjectContext) -> String {
    let mut prompt = String::new();
    header(&mut prompt, "Debugger", task);
    context_section(&mut prompt, ctx);
    if let Some(report) = ctx.artifacts.test_report.as_deref() {
        prompt.push_str("## Current Test Report\n");
        prompt.push_str(report.trim());
        prompt.push_str("\n\n");
    }
    prompt.push_str(
        "## Output\n\
         A short root-cause analysis, then the complete fixed files. Precede each code \
         block with \"Filename: <relative path>\" on its own line.\n\n\
         ## Rules\n\
         - Identify the root cause before changing code\n\
         - Rewrite whole files, never fragments\n",
    );
    prompt
}

/// Project documentation in markdown.
pub fn documentation(task: &str, ctx: &ProjectContext) -> String {
    let mut prompt = String::new();
    header(&mut prompt, "Documentation Agent", task);
    context_section(&mut prompt, ctx);
    prompt.push_str(
        "## Output\n\
         The full README in markdown, nothing else.\n\n\
         ## Rules\n\
         - Clear and concise\n\
         - Cover setup and usage\n",
    );
    prompt
}
