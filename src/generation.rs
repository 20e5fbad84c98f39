//! The external generation procedure, behind traits.
//!
//! The orchestrator and chat engine only see opaque async functions:
//! `(request) -> report_text | error`. Deployments wire in a real backend
//! (the subprocess-driven implementations here, or their own); tests use
//! the static ones.

use crate::models::{ReportSource, ReportType, Tone};
use crate::storage::DocumentWorkspace;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Upper bound on workspace material included in a generation prompt.
const MAX_DOCUMENT_CONTEXT_BYTES: usize = 64 * 1024;

/// Everything a generation run receives: the immutable request fields plus
/// read access to the document workspace.
#[derive(Clone)]
pub struct GenerationContext {
    pub task: String,
    pub report_type: ReportType,
    pub report_source: ReportSource,
    pub tone: Tone,
    pub headers: Option<HashMap<String, String>>,
    pub repo_name: String,
    pub branch_name: String,
    pub workspace: Arc<DocumentWorkspace>,
}

/// Produces a report's text from a generation context.
///
/// Errors are plain strings: they are recorded verbatim on the report as its
/// terminal failure description.
pub trait ResearchGenerator: Send + Sync {
    fn generate(&self, ctx: GenerationContext) -> BoxFuture<'static, Result<String, String>>;
}

/// Produces the next assistant message from an assembled chat prompt.
pub trait ChatResponder: Send + Sync {
    fn respond(&self, prompt: String) -> BoxFuture<'static, Result<String, String>>;
}

// ============================================================================
// Subprocess-backed implementations
// ============================================================================

/// Runs a configured external program once per job, passing the assembled
/// prompt as the final argument and collecting stdout as the report text.
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a shell-ish command line: first token is the program, the rest
    /// are leading arguments.
    pub fn from_command_line(command_line: &str) -> Result<Self, String> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| "empty generator command".to_string())?;
        Ok(Self::new(program, parts.map(String::from).collect()))
    }

    async fn build_prompt(ctx: &GenerationContext) -> Result<String, String> {
        let mut prompt = format!(
            "Write a {} in a {} tone answering the following research task.\n\nTask: {}\n",
            ctx.report_type, ctx.tone, ctx.task
        );

        if ctx.report_source.uses_documents() {
            let corpus = ctx
                .workspace
                .read_corpus(None, MAX_DOCUMENT_CONTEXT_BYTES)
                .await
                .map_err(|e| format!("failed to read workspace documents: {}", e))?;
            if !corpus.is_empty() {
                prompt.push_str("\nSource documents:\n");
                prompt.push_str(&corpus);
            }
        }

        Ok(prompt)
    }
}

/// Run a program with the prompt appended as its final argument, returning
/// captured stdout.
async fn run_command(program: &str, args: &[String], prompt: &str) -> Result<String, String> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .arg(prompt)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| format!("failed to spawn generator '{}': {}", program, e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture generator stdout".to_string())?;

    let mut reader = BufReader::new(stdout).lines();
    let mut output = String::new();

    while let Ok(Some(line)) = reader.next_line().await {
        output.push_str(&line);
        output.push('\n');
    }

    let status = child
        .wait()
        .await
        .map_err(|e| format!("failed to wait for generator: {}", e))?;

    if !status.success() {
        return Err(format!("generator exited with status {}", status));
    }

    Ok(output)
}

impl ResearchGenerator for CommandGenerator {
    fn generate(&self, ctx: GenerationContext) -> BoxFuture<'static, Result<String, String>> {
        let program = self.program.clone();
        let args = self.args.clone();

        async move {
            let prompt = Self::build_prompt(&ctx).await?;
            run_command(&program, &args, &prompt).await
        }
        .boxed()
    }
}

impl ChatResponder for CommandGenerator {
    fn respond(&self, prompt: String) -> BoxFuture<'static, Result<String, String>> {
        let program = self.program.clone();
        let args = self.args.clone();

        async move { run_command(&program, &args, &prompt).await }.boxed()
    }
}

// ============================================================================
// Static implementations
// ============================================================================

/// Deterministic generator for tests and demo deployments: echoes the task
/// back inside a fixed report skeleton.
pub struct StaticGenerator;

impl ResearchGenerator for StaticGenerator {
    fn generate(&self, ctx: GenerationContext) -> BoxFuture<'static, Result<String, String>> {
        let text = format!(
            "# {}\n\nThis {} covers: {}\n",
            ctx.task, ctx.report_type, ctx.task
        );
        async move { Ok(text) }.boxed()
    }
}

/// Deterministic responder counterpart to [`StaticGenerator`].
pub struct StaticResponder;

impl ChatResponder for StaticResponder {
    fn respond(&self, prompt: String) -> BoxFuture<'static, Result<String, String>> {
        let preview: String = prompt.chars().take(120).collect();
        async move { Ok(format!("Based on the report: {}", preview)) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(workspace: Arc<DocumentWorkspace>, source: ReportSource) -> GenerationContext {
        GenerationContext {
            task: "rust adoption".to_string(),
            report_type: ReportType::ResearchReport,
            report_source: source,
            tone: Tone::Objective,
            headers: None,
            repo_name: "default".to_string(),
            branch_name: "main".to_string(),
            workspace,
        }
    }

    #[test]
    fn test_from_command_line() {
        let generator = CommandGenerator::from_command_line("researcher --fast").unwrap();
        assert_eq!(generator.program, "researcher");
        assert_eq!(generator.args, vec!["--fast".to_string()]);

        assert!(CommandGenerator::from_command_line("   ").is_err());
    }

    #[tokio::test]
    async fn test_prompt_includes_documents_for_local_source() {
        let temp_dir = TempDir::new().unwrap();
        let ws = Arc::new(DocumentWorkspace::new(temp_dir.path().join("docs")));
        ws.put(None, "facts.txt", b"rust is memory safe")
            .await
            .unwrap();

        let prompt = CommandGenerator::build_prompt(&context(ws.clone(), ReportSource::Local))
            .await
            .unwrap();
        assert!(prompt.contains("rust adoption"));
        assert!(prompt.contains("facts.txt"));
        assert!(prompt.contains("rust is memory safe"));

        // Web-only generation ignores the workspace.
        let prompt = CommandGenerator::build_prompt(&context(ws, ReportSource::Web))
            .await
            .unwrap();
        assert!(!prompt.contains("facts.txt"));
    }

    #[tokio::test]
    async fn test_static_generator_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let ws = Arc::new(DocumentWorkspace::new(temp_dir.path().join("docs")));

        let text = StaticGenerator
            .generate(context(ws, ReportSource::Web))
            .await
            .unwrap();
        assert!(text.contains("rust adoption"));
    }
}
