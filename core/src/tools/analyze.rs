use std::collections::HashMap;
use std::path::PathBuf;

use bun_runner_protocol::CallToolResult;
use serde::Deserialize;

use crate::error::Result;
use crate::exec::ExecParams;
use crate::exec::execute;
use crate::manifest::load_manifest;
use crate::session::Session;
use crate::tools::ensure_approved;
use crate::tools::shell_invocation;

const ANALYSIS_TIMEOUT_MS: u64 = 30_000;

/// Dependencies whose presence usually signals build-tooling weight the
/// runtime could replace.
const HEAVY_DEPENDENCIES: [&str; 6] = ["webpack", "babel", "typescript", "react", "vue", "angular"];

#[derive(Debug, Deserialize)]
pub struct AnalyzeArgs {
    pub project_dir: PathBuf,
    /// Defaults to the manifest's `main`, then `index.js`.
    #[serde(default)]
    pub entry_point: Option<String>,
    #[serde(default)]
    pub bundle: bool,
    #[serde(default)]
    pub dependencies: bool,
    #[serde(default)]
    pub runtime: bool,
}

/// Surveys a project's performance characteristics: bundle size, dependency
/// weight, and entry-point runtime. Each requested section degrades to a
/// diagnostic line on failure instead of failing the whole analysis.
pub async fn analyze_project(session: &Session, args: AnalyzeArgs) -> Result<CallToolResult> {
    let AnalyzeArgs {
        project_dir,
        entry_point,
        bundle,
        dependencies,
        runtime,
    } = args;

    let manifest = load_manifest(&project_dir).await?;
    let entry = entry_point
        .or_else(|| manifest.main.clone())
        .unwrap_or_else(|| "index.js".to_string());
    let entry_path = project_dir.join(&entry);

    ensure_approved(
        session,
        &format!("Analyze project performance: {}", project_dir.display()),
    )
    .await?;

    let mut report = format!("Performance analysis for: {}\n", project_dir.display());
    report.push_str(&format!("Entry point: {entry}\n\n"));

    if bundle {
        report.push_str(&analyze_bundle(&project_dir, &entry_path).await);
    }

    if dependencies {
        let dep_count = manifest.dependencies.len();
        let dev_dep_count = manifest.dev_dependencies.len();
        report.push_str(&format!(
            "Dependencies: {dep_count} production, {dev_dep_count} development\n"
        ));

        let heavy: Vec<&str> = manifest
            .dependencies
            .keys()
            .filter(|dep| HEAVY_DEPENDENCIES.iter().any(|h| dep.contains(h)))
            .map(String::as_str)
            .collect();
        if !heavy.is_empty() {
            report.push_str(&format!("Heavy dependencies: {}\n", heavy.join(", ")));
            report.push_str(
                "Recommendation: consider the runtime's built-in features to replace some of these\n",
            );
        }
    }

    if runtime {
        report.push_str(&analyze_runtime(&project_dir, &entry_path).await);
    }

    report.push_str("\nOptimization suggestions:\n");
    report.push_str("- Use 'bun --smol' for memory-constrained environments\n");
    report.push_str("- Use 'bun --hot' for development hot reloading\n");
    report.push_str("- Consider 'bun build' with --minify for production\n");
    report.push_str("- Use the built-in test runner: 'bun test'\n");

    Ok(CallToolResult::text(report))
}

async fn analyze_bundle(project_dir: &PathBuf, entry_path: &PathBuf) -> String {
    let out_dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => return format!("Bundle analysis: failed - {err}\n"),
    };

    let command = format!(
        "bun build {} --outdir {} --target bun",
        entry_path.display(),
        out_dir.path().display()
    );
    let output = execute(ExecParams {
        command: shell_invocation(&command),
        cwd: project_dir.clone(),
        timeout_ms: Some(ANALYSIS_TIMEOUT_MS),
        env: HashMap::new(),
        stdin: None,
    })
    .await;

    if !output.outcome.is_success() {
        return format!(
            "Bundle analysis: failed - {}\n",
            output.stderr.lines().next().unwrap_or("build did not succeed")
        );
    }

    let artifact = entry_path
        .file_name()
        .map(|name| out_dir.path().join(name).with_extension("js"));
    match artifact {
        Some(path) => match tokio::fs::metadata(&path).await {
            Ok(meta) => format!("Bundle size: {:.2} KB\n", meta.len() as f64 / 1024.0),
            Err(_) => "Bundle size: could not determine\n".to_string(),
        },
        None => "Bundle size: could not determine\n".to_string(),
    }
}

async fn analyze_runtime(project_dir: &PathBuf, entry_path: &PathBuf) -> String {
    if tokio::fs::metadata(entry_path).await.is_err() {
        return "Runtime analysis: could not execute entry point\n".to_string();
    }

    let output = execute(ExecParams {
        command: shell_invocation(&format!("bun {}", entry_path.display())),
        cwd: project_dir.clone(),
        timeout_ms: Some(ANALYSIS_TIMEOUT_MS),
        env: HashMap::new(),
        stdin: None,
    })
    .await;

    if output.outcome.is_success() {
        format!(
            "Runtime test: completed in {}ms\nRuntime output:\n{}\n",
            output.duration.as_millis(),
            output.stdout
        )
    } else {
        "Runtime analysis: could not execute entry point\n".to_string()
    }
}
