use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Mutex;

use tokio::process::Command;

/// Environment variable the resolver sets on a resolved command when a
/// specific runtime version is selected. Honoring it (e.g. via a version
/// manager shim on the PATH) is the host environment's concern; this layer
/// only decides whether a pin applies.
pub const VERSION_PIN_ENV_VAR: &str = "BUN_VERSION";

/// A command line ready to hand to the executor, together with any
/// environment the resolver wants overlaid on the child process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub command: String,
    pub env: HashMap<String, String>,
}

/// Availability of the preferred runtime, probed lazily with `bun --version`
/// and memoized for the process lifetime. `force_recheck` drops the cached
/// answer so a test suite can simulate installation or removal without a
/// process restart.
#[derive(Debug, Default)]
pub struct RuntimeProfile {
    bun_available: Mutex<Option<bool>>,
}

impl RuntimeProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// A profile with a fixed probe answer. Test seam; the production path
    /// always probes the real binary.
    pub fn preset(available: bool) -> Self {
        Self {
            bun_available: Mutex::new(Some(available)),
        }
    }

    pub async fn is_available(&self) -> bool {
        if let Ok(guard) = self.bun_available.lock()
            && let Some(cached) = *guard
        {
            return cached;
        }

        let available = probe_bun().await;
        if let Ok(mut guard) = self.bun_available.lock() {
            *guard = Some(available);
        }
        available
    }

    pub fn force_recheck(&self) {
        if let Ok(mut guard) = self.bun_available.lock() {
            *guard = None;
        }
    }

    /// Rewrites `command` for the runtime that will actually execute it.
    ///
    /// With the preferred runtime present the command passes through, picking
    /// up a version-pin environment entry when `selected_version` names a
    /// concrete version. Without it, prefix rules map the command onto the
    /// fallback toolchain; commands matching no rule pass through unchanged,
    /// since an unrecognized form may still be valid there. The rewrites are
    /// best-effort, not guaranteed-equivalent.
    pub async fn resolve(&self, command: &str, selected_version: Option<&str>) -> ResolvedCommand {
        if self.is_available().await {
            let mut env = HashMap::new();
            if let Some(version) = selected_version.filter(|v| !v.is_empty() && *v != "system") {
                env.insert(VERSION_PIN_ENV_VAR.to_string(), version.to_string());
            }
            ResolvedCommand {
                command: command.to_string(),
                env,
            }
        } else {
            ResolvedCommand {
                command: translate_to_fallback(command),
                env: HashMap::new(),
            }
        }
    }
}

/// Prefix-based rewrite of a bun command line onto the node/npm toolchain.
/// Idempotent: a command already in fallback form matches no rule.
pub fn translate_to_fallback(command: &str) -> String {
    if let Some(rest) = command.strip_prefix("bun run ") {
        return format!("npm run {rest}");
    }
    if let Some(rest) = command.strip_prefix("bun build ") {
        return format!("npx esbuild {rest}");
    }
    if let Some(rest) = command.strip_prefix("bun ") {
        return format!("node {rest}");
    }
    command.to_string()
}

async fn probe_bun() -> bool {
    Command::new("bun")
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn script_runs_map_to_npm() {
        assert_eq!(translate_to_fallback("bun run dev"), "npm run dev");
        assert_eq!(
            translate_to_fallback("bun run build -- --watch"),
            "npm run build -- --watch"
        );
    }

    #[test]
    fn builds_map_to_esbuild() {
        assert_eq!(
            translate_to_fallback("bun build src/index.ts --minify"),
            "npx esbuild src/index.ts --minify"
        );
    }

    #[test]
    fn bare_invocations_map_to_node() {
        assert_eq!(translate_to_fallback("bun script.js"), "node script.js");
    }

    #[test]
    fn unrecognized_commands_pass_through() {
        assert_eq!(translate_to_fallback("deno run x.ts"), "deno run x.ts");
        assert_eq!(translate_to_fallback("bun"), "bun");
    }

    #[test]
    fn translation_is_idempotent() {
        for input in ["bun run dev", "bun build a.ts", "bun a.js", "ls -la"] {
            let once = translate_to_fallback(input);
            assert_eq!(translate_to_fallback(&once), once);
        }
    }

    #[tokio::test]
    async fn unavailable_runtime_translates() {
        let profile = RuntimeProfile::preset(false);
        let resolved = profile.resolve("bun run dev", None).await;
        assert_eq!(resolved.command, "npm run dev");
        assert!(resolved.env.is_empty());
    }

    #[tokio::test]
    async fn available_runtime_passes_through_and_pins_version() {
        let profile = RuntimeProfile::preset(true);
        let resolved = profile.resolve("bun run dev", Some("1.1.30")).await;
        assert_eq!(resolved.command, "bun run dev");
        assert_eq!(
            resolved.env.get(VERSION_PIN_ENV_VAR).map(String::as_str),
            Some("1.1.30")
        );
    }

    #[tokio::test]
    async fn system_selection_does_not_pin() {
        let profile = RuntimeProfile::preset(true);
        let resolved = profile.resolve("bun run dev", Some("system")).await;
        assert!(resolved.env.is_empty());
    }

    #[tokio::test]
    async fn no_pin_under_fallback_runtime() {
        let profile = RuntimeProfile::preset(false);
        let resolved = profile.resolve("bun script.js", Some("1.1.30")).await;
        assert_eq!(resolved.command, "node script.js");
        assert!(resolved.env.is_empty());
    }

    #[test]
    fn force_recheck_clears_the_cache() {
        let profile = RuntimeProfile::preset(true);
        profile.force_recheck();
        let guard = profile.bun_available.lock();
        assert_eq!(guard.ok().and_then(|g| *g), None);
    }
}
