use anyhow::Context;
use serde::Deserialize;

/// Dependencies each workspace crate must not pull in.
const FORBIDDEN: &[(&str, &[&str])] = &[
    ("kidquest-domain", &["tokio", "reqwest", "kidquest-shared", "kidquest-engine"]),
    ("kidquest-shared", &["tokio", "reqwest", "kidquest-engine"]),
];

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    kind: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

fn arch_check() -> anyhow::Result<()> {
    let output = std::process::Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed")
    }

    let metadata: Metadata =
        serde_json::from_slice(&output.stdout).context("parsing cargo metadata")?;
    let violations = violations(&metadata);
    if !violations.is_empty() {
        for v in &violations {
            eprintln!("arch-check: {v}");
        }
        anyhow::bail!("{} layering violation(s)", violations.len());
    }

    println!("arch-check: ok ({} packages)", metadata.packages.len());
    Ok(())
}

/// Normal (non-dev, non-build) dependencies that break the layering.
fn violations(metadata: &Metadata) -> Vec<String> {
    let mut found = Vec::new();
    for package in &metadata.packages {
        let Some((_, banned)) = FORBIDDEN.iter().find(|(name, _)| *name == package.name) else {
            continue;
        };
        for dep in &package.dependencies {
            if dep.kind.is_none() && banned.contains(&dep.name.as_str()) {
                found.push(format!("{} must not depend on {}", package.name, dep.name));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_runtime_deps_in_domain_only() {
        let metadata: Metadata = serde_json::from_str(
            r#"{"packages": [
                {"name": "kidquest-domain", "dependencies": [
                    {"name": "serde", "kind": null},
                    {"name": "tokio", "kind": null},
                    {"name": "kidquest-engine", "kind": "dev"}
                ]},
                {"name": "kidquest-engine", "dependencies": [
                    {"name": "tokio", "kind": null}
                ]}
            ]}"#,
        )
        .expect("metadata json");

        assert_eq!(
            violations(&metadata),
            vec!["kidquest-domain must not depend on tokio".to_string()]
        );
    }
}
