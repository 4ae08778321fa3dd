use std::process::Command;

fn git_short_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    let base = env!("CARGO_PKG_VERSION");

    // Timer installs built from a checkout get the sha appended so PVOutput
    // request logs can be matched to a build.
    let dev_build = std::env::var("HELIOS_DEV_BUILD")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let sha = git_short_sha().or_else(|| std::env::var("GIT_SHA").ok().filter(|s| !s.is_empty()));

    let version = match (dev_build, sha) {
        (true, Some(sha)) => format!("{base}-dev+{sha}"),
        (true, None) => format!("{base}-dev"),
        (false, _) => base.to_string(),
    };

    println!("cargo:rustc-env=HELIOS_VERSION={version}");
    println!("cargo:rerun-if-env-changed=HELIOS_DEV_BUILD");
    println!("cargo:rerun-if-env-changed=GIT_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
