// Sleuthcrab - GPL-3.0-or-later
// Embeds the commit the binary was built from, shown by `sleuthcrab --version`

use std::process::Command;

fn git(args: &[&str]) -> Option<Vec<u8>> {
    let output = Command::new("git").args(args).output().ok()?;
    output.status.success().then_some(output.stdout)
}

fn main() {
    let hash = git(&["rev-parse", "--short", "HEAD"])
        .and_then(|stdout| String::from_utf8(stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string());

    // Uncommitted changes get a -dirty suffix
    let dirty = git(&["status", "--porcelain"]).is_some_and(|stdout| !stdout.is_empty());
    let version = if dirty { format!("{hash}-dirty") } else { hash };

    println!("cargo:rustc-env=GIT_HASH={version}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
}
