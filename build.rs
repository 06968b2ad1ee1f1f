use std::process::Command;

/// Short changeset id of the checkout being built, from git or hg
fn revision_id() -> Option<String> {
    let candidates: [(&str, &[&str]); 2] = [
        ("git", &["rev-parse", "--short", "HEAD"]),
        ("hg", &["id", "-i"]),
    ];

    candidates.iter().find_map(|(program, args)| {
        let output = Command::new(program).args(*args).output().ok()?;
        if !output.status.success() {
            return None;
        }
        let id = String::from_utf8(output.stdout).ok()?.trim().to_string();
        (!id.is_empty()).then_some(id)
    })
}

fn main() {
    let now = chrono::Utc::now();
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let revision = revision_id().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", revision);

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-changed=.hg/dirstate");
}
