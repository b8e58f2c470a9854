//! One-way tree mirroring over rsync.

use crate::error::{Error, Result};
use crate::exec::{display_command, CommandRunner};

/// A single mirror job. `source` and `dest` are rsync endpoints, either
/// local paths or `user@host:path` remotes.
pub struct MirrorSpec {
    pub source: String,
    pub dest: String,
    /// Compare file contents, not just size and mtime. Slower, but
    /// required when timestamps cannot be trusted across hosts.
    pub checksum: bool,
    pub excludes: Vec<String>,
}

/// Builds the full argument vector for a mirror job. Deletions on the
/// destination are always enabled; a mirror is a mirror.
pub fn mirror_args(spec: &MirrorSpec) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-aH".to_string(),
        "--delete".to_string(),
        "--safe-links".to_string(),
    ];
    if spec.checksum {
        args.push("--checksum".to_string());
    }
    for pattern in &spec.excludes {
        args.push(format!("--exclude={}", pattern));
    }
    args.push(spec.source.clone());
    args.push(spec.dest.clone());
    args
}

/// Executes mirror jobs through an external rsync binary.
pub trait FileMirror {
    fn mirror(&self, step: &str, target: &str, spec: &MirrorSpec) -> Result<()>;
}

pub struct Rsync<'a> {
    bin: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> Rsync<'a> {
    pub fn new(bin: impl Into<String>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            bin: bin.into(),
            runner,
        }
    }
}

impl FileMirror for Rsync<'_> {
    fn mirror(&self, step: &str, target: &str, spec: &MirrorSpec) -> Result<()> {
        let args = mirror_args(spec);
        let output = self.runner.run(&self.bin, &args);
        if output.success {
            return Ok(());
        }
        Err(Error::step_failed(
            step,
            Some(target.to_string()),
            display_command(&self.bin, &args),
            &output,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> MirrorSpec {
        MirrorSpec {
            source: "deploy@prod1.example.com:/var/www/shared/files/".to_string(),
            dest: "/var/www/shared/files/".to_string(),
            checksum: false,
            excludes: vec!["css".to_string(), "js".to_string()],
        }
    }

    #[test]
    fn base_flags_and_endpoints() {
        let args = mirror_args(&spec());
        assert_eq!(
            args,
            vec![
                "-aH",
                "--delete",
                "--safe-links",
                "--exclude=css",
                "--exclude=js",
                "deploy@prod1.example.com:/var/www/shared/files/",
                "/var/www/shared/files/",
            ]
        );
    }

    #[test]
    fn checksum_flag_precedes_excludes() {
        let mut s = spec();
        s.checksum = true;
        let args = mirror_args(&s);
        assert_eq!(args[3], "--checksum");
        assert_eq!(args[4], "--exclude=css");
    }

    #[test]
    fn no_excludes_means_no_exclude_flags() {
        let mut s = spec();
        s.excludes.clear();
        let args = mirror_args(&s);
        assert!(!args.iter().any(|a| a.starts_with("--exclude")));
    }
}
