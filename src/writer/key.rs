use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::constants::AGENT_DIR_PATTERN;

lazy_static! {
    static ref AGENT_DIR: Regex = Regex::new(AGENT_DIR_PATTERN).unwrap();
}

/// Drop everything up to and including the last `agent/` or `agent_<n>/` directory.
///
/// Per-agent worker folders all map into the same key namespace.
pub fn strip_agent_dirs(path: &str) -> &str {
    match AGENT_DIR.find(path) {
        Some(m) => &path[m.end()..],
        None => path,
    }
}

/// Derive the object key for `local_path` in batch `upload_num`.
///
/// The key is `<prefix>/<directory>/<upload_num>-<filename>`, where the
/// directory has agent folders stripped. Empty components and stray slashes
/// are dropped, so `("runs", "/data/agent_3/ep1.csv", 2)` gives `runs/2-ep1.csv`.
pub fn object_key(prefix: &str, local_path: &Path, upload_num: u64) -> String {
    let path = local_path.to_string_lossy();
    let stripped = strip_agent_dirs(&path);

    let (directory, filename) = match stripped.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", stripped),
    };

    let leaf = format!("{}-{}", upload_num, filename);
    [prefix, directory, leaf.as_str()]
        .iter()
        .map(|component| component.trim_matches('/'))
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_strip_agent_dir() {
        assert_eq!(strip_agent_dirs("/data/agent/ep1.csv"), "ep1.csv");
        assert_eq!(strip_agent_dirs("/data/agent_7/ep1.csv"), "ep1.csv");
        assert_eq!(strip_agent_dirs("agent_12/eval/ep1.csv"), "eval/ep1.csv");
    }

    #[test]
    fn test_strip_uses_last_agent_dir() {
        assert_eq!(strip_agent_dirs("/a/agent/b/agent_2/c/m.json"), "c/m.json");
    }

    #[test]
    fn test_strip_ignores_lookalike_dirs() {
        assert_eq!(strip_agent_dirs("/data/subagent/ep1.csv"), "/data/subagent/ep1.csv");
        assert_eq!(strip_agent_dirs("/data/agent_x/ep1.csv"), "/data/agent_x/ep1.csv");
        assert_eq!(strip_agent_dirs("/data/agents/ep1.csv"), "/data/agents/ep1.csv");
        // A file named like an agent folder is not a directory
        assert_eq!(strip_agent_dirs("/data/agent"), "/data/agent");
    }

    #[test]
    fn test_object_key_agent_fixture() {
        let key = object_key("runs", Path::new("/data/agent_3/ep1.csv"), 2);
        assert_eq!(key, "runs/2-ep1.csv");
        assert!(!key.contains("agent_3"));
    }

    #[test]
    fn test_object_key_keeps_remaining_directories() {
        let key = object_key("runs", Path::new("/data/agent/eval/ep1.csv"), 0);
        assert_eq!(key, "runs/eval/0-ep1.csv");
    }

    #[test]
    fn test_object_key_without_agent_dir() {
        let key = object_key("runs/", Path::new("/tmp/metrics/training.json"), 5);
        assert_eq!(key, "runs/tmp/metrics/5-training.json");
    }

    #[test]
    fn test_object_key_empty_prefix_and_bare_filename() {
        assert_eq!(object_key("", Path::new("ep1.csv"), 1), "1-ep1.csv");
        assert_eq!(object_key("", Path::new("/agent/ep1.csv"), 1), "1-ep1.csv");
    }

    proptest! {
        #[test]
        fn prop_paths_without_agent_dirs_keep_directory(
            dirs in prop::collection::vec("[a-z]{1,8}", 0..4),
            file in "[a-z]{1,8}\\.csv",
            upload_num in 0u64..1000,
        ) {
            prop_assume!(dirs.iter().all(|d| d != "agent"));

            let mut path = PathBuf::from("/");
            for dir in &dirs {
                path.push(dir);
            }
            path.push(&file);

            let mut expected = vec!["runs".to_string()];
            expected.extend(dirs.iter().cloned());
            expected.push(format!("{}-{}", upload_num, file));

            prop_assert_eq!(object_key("runs", &path, upload_num), expected.join("/"));
        }

        #[test]
        fn prop_agent_dirs_never_reach_the_key(
            head in prop::collection::vec("[a-z]{1,8}", 0..3),
            agent in prop::option::of(0u32..100),
            tail in prop::collection::vec("[a-z]{1,8}", 0..3),
            file in "[a-z]{1,8}\\.json",
        ) {
            prop_assume!(tail.iter().all(|d| d != "agent"));

            let agent_dir = match agent {
                Some(n) => format!("agent_{}", n),
                None => "agent".to_string(),
            };

            let mut path = PathBuf::from("/");
            for dir in head.iter().chain(std::iter::once(&agent_dir)).chain(tail.iter()) {
                path.push(dir);
            }
            path.push(&file);

            let mut expected = vec!["runs".to_string()];
            expected.extend(tail.iter().cloned());
            expected.push(format!("0-{}", file));

            prop_assert_eq!(object_key("runs", &path, 0), expected.join("/"));
        }
    }
}
