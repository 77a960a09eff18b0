use std::path::PathBuf;

use walkdir::WalkDir;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn demos_root() -> PathBuf {
    workspace_root().join("demos")
}

pub fn demo_dir(name: &str) -> PathBuf {
    demos_root().join(name)
}

pub fn testcase_path(name: &str) -> PathBuf {
    demo_dir(name).join("testcase.json")
}

/// Every demo directory that ships a `testcase.json`, sorted by name.
pub fn demos_with_testcases() -> Vec<String> {
    let mut names = WalkDir::new(demos_root())
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| entry.path().join("testcase.json").is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_root_points_to_workspace() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn demos_root_points_to_demos_directory() {
        assert!(demos_root().is_dir());
    }

    #[test]
    fn demo_dir_joins_name() {
        assert!(demo_dir("kurose-counseling").is_dir());
    }

    #[test]
    fn testcase_path_joins_default_filename() {
        let path = testcase_path("kurose-counseling");
        assert!(path.ends_with("testcase.json"));
        assert!(path.is_file());
    }

    #[test]
    fn demos_with_testcases_lists_the_counseling_demo() {
        assert!(demos_with_testcases().contains(&"kurose-counseling".to_string()));
    }
}
