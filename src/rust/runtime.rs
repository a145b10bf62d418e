use std::env;
use std::path::{Path, PathBuf};

/// How the evaluator obtains the model it scores the test data with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EvaluationMode {
    /// Fit the training pipeline again on the test data, then score that data
    #[default]
    Refit,
    /// Score the test data with the model fitted on the training data
    Holdout,
}

/// Locations of the input files and the saved model, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub train_data: PathBuf,
    pub test_data: PathBuf,
    pub model: PathBuf,
}

impl AppPaths {
    /// `Data/issues_train.tsv`, `Data/issues_test.tsv` and `Models/model.bin` under `base_dir`
    pub fn from_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        let base_dir = base_dir.as_ref();
        Self {
            train_data: base_dir.join("Data").join("issues_train.tsv"),
            test_data: base_dir.join("Data").join("issues_test.tsv"),
            model: base_dir.join("Models").join("model.bin"),
        }
    }

    /// Two levels above the executable's directory, which is the crate root for
    /// binaries under `target/<profile>/`. Falls back to the current directory.
    pub fn default_base_dir() -> PathBuf {
        env::current_exe()
            .ok()
            .and_then(|exe| exe.ancestors().nth(3).map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::from_base_dir(Self::default_base_dir())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub paths: AppPaths,
    /// Seed for every stochastic step of training
    pub seed: u64,
    pub evaluation: EvaluationMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            paths: AppPaths::default(),
            seed: 0,
            evaluation: EvaluationMode::Refit,
        }
    }
}

impl RuntimeConfig {
    /// Default settings with every path under `base_dir`
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            paths: AppPaths::from_base_dir(base_dir),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_base_dir() {
        let paths = AppPaths::from_base_dir("/srv/issues");
        assert_eq!(paths.train_data, PathBuf::from("/srv/issues/Data/issues_train.tsv"));
        assert_eq!(paths.test_data, PathBuf::from("/srv/issues/Data/issues_test.tsv"));
        assert_eq!(paths.model, PathBuf::from("/srv/issues/Models/model.bin"));
    }

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::with_base_dir("base");
        assert_eq!(config.seed, 0);
        assert_eq!(config.evaluation, EvaluationMode::Refit);
        assert!(config.paths.model.ends_with("Models/model.bin"));
    }
}
