use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{LoaderConfig, MountTarget};
use crate::session::{EmbedInstance, EmbedLoader};
use crate::EmbedLoadError;

/// Loader that checks a build directory on disk holds every artifact the
/// loader config references. Used to validate a build before publishing it.
#[derive(Debug, Clone)]
pub struct BuildDirectoryLoader {
    root: PathBuf,
}

impl BuildDirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn local_path(&self, url: &str) -> PathBuf {
        let file_name = url.rsplit('/').next().unwrap_or(url);
        self.root.join(file_name)
    }
}

/// Result of a successful directory check: the total size of the artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInstance {
    pub root: PathBuf,
    pub total_bytes: u64,
}

impl EmbedInstance for BuildInstance {
    fn quit(&mut self) -> Result<(), EmbedLoadError> {
        Ok(())
    }
}

impl EmbedLoader for BuildDirectoryLoader {
    fn load(
        &mut self,
        target: &MountTarget,
        config: &LoaderConfig,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Box<dyn EmbedInstance>, EmbedLoadError> {
        if !self.root.is_dir() {
            return Err(EmbedLoadError::LoaderUnavailable(format!(
                "build directory {} does not exist",
                self.root.display()
            )));
        }
        if target.width == 0 || target.height == 0 {
            return Err(EmbedLoadError::Startup(
                "mount target has no drawable area".into(),
            ));
        }

        let artifacts = config.artifact_urls();
        let mut total_bytes = 0;
        for (index, url) in artifacts.iter().enumerate() {
            let path = self.local_path(url);
            let size = artifact_size(&path).map_err(|message| {
                if index == 0 {
                    EmbedLoadError::LoaderUnavailable(message)
                } else {
                    EmbedLoadError::Startup(message)
                }
            })?;
            debug!(path = %path.display(), size, "found viewer artifact");
            total_bytes += size;
            progress((index + 1) as f32 / artifacts.len() as f32);
        }

        Ok(Box::new(BuildInstance {
            root: self.root.clone(),
            total_bytes,
        }))
    }
}

fn artifact_size(path: &Path) -> Result<u64, String> {
    let metadata =
        fs::metadata(path).map_err(|err| format!("missing {}: {err}", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("{} is not a file", path.display()));
    }
    if metadata.len() == 0 {
        return Err(format!("{} is empty", path.display()));
    }
    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{EmbedSession, NoopEvents, ViewerStatus};

    fn write_build(dir: &Path, skip: Option<&str>) {
        for suffix in ["loader.js", "data", "framework.js", "wasm"] {
            if Some(suffix) == skip {
                continue;
            }
            fs::write(dir.join(format!("buildteste.{suffix}")), b"stub").unwrap();
        }
    }

    #[test]
    fn complete_build_mounts() {
        let temp = tempfile::tempdir().unwrap();
        write_build(temp.path(), None);
        let mut loader = BuildDirectoryLoader::new(temp.path());
        let mut session = EmbedSession::new(
            MountTarget::default(),
            LoaderConfig::from_build("/unity/Build", "buildteste"),
        );
        session.mount(&mut loader, &mut NoopEvents);
        assert_eq!(session.status(), &ViewerStatus::Ready);
    }

    #[test]
    fn missing_wasm_fails_startup() {
        let temp = tempfile::tempdir().unwrap();
        write_build(temp.path(), Some("wasm"));
        let mut loader = BuildDirectoryLoader::new(temp.path());
        let mut seen = Vec::new();
        let result = loader.load(
            &MountTarget::default(),
            &LoaderConfig::from_build("/unity/Build", "buildteste"),
            &mut |fraction| seen.push(fraction),
        );
        assert!(matches!(result, Err(EmbedLoadError::Startup(_))));
        assert_eq!(seen, vec![0.25, 0.5, 0.75]);
    }

    #[test]
    fn missing_directory_means_no_loader() {
        let temp = tempfile::tempdir().unwrap();
        let mut loader = BuildDirectoryLoader::new(temp.path().join("absent"));
        let result = loader.load(
            &MountTarget::default(),
            &LoaderConfig::from_build("", "buildteste"),
            &mut |_| {},
        );
        assert!(matches!(result, Err(EmbedLoadError::LoaderUnavailable(_))));
    }
}
