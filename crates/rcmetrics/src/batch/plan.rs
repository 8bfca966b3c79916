use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Reference photos ending in this are texture bakes, not camera views.
const DIFFUSE_SUFFIX: &str = "_diffuse.png";
const RENDER_SUFFIX: &str = "_render.png";

/// One rendered/reference pair to score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    /// Camera name: the reference photo's file name.
    pub camera: String,
    pub rendered: PathBuf,
    pub reference: PathBuf,
}

impl BatchJob {
    /// Case-insensitive substring match on the camera name.
    pub fn matches_filter(&self, pattern: &str) -> bool {
        self.camera
            .to_lowercase()
            .contains(&pattern.to_lowercase())
    }
}

/// Jobs ready to run plus cameras that had no render on disk.
#[derive(Debug, Default)]
pub struct BatchPlan {
    pub jobs: Vec<BatchJob>,
    pub missing: Vec<BatchJob>,
}

impl BatchPlan {
    pub fn total(&self) -> usize {
        self.jobs.len()
    }
}

/// Render file for a camera: the name up to its first `.`, plus `_render.png`.
pub fn render_path(renders_dir: &Path, camera: &str) -> PathBuf {
    let stem = camera.split('.').next().unwrap_or(camera);
    renders_dir.join(format!("{stem}{RENDER_SUFFIX}"))
}

/// Pair every reference photo in `references_dir` with its render.
pub fn plan(references_dir: &Path, renders_dir: &Path, filter: Option<&str>) -> Result<BatchPlan> {
    if !references_dir.is_dir() {
        anyhow::bail!("Reference directory {} does not exist", references_dir.display());
    }
    let pattern = format!(
        "{}/*.png",
        glob::Pattern::escape(&references_dir.to_string_lossy())
    );
    let mut references: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid reference pattern {pattern}"))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "skipping unreadable reference entry");
                None
            }
        })
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| !n.to_string_lossy().ends_with(DIFFUSE_SUFFIX))
        })
        .collect();
    references.sort();
    debug!(count = references.len(), dir = %references_dir.display(), "discovered references");

    let mut plan = BatchPlan::default();
    for reference in references {
        let Some(camera) = reference.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let job = BatchJob {
            rendered: render_path(renders_dir, &camera),
            camera,
            reference,
        };
        if filter.is_some_and(|p| !job.matches_filter(p)) {
            continue;
        }
        if job.rendered.is_file() {
            plan.jobs.push(job);
        } else {
            warn!(
                camera = %job.camera,
                render = %job.rendered.display(),
                "render not found, skipping"
            );
            plan.missing.push(job);
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    fn layout() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let refs = root.path().join("photos");
        let renders = root.path().join("renders");
        std::fs::create_dir_all(&refs).unwrap();
        std::fs::create_dir_all(&renders).unwrap();
        for name in ["IMG_0003.png", "IMG_0001.png", "IMG_0002.png", "Statue_diffuse.png"] {
            touch(&refs, name);
        }
        touch(&refs, "notes.txt");
        touch(&renders, "IMG_0001_render.png");
        touch(&renders, "IMG_0003_render.png");
        (root, refs, renders)
    }

    #[test]
    fn render_path_cuts_at_first_dot() {
        let dir = Path::new("/out");
        assert_eq!(render_path(dir, "IMG_0001.png"), dir.join("IMG_0001_render.png"));
        assert_eq!(render_path(dir, "cam.001.png"), dir.join("cam_render.png"));
    }

    #[test]
    fn pairs_sorted_references_with_renders() {
        let (_root, refs, renders) = layout();
        let plan = plan(&refs, &renders, None).unwrap();
        let cameras: Vec<_> = plan.jobs.iter().map(|j| j.camera.as_str()).collect();
        assert_eq!(cameras, ["IMG_0001.png", "IMG_0003.png"]);
        assert_eq!(plan.jobs[0].reference, refs.join("IMG_0001.png"));
        assert_eq!(plan.jobs[0].rendered, renders.join("IMG_0001_render.png"));

        assert_eq!(plan.missing.len(), 1);
        assert_eq!(plan.missing[0].camera, "IMG_0002.png");
    }

    #[test]
    fn filter_is_case_insensitive() {
        let (_root, refs, renders) = layout();
        let plan = plan(&refs, &renders, Some("img_0003")).unwrap();
        assert_eq!(plan.total(), 1);
        assert_eq!(plan.jobs[0].camera, "IMG_0003.png");
        assert!(plan.missing.is_empty());
    }

    #[test]
    fn missing_reference_dir_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(plan(&root.path().join("nope"), root.path(), None).is_err());
    }
}
