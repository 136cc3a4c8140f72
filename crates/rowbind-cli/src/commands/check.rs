//! `rowbind check`: load every source and report configuration errors.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context};
use rowbind_engine::BuildError;
use rowbind_runtime::{LinkedModel, Loader, RuntimeError};

pub fn execute(manifest: &Path) -> anyhow::Result<()> {
    let loader = Loader::from_path(manifest)
        .with_context(|| format!("failed to read manifest at {}", manifest.display()))?;

    match loader.load() {
        Ok(model) => {
            print!("{}", summary(&model));
            Ok(())
        }
        Err(RuntimeError::Build(BuildError::Unresolved(fragments))) => {
            eprintln!("{} unresolved fragment(s):", fragments.len());
            for fragment in &fragments {
                eprintln!("  {}", fragment);
            }
            bail!("project at {} did not link", loader.base_dir().display())
        }
        Err(err) => Err(err).context("project did not link"),
    }
}

/// Counts of committed entities
pub fn summary(model: &LinkedModel) -> String {
    let config = &model.configuration;
    let mut out = String::new();
    let _ = writeln!(out, "Statements:  {}", config.statements().count());
    let _ = writeln!(out, "Result maps: {}", config.result_maps().count());
    let _ = writeln!(out, "Caches:      {}", config.caches().count());
    let _ = writeln!(out, "Mappers:     {}", model.mappers.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixture;
    use crate::commands::load_model;

    #[test]
    fn test_summary_counts() {
        let dir = fixture::project();
        let model = load_model(dir.path()).unwrap();
        let summary = summary(&model);
        assert!(summary.contains("Statements:  3"), "{}", summary);
        assert!(summary.contains("Caches:      1"), "{}", summary);
        assert!(summary.contains("Mappers:     1"), "{}", summary);
    }

    #[test]
    fn test_unresolved_project_fails() {
        let dir = fixture::project();
        fixture::write(
            dir.path(),
            "BlogMapper.xml",
            r#"<mapper namespace="demo.BlogMapper">
  <select id="findAll" resultMap="demo.Missing.map">select * from blog</select>
</mapper>"#,
        );
        assert!(execute(dir.path()).is_err());
    }

    #[test]
    fn test_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to read manifest"));
    }
}
