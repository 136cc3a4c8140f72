//! CLI command implementations

pub mod check;
pub mod inspect;
pub mod statements;

use std::path::Path;

use anyhow::Context;
use rowbind_runtime::{LinkedModel, Loader};

/// Load and link the project, attaching the manifest path to any failure
pub fn load_model(manifest: &Path) -> anyhow::Result<LinkedModel> {
    let loader = Loader::from_path(manifest)
        .with_context(|| format!("failed to read manifest at {}", manifest.display()))?;
    tracing::debug!(
        mappers = loader.manifest().mappers.len(),
        interfaces = loader.manifest().interfaces.len(),
        "loading project"
    );
    loader
        .load()
        .with_context(|| format!("failed to load project at {}", loader.base_dir().display()))
}

#[cfg(test)]
pub(crate) mod fixture {
    use std::path::Path;

    /// Small project: one class, one annotated interface, one XML mapper
    pub fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "rowbind.toml",
            r#"
types = ["types.xml"]
mappers = ["BlogMapper.xml"]

[aliases]
Blog = "demo.Blog"
"#,
        );
        write(
            dir.path(),
            "types.xml",
            r#"<types>
  <class name="demo.Blog">
    <constructor/>
    <property name="id" type="int"/>
    <property name="title" type="String"/>
    <property name="published" type="boolean"/>
  </class>
  <interface name="demo.BlogMapper">
    <method name="deleteBlog" returns="int">
      <param name="id" type="int"/>
      <Delete>delete from blog where id = #{id}</Delete>
    </method>
  </interface>
</types>"#,
        );
        write(
            dir.path(),
            "BlogMapper.xml",
            r#"<mapper namespace="demo.BlogMapper">
  <cache/>
  <resultMap id="blogMap" type="Blog">
    <id property="id" column="id"/>
  </resultMap>
  <select id="findAll" resultMap="blogMap">select * from blog</select>
  <select id="count" resultType="long">select count(*) from blog</select>
</mapper>"#,
        );
        dir
    }

    pub fn write(dir: &Path, relative: &str, content: &str) {
        std::fs::write(dir.join(relative), content).unwrap();
    }
}
