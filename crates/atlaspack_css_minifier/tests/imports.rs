use std::fs;
use std::path::Path;

use atlaspack_css_minifier::{minify, MinifyOptions, OptionsBuilder};
use pretty_assertions::assert_eq;

fn write(root: &Path, name: &str, contents: &str) {
  let path = root.join(name);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, contents).unwrap();
}

fn inlining(root: &Path) -> MinifyOptions {
  OptionsBuilder::new()
    .inline_imports(true)
    .rebase_urls(true)
    .root(root)
    .build()
}

#[test]
fn inlines_local_imports_and_rebases_their_urls() {
  let dir = tempfile::tempdir().unwrap();
  write(
    dir.path(),
    "components/button.css",
    ".button{background:url(icon.png)}",
  );

  let output = minify(
    "@import url(components/button.css);\n.page{margin:0}",
    &inlining(dir.path()),
  );

  assert_eq!(
    output.styles,
    ".button{background:url(components/icon.png)}.page{margin:0}"
  );
  assert!(output.warnings.is_empty());
}

#[test]
fn wraps_media_qualified_imports() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "print.css", ".nav{display:none}");

  let output = minify("@import \"print.css\" print;a{color:red}", &inlining(dir.path()));

  assert_eq!(output.styles, "@media print{.nav{display:none}}a{color:red}");
}

#[test]
fn inlines_nested_imports_relative_to_each_file() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "a/first.css", "@import \"../b/second.css\";.first{top:0}");
  write(dir.path(), "b/second.css", ".second{top:1px}");

  let output = minify("@import \"a/first.css\";", &inlining(dir.path()));

  assert_eq!(output.styles, ".second{top:1px}.first{top:0}");
}

#[test]
fn drops_missing_imports_with_a_warning() {
  let dir = tempfile::tempdir().unwrap();

  let output = minify("@import \"missing.css\";a{color:red}", &inlining(dir.path()));

  assert_eq!(output.styles, "a{color:red}");
  assert_eq!(output.warnings.len(), 1);
  assert!(output.warnings[0].starts_with("Ignoring local @import of"));
  assert!(output.warnings[0].ends_with("as resource is missing"));
}

#[test]
fn stops_at_circular_imports() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "a.css", "@import \"b.css\";.a{color:red}");
  write(dir.path(), "b.css", "@import \"a.css\";.b{color:blue}");

  let output = minify("@import \"a.css\";", &inlining(dir.path()));

  assert_eq!(output.styles, ".b{color:blue}.a{color:red}");
  assert_eq!(output.warnings.len(), 1);
  assert!(output.warnings[0].ends_with("as it has already been imported"));
}

#[test]
fn keeps_remote_imports_first() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "local.css", ".local{top:0}");

  let output = minify(
    "@import \"local.css\";@import url(https://cdn.example.com/reset.css);a{color:red}",
    &inlining(dir.path()),
  );

  assert_eq!(
    output.styles,
    "@import url(https://cdn.example.com/reset.css);.local{top:0}a{color:red}"
  );
}

#[test]
fn leaves_imports_alone_when_inlining_is_off() {
  let output = minify("@import url(a.css);a{color:red}", &MinifyOptions::default());

  assert_eq!(output.styles, "@import url(a.css);a{color:red}");
}

#[test]
fn maps_inlined_content_to_its_own_file() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "components/button.css", ".button{top:0}");

  let options = OptionsBuilder::new()
    .inline_imports(true)
    .root(dir.path())
    .source(dir.path().join("site.css"))
    .source_map(true)
    .build();
  let output = minify("@import \"components/button.css\";\n.page{top:1px}", &options);
  let map = output.source_map.unwrap();

  assert_eq!(output.styles, ".button{top:0}.page{top:1px}");

  let mut sources = map.sources();
  sources.sort();
  assert_eq!(
    sources,
    vec!["components/button.css".to_string(), "site.css".to_string()]
  );

  let page = map
    .mappings()
    .into_iter()
    .find(|mapping| mapping.generated_column == 15)
    .unwrap();
  assert_eq!((page.original_line, page.original_column), (2, 1));
  assert_eq!(page.source.as_deref(), Some("site.css"));
}
