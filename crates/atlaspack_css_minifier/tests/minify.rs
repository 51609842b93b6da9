use atlaspack_css_minifier::{minify, MinifyOptions, OptionsBuilder};
use pretty_assertions::assert_eq;

fn level_two() -> MinifyOptions {
  OptionsBuilder::new().level(2).build()
}

#[test]
fn minifies_a_simple_rule() {
  let output = minify("a{ color: #f00;  }", &MinifyOptions::default());

  assert_eq!(output.styles, "a{color:red}");
  assert!(output.warnings.is_empty());
  assert!(output.errors.is_empty());
}

#[test]
fn merges_adjacent_media_blocks() {
  let output = minify(
    "@media screen{a{color:red}}@media screen{div{display:block}}",
    &level_two(),
  );

  assert_eq!(output.styles, "@media screen{a{color:red}div{display:block}}");
}

#[test]
fn merges_media_blocks_past_unrelated_rules() {
  let output = minify(
    "@media screen{a{color:red}}div{color:blue}@media screen{div{display:block}}",
    &level_two(),
  );

  assert_eq!(
    output.styles,
    "@media screen{a{color:red}div{display:block}}div{color:blue}"
  );
}

#[test]
fn keeps_media_blocks_apart_when_the_cascade_would_change() {
  let css = "@media screen{a{color:red}}div{color:blue}@media screen{div{color:green}}";
  let output = minify(css, &level_two());

  assert_eq!(output.styles, css);
}

#[test]
fn compacts_longhands_into_a_shorthand() {
  let output = minify(
    "a{margin-top:0px;margin-right:1px;margin-bottom:2px;margin-left:3px}",
    &level_two(),
  );

  assert_eq!(output.styles, "a{margin:0 1px 2px 3px}");
}

#[test]
fn compacts_four_equal_border_sides() {
  let output = minify(
    "a{border-top:1px solid #f00;border-right:1px solid #f00;border-bottom:1px solid #f00;border-left:1px solid #f00}",
    &level_two(),
  );

  assert_eq!(output.styles, "a{border:1px solid red}");
}

#[test]
fn old_browsers_keep_longhands() {
  let css = "a{margin-top:0;margin-right:0;margin-bottom:0;margin-left:0}";
  let options = OptionsBuilder::new().level(2).compatibility("ie8").build();

  assert_eq!(minify(css, &options).styles, css);
}

#[test]
fn joins_rules_with_identical_bodies() {
  let output = minify("a{color:red}b{color:red}", &level_two());

  assert_eq!(output.styles, "a,b{color:red}");
}

#[test]
fn minifying_twice_changes_nothing() {
  let css = r#"
    @charset "utf-8";
    /*! license */
    .nav > li , .nav>li   { margin : 0px auto ; color : #FFFFFF }
    .nav li a { background : url( "img/bg.png" ) no-repeat ; font-weight : bold }
    @media screen and ( max-width : 600px ) {
      .nav { display : none }
    }
    @media screen and ( max-width : 600px ) {
      .menu { display : block }
    }
    .button { padding-top : 1px ; padding-right : 2px ; padding-bottom : 1px ; padding-left : 2px }
  "#;

  for options in [MinifyOptions::default(), level_two()] {
    let once = minify(css, &options);
    let twice = minify(&once.styles, &options);

    assert_eq!(twice.styles, once.styles);
  }
}

#[test]
fn keeps_protected_content_verbatim() {
  let output = minify(
    r#"a{content:"  {  }  ;  "}b{background:url( "img/a b.png" )}c{width:expression(document.body.clientWidth > 800 ? "800px" : "auto")}"#,
    &MinifyOptions::default(),
  );

  assert_eq!(
    output.styles,
    r#"a{content:"  {  }  ;  "}b{background:url("img/a b.png")}c{width:expression(document.body.clientWidth > 800 ? "800px" : "auto")}"#
  );
}

#[test]
fn keeps_placeholder_shaped_text_verbatim() {
  let css = r#"a{b:url(x)}.__ESCAPED_URL_0__{content:"__ESCAPED_FREE_TEXT_0__"}"#;

  for options in [MinifyOptions::default(), level_two()] {
    assert_eq!(minify(css, &options).styles, css);
  }
}

#[test]
fn unquotes_urls_that_do_not_need_quotes() {
  let output = minify("a{background:url( 'img/a.png' )}", &MinifyOptions::default());

  assert_eq!(output.styles, "a{background:url(img/a.png)}");
}

#[test]
fn special_comment_policies() {
  let css = "/*! one */a{color:red}/*! two */b{top:0}/* plain */";

  let all = minify(css, &MinifyOptions::default());
  assert_eq!(all.styles, "/*! one */a{color:red}/*! two */b{top:0}");

  let first = OptionsBuilder::new().special_comments("1").build();
  assert_eq!(minify(css, &first).styles, "/*! one */a{color:red}b{top:0}");

  let none = OptionsBuilder::new().special_comments("0").build();
  assert_eq!(minify(css, &none).styles, "a{color:red}b{top:0}");
}

#[test]
fn warns_about_an_unterminated_comment() {
  let output = minify("a{color:red}/* never closed", &MinifyOptions::default());

  assert!(output.styles.starts_with("a{color:red}"));
  assert!(output
    .warnings
    .iter()
    .any(|warning| warning.starts_with("Broken comment")));
}

#[test]
fn drops_empty_properties_with_a_warning() {
  let output = minify("a{color:;top:0}", &MinifyOptions::default());

  assert_eq!(output.styles, "a{top:0}");
  assert_eq!(output.warnings.len(), 1);
  assert!(output.warnings[0].starts_with("Empty property 'color'"));
}

#[test]
fn beautifies_output() {
  let options = OptionsBuilder::new().format("beautify").build();
  let output = minify("a>b{color:red;margin:0}@media print{p{display:none}}", &options);

  assert_eq!(
    output.styles,
    "a > b {\n  color: red;\n  margin: 0\n}\n@media print {\n  p {\n    display: none\n  }\n}"
  );
}

#[test]
fn keeps_breaks_between_rules() {
  let options = OptionsBuilder::new().keep_breaks(true).build();
  let output = minify("a{color:red}\n\nb{ top:0 }", &options);

  assert_eq!(output.styles, "a{color:red}\nb{top:0}");
}

#[test]
fn reads_json_configuration() {
  let options = OptionsBuilder::from_json(r#"{"level": 2, "format": "keep-breaks"}"#)
    .unwrap()
    .build();
  let output = minify("a{color:red}b{color:red}c{top:0}", &options);

  assert_eq!(output.styles, "a,b{color:red}\nc{top:0}");
  assert!(output.warnings.is_empty());
}

#[test]
fn never_fails_on_malformed_input() {
  for css in [
    "a{color:red",
    "}}}a{color:red}",
    "a{content:\"unterminated}",
    "a{background:url(x.png}",
    "@media screen{",
    "{color:red}",
    ";;;",
    "a:not(\u{e9}{color:red}b{color:red}",
    "a:nth-child(\u{e9}\u{e9},b{top:0}c{top:0}",
  ] {
    let output = minify(css, &level_two());
    assert!(output.errors.is_empty(), "{css}");
  }
}
