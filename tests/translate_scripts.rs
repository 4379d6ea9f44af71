use std::fs;

use vbscript_translator::asp;
use vbscript_translator::config::{TranslatorConfig, load_from_json};
use vbscript_translator::error::ErrorCategory;
use vbscript_translator::logger::CollectingLogger;
use vbscript_translator::model::OutputShape;
use vbscript_translator::{processor, translate, writer};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}")).expect("fixture exists")
}

fn lines_of(name: &str, config: &TranslatorConfig) -> (Vec<String>, Vec<String>) {
    let logger = CollectingLogger::default();
    let statements = translate(&fixture(name), config, &logger).expect("translates");
    let lines = statements
        .into_iter()
        .filter(|s| !s.is_blank())
        .map(|s| s.content)
        .collect();
    (lines, logger.messages())
}

fn assert_contains_all(lines: &[String], expected: &[&str]) {
    for line in expected {
        assert!(lines.iter().any(|l| l == line), "missing `{line}` in {lines:#?}");
    }
}

#[test]
fn translates_hello_world() {
    let (lines, warnings) = lines_of("hello.vbs", &TranslatorConfig::default());
    assert_eq!(
        lines,
        vec![
            "object name = null;",
            "object count = null;",
            "// Greets the user",
            "name = _.VAL(\"World\");",
            "count = _.VAL(_.ADD(1, _.MULT(2, 3)));",
            "_.CALL(_env.wscript, new[] { \"Echo\" }, _.ARGS(_.CONCAT(\"Hello \", name), count));",
        ]
    );
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn keeps_only_the_last_duplicate_function() {
    let (lines, warnings) = lines_of("functions.vbs", &TranslatorConfig::default());
    assert_eq!(lines.iter().filter(|l| l.starts_with("object @double(")).count(), 1);
    assert_contains_all(
        &lines,
        &[
            "object @double(object x)",
            "retVal1 = _.VAL(_.ADD(x, x));",
            "void increment(ref object value)",
            "total = _.VAL(@double(4));",
            "increment(ref total);",
            "increment(ref _.TEMPREF(_.ADD(total, 1)));",
        ],
    );
    assert!(!lines.iter().any(|l| l.contains("_.MULT(x, 2)")));
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn translates_classes() {
    let (lines, warnings) = lines_of("classes.vbs", &TranslatorConfig::default());
    assert_contains_all(
        &lines,
        &[
            "c = _.OBJ(new counter(_, _env, this));",
            "public class GlobalReferences",
            "private readonly GlobalReferences _outer;",
            "_.CALL(c, new[] { \"Add\" }, _.ARGS(5));",
            "_.CALL(_env.wscript, new[] { \"Echo\" }, _.ARGS(_.CALL(c, new[] { \"Count\" })));",
            "public class counter",
            "private object m_count = null;",
            "class_initialize();",
            "private void class_initialize()",
            "[TranslatedProperty(\"Count\")]",
            "public object get_count()",
            "public void add(object amount)",
            "m_count = _.VAL(_.ADD(m_count, amount));",
        ],
    );
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn warns_once_per_undeclared_variable() {
    let logger = CollectingLogger::default();
    let program = processor::run(&fixture("undeclared.vbs"), &TranslatorConfig::default(), &logger)
        .expect("translates");

    assert_eq!(program.warning_count, 2);
    let warnings = logger.messages();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("\"b\"") && warnings[0].contains("line 2"), "{warnings:?}");
    assert!(warnings[1].contains("\"c\"") && warnings[1].contains("line 3"), "{warnings:?}");

    let declarations: Vec<&str> = program.body.iter().take(3).map(|s| s.content.as_str()).collect();
    assert_eq!(
        declarations,
        vec![
            "object a = null;",
            "object b = null; // Undeclared variable",
            "object c = null; // Undeclared variable",
        ]
    );
}

#[test]
fn reports_error_categories() {
    let test_cases = vec![
        ("unsupported.vbs", ErrorCategory::Unsupported),
        ("unterminated_if.vbs", ErrorCategory::Structural),
    ];
    for (name, expected) in test_cases {
        let logger = CollectingLogger::default();
        let error = translate(&fixture(name), &TranslatorConfig::default(), &logger).unwrap_err();
        assert_eq!(error.category(), expected, "{name}: {error}");
    }

    let logger = CollectingLogger::default();
    let error = translate("x = \"open", &TranslatorConfig::default(), &logger).unwrap_err();
    assert_eq!(error.category(), ErrorCategory::Lexical);
}

#[test]
fn config_file_controls_culture_and_shape() {
    let config = load_from_json(&fixture("config.json")).expect("valid config");
    assert_eq!(config.output_shape, OutputShape::BodyOnly);

    let logger = CollectingLogger::default();
    let program = processor::run(&fixture("dates.vbs"), &config, &logger).expect("translates");
    assert_eq!(program.culture_dependent_dates, vec!["1/2/2020".to_string()]);
    assert_eq!(
        program.body[0].content,
        "_.VALIDATEDATELITERALS(new[] { \"1/2/2020\" });"
    );

    let mut out = Vec::new();
    writer::csharp::emit(&program, &config.indent, &mut out).expect("writes");
    let text = String::from_utf8(out).expect("utf-8");
    assert!(text.starts_with("_.VALIDATEDATELITERALS("), "{text}");
    assert!(text.contains("d = _.VAL(_.DATELITERAL(\"31/12/2020\"));\n"), "{text}");
    assert!(!text.contains("namespace"));
}

#[test]
fn translates_asp_pages() {
    let config = load_from_json(&fixture("config.json")).expect("valid config");
    let script = asp::to_script(&fixture("page.asp")).expect("converts");
    let logger = CollectingLogger::default();
    let statements = translate(&script, &config, &logger).expect("translates");
    let lines: Vec<String> = statements.into_iter().map(|s| s.content).collect();

    assert_contains_all(
        &lines,
        &[
            "object who = null;",
            "who = _.VAL(\"you\");",
            "_.CALL(_env.response, new[] { \"Write\" }, _.ARGS(who));",
        ],
    );
    assert!(logger.messages().is_empty(), "{:?}", logger.messages());
}
