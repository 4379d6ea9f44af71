//! Lay translated statements out as C# source.

use crate::model::{OutputShape, TranslatedProgram, TranslatedStatement};
use crate::processor::translator::names;
use std::io::{self, Write};

pub fn emit(program: &TranslatedProgram, indent: &str, out: &mut impl Write) -> io::Result<()> {
    match program.output_shape {
        OutputShape::BodyOnly => statements(out, indent, &program.statements(), 0),
        OutputShape::FullProgram => full_program(program, indent, out),
    }
}

fn statements(
    out: &mut impl Write,
    indent: &str,
    statements: &[TranslatedStatement],
    base_depth: usize,
) -> io::Result<()> {
    for statement in statements {
        if statement.is_blank() {
            writeln!(out)?;
        } else {
            let depth = base_depth + statement.indentation_depth;
            writeln!(out, "{}{}", indent.repeat(depth), statement.content)?;
        }
    }
    Ok(())
}

fn full_program(program: &TranslatedProgram, indent: &str, out: &mut impl Write) -> io::Result<()> {
    let i1 = indent;
    let i2 = indent.repeat(2);

    writeln!(out, "using System;")?;
    writeln!(out, "using CSharpSupport;")?;
    writeln!(out, "using CSharpSupport.Attributes;")?;
    writeln!(out)?;
    writeln!(out, "namespace TranslatedProgram")?;
    writeln!(out, "{{")?;

    // ---------------------------------------------------------------
    // 1. Runner wrapping the outermost statements
    // ---------------------------------------------------------------
    writeln!(out, "{i1}public class Runner")?;
    writeln!(out, "{i1}{{")?;
    writeln!(
        out,
        "{i2}public void Go(IProvideVBScriptCompatFunctionality _, EnvironmentReferences _env)"
    )?;
    writeln!(out, "{i2}{{")?;
    statements(out, indent, &program.body, 3)?;
    writeln!(out, "{i2}}}")?;
    writeln!(out, "{i1}}}")?;

    // ---------------------------------------------------------------
    // 2. Classes defined by the script
    // ---------------------------------------------------------------
    if !program.classes.is_empty() {
        writeln!(out)?;
        statements(out, indent, &program.classes, 1)?;
    }

    // ---------------------------------------------------------------
    // 3. Host-provided globals
    // ---------------------------------------------------------------
    writeln!(out)?;
    writeln!(out, "{i1}public class EnvironmentReferences")?;
    writeln!(out, "{i1}{{")?;
    for reference in &program.external_references {
        writeln!(out, "{i2}public object {} {{ get; set; }}", names::rewrite(reference))?;
    }
    writeln!(out, "{i1}}}")?;
    writeln!(out, "}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(output_shape: OutputShape) -> TranslatedProgram {
        TranslatedProgram {
            body: vec![
                TranslatedStatement::new("if (_.IF(a))", 0),
                TranslatedStatement::new("{", 0),
                TranslatedStatement::new("_.RANDOMIZE();", 1),
                TranslatedStatement::new("}", 0),
            ],
            classes: vec![],
            external_references: vec!["WScript".to_string()],
            output_shape,
            culture_dependent_dates: vec![],
            warning_count: 0,
        }
    }

    fn render(program: &TranslatedProgram, indent: &str) -> String {
        let mut out = Vec::new();
        emit(program, indent, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_body_only() {
        let text = render(&program(OutputShape::BodyOnly), "\t");
        assert_eq!(text, "if (_.IF(a))\n{\n\t_.RANDOMIZE();\n}\n");
    }

    #[test]
    fn test_full_program() {
        let text = render(&program(OutputShape::FullProgram), "  ");
        assert!(text.starts_with("using System;\n"));
        assert!(text.contains(
            "    public void Go(IProvideVBScriptCompatFunctionality _, EnvironmentReferences _env)\n"
        ));
        assert!(text.contains("\n        _.RANDOMIZE();\n"), "{text}");
        assert!(text.contains("    public object wscript { get; set; }\n"), "{text}");
        assert!(text.ends_with("}\n"));
    }
}
