//! Types handed from the processor to the writers.

use serde::{Deserialize, Serialize};

/// One emitted line of C#. Indentation is structural: writers repeat their
/// indent unit `indentation_depth` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedStatement {
    pub content: String,
    pub indentation_depth: usize,
}

impl TranslatedStatement {
    pub fn new(content: impl Into<String>, indentation_depth: usize) -> Self {
        Self {
            content: content.into(),
            indentation_depth,
        }
    }

    pub fn blank() -> Self {
        Self::new("", 0)
    }

    pub fn is_blank(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// Body wrapped in a runnable class with its environment references.
    #[default]
    FullProgram,
    /// Just the translated statements.
    BodyOnly,
}

/// Fully processed output handed to `writer`.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedProgram {
    /// Outermost statements, run by the generated `Go` method.
    pub body: Vec<TranslatedStatement>,
    /// Class definitions, depth relative to the class declaration.
    pub classes: Vec<TranslatedStatement>,
    /// Host globals the body refers to through `_env`.
    pub external_references: Vec<String>,
    pub output_shape: OutputShape,
    /// Date literals that can only be checked once the culture is known.
    pub culture_dependent_dates: Vec<String>,
    pub warning_count: usize,
}

impl TranslatedProgram {
    /// Body followed by the class definitions, as one statement sequence.
    pub fn statements(&self) -> Vec<TranslatedStatement> {
        let mut statements = self.body.clone();
        if !self.classes.is_empty() {
            if !statements.is_empty() {
                statements.push(TranslatedStatement::blank());
            }
            statements.extend(self.classes.iter().cloned());
        }
        statements
    }
}
