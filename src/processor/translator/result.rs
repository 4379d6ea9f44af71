use crate::model::TranslatedStatement;
use crate::processor::token::Token;

use super::names;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// A local of a function or of the outermost program.
    Local,
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredVariable {
    pub name: String,
    pub is_array: bool,
    pub visibility: Visibility,
}

impl DeclaredVariable {
    fn declaration(&self) -> String {
        let default = if self.is_array { "new object[0]" } else { "null" };
        match self.visibility {
            Visibility::Local => format!("object {} = {default};", self.name),
            Visibility::Public => format!("public object {} = {default};", self.name),
            Visibility::Private => format!("private object {} = {default};", self.name),
        }
    }
}

/// Output of one scope while it is being translated: emitted statements
/// plus everything that still has to be declared when the scope is
/// flushed. Undeclared references and deferred date literals are merged
/// upwards until they reach the outermost scope.
#[derive(Debug, Default)]
pub struct TranslationResult {
    pub statements: Vec<TranslatedStatement>,
    explicit_variables: Vec<DeclaredVariable>,
    undeclared_variables: Vec<Token>,
    culture_dependent_dates: Vec<String>,
}

impl TranslationResult {
    pub fn add(&mut self, content: impl Into<String>, depth: usize) {
        self.statements.push(TranslatedStatement::new(content, depth));
    }

    pub fn add_blank(&mut self) {
        self.statements.push(TranslatedStatement::blank());
    }

    pub fn extend(&mut self, statements: Vec<TranslatedStatement>) {
        self.statements.extend(statements);
    }

    /// Register an explicit declaration; repeats are folded into the first.
    pub fn declare(&mut self, variable: DeclaredVariable) {
        match self.explicit_variables.iter_mut().find(|v| v.name == variable.name) {
            Some(existing) => existing.is_array |= variable.is_array,
            None => self.explicit_variables.push(variable),
        }
    }

    pub fn record_undeclared(&mut self, token: &Token) {
        let key = names::key(token);
        if !self
            .undeclared_variables
            .iter()
            .any(|t| names::key(t) == key)
        {
            self.undeclared_variables.push(token.clone());
        }
    }

    pub fn record_culture_dependent_date(&mut self, literal: &str) {
        if !self.culture_dependent_dates.iter().any(|d| d == literal) {
            self.culture_dependent_dates.push(literal.to_string());
        }
    }

    pub fn undeclared_variables(&self) -> &[Token] {
        &self.undeclared_variables
    }

    pub fn culture_dependent_dates(&self) -> &[String] {
        &self.culture_dependent_dates
    }

    /// Move what a nested scope could not settle itself into this one.
    pub fn absorb_pending(&mut self, child: &TranslationResult) {
        for token in &child.undeclared_variables {
            self.record_undeclared(token);
        }
        for literal in &child.culture_dependent_dates {
            self.record_culture_dependent_date(literal);
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.explicit_variables.iter().any(|v| v.name == name)
    }

    /// Explicit declarations, in encounter order, at `depth`.
    pub fn flush_explicit(&self, depth: usize) -> Vec<TranslatedStatement> {
        self.explicit_variables
            .iter()
            .map(|v| TranslatedStatement::new(v.declaration(), depth))
            .collect()
    }

    /// Auto-declarations for names never declared anywhere; explicitly
    /// declared names are skipped.
    pub fn flush_undeclared(&self, depth: usize, visibility: Visibility) -> Vec<TranslatedStatement> {
        self.undeclared_variables
            .iter()
            .map(|t| names::rewrite_token(t))
            .filter(|name| !self.is_declared(name))
            .map(|name| {
                let variable = DeclaredVariable {
                    name,
                    is_array: false,
                    visibility,
                };
                TranslatedStatement::new(
                    format!("{} // Undeclared variable", variable.declaration()),
                    depth,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_groups_and_dedupes() {
        let mut result = TranslationResult::default();
        result.declare(DeclaredVariable {
            name: "a".to_string(),
            is_array: false,
            visibility: Visibility::Local,
        });
        result.declare(DeclaredVariable {
            name: "a".to_string(),
            is_array: true,
            visibility: Visibility::Local,
        });
        result.record_undeclared(&Token::atom("b", 3));
        result.record_undeclared(&Token::atom("B", 4));

        let explicit: Vec<String> = result.flush_explicit(1).into_iter().map(|s| s.content).collect();
        assert_eq!(explicit, vec!["object a = new object[0];"]);

        let undeclared = result.flush_undeclared(0, Visibility::Local);
        assert_eq!(undeclared.len(), 1);
        assert_eq!(undeclared[0].content, "object b = null; // Undeclared variable");
        assert_eq!(
            result.flush_undeclared(1, Visibility::Public)[0].content,
            "public object b = null; // Undeclared variable"
        );
        assert_eq!(result.undeclared_variables()[0].line_number(), 4);
    }
}
