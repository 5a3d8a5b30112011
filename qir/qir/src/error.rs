use std::fmt::Debug;

use serde::Serialize;

/// A planning error. The IR itself never produces these; they come from the
/// passes that validate or narrow a tree.
#[derive(Debug, Clone)]
pub struct Error {
    /// Message kind. Currently only Error is produced.
    pub kind: MessageKind,
    pub reason: Reason,
    pub hints: Vec<String>,
    /// Machine readable identifier error code eg, "E0101"
    pub code: Option<&'static str>,
    /// Output field names leading from the root select to the offending node.
    pub path: Vec<String>,
}

/// Multiple planning errors.
#[derive(Debug, Clone)]
pub struct Errors(pub Vec<Error>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    Error,
    Warning,
    Lint,
}

#[derive(Debug, Clone)]
pub enum Reason {
    Simple(String),
    Expected {
        who: Option<String>,
        expected: String,
        found: String,
    },
    NotFound {
        name: String,
        namespace: String,
    },
    Unsupported {
        feature: String,
        backend: String,
    },
    Bug {
        details: Option<String>,
    },
}

impl Error {
    pub fn new(reason: Reason) -> Self {
        Error {
            kind: MessageKind::Error,
            reason,
            hints: Vec::new(),
            code: None,
            path: Vec::new(),
        }
    }

    pub fn new_simple<S: ToString>(reason: S) -> Self {
        Error::new(Reason::Simple(reason.to_string()))
    }

    /// Used for things that you *think* should never happen, but are not sure.
    pub fn new_assert<S: ToString>(details: S) -> Self {
        Error::new(Reason::Bug {
            details: Some(details.to_string()),
        })
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Simple(text) => f.write_str(text),
            Reason::Expected {
                who,
                expected,
                found,
            } => {
                if let Some(who) = who {
                    write!(f, "{who} ")?;
                }
                write!(f, "expected {expected}, but found {found}")
            }
            Reason::NotFound { name, namespace } => write!(f, "{namespace} `{name}` not found"),
            Reason::Unsupported { feature, backend } => {
                write!(f, "{feature} is not supported by the {backend} backend")
            }
            Reason::Bug { details } => {
                write!(f, "internal planner error")?;
                if let Some(details) = details {
                    write!(f, "; {details}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<Error> for Errors {
    fn from(error: Error) -> Self {
        Errors(vec![error])
    }
}

impl Errors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when no errors were collected.
    pub fn into_result(self) -> Result<(), Errors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for Errors {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.path.is_empty() {
            write!(f, "at {}: ", self.path.join("."))?;
        }
        write!(f, "{}", self.reason)?;
        for hint in &self.hints {
            write!(f, "\nhint: {hint}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

pub trait WithErrorInfo: Sized {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self;

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self;

    fn with_code(self, code: &'static str) -> Self;

    /// Prepends a field name to the error path. Called on the way out of a
    /// recursive pass, so the final path reads root-first.
    fn with_path_prefix<S: Into<String>>(self, segment: S) -> Self;
}

impl WithErrorInfo for Error {
    fn push_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hints.push(hint.into());
        self
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(mut self, hints: I) -> Self {
        self.hints = hints.into_iter().map(|x| x.into()).collect();
        self
    }

    fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    fn with_path_prefix<S: Into<String>>(mut self, segment: S) -> Self {
        self.path.insert(0, segment.into());
        self
    }
}

impl WithErrorInfo for Errors {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self {
        let hint = hint.into();
        Errors(
            self.0
                .into_iter()
                .map(|e| e.push_hint(hint.clone()))
                .collect(),
        )
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self {
        let hints: Vec<String> = hints.into_iter().map(|x| x.into()).collect();
        Errors(
            self.0
                .into_iter()
                .map(|e| e.with_hints(hints.clone()))
                .collect(),
        )
    }

    fn with_code(self, code: &'static str) -> Self {
        Errors(self.0.into_iter().map(|e| e.with_code(code)).collect())
    }

    fn with_path_prefix<S: Into<String>>(self, segment: S) -> Self {
        let segment = segment.into();
        Errors(
            self.0
                .into_iter()
                .map(|e| e.with_path_prefix(segment.clone()))
                .collect(),
        )
    }
}

impl<T, E: WithErrorInfo> WithErrorInfo for Result<T, E> {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self {
        self.map_err(|e| e.push_hint(hint))
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self {
        self.map_err(|e| e.with_hints(hints))
    }

    fn with_code(self, code: &'static str) -> Self {
        self.map_err(|e| e.with_code(code))
    }

    fn with_path_prefix<S: Into<String>>(self, segment: S) -> Self {
        self.map_err(|e| e.with_path_prefix(segment))
    }
}

#[cfg(test)]
mod test {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::new(Reason::NotFound {
            name: "x-hasura-user-id".to_string(),
            namespace: "session variable".to_string(),
        })
        .with_path_prefix("author")
        .with_path_prefix("articles")
        .push_hint("session variables are matched case-insensitively");

        assert_snapshot!(error, @r"
        at articles.author: session variable `x-hasura-user-id` not found
        hint: session variables are matched case-insensitively
        ");
    }

    #[test]
    fn test_errors_into_result() {
        assert!(Errors(vec![]).into_result().is_ok());

        let errors = Errors::from(Error::new_simple("a")).with_code("E0001");
        assert_eq!(errors.0[0].code, Some("E0001"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_bug_display() {
        let error = Error::new_assert("parameter 2 bound twice");
        assert_snapshot!(error, @"internal planner error; parameter 2 bound twice");

        let error = Error::new(Reason::Bug { details: None });
        assert_snapshot!(error, @"internal planner error");
    }
}
