use serde::Serialize;

/// Diagnostic severity, decided per rule rather than per occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
}

/// The closed set of diagnostic rules the front end can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    ExpectedCommand,
    UnknownCommand,
    ExpectedIdentifier,
    ExpectedExpression,
    ExpectedOperand,
    ExpectedOperator,
    UnbalancedParens,
    UnclosedString,
    MixedIndentation,
    IndentationTooDeep,
    InvalidInitialCommand,
    NotEnoughMultiReplaceOptions,
    EmptyMultiReplace,
    ReservedVariablePrefix,
    ExpectedChoiceOption,
    DuplicateUniqueCommand,
    UnscannableLine,
    DeadTextAfterCommand,
}

impl Rule {
    pub fn id(self) -> &'static str {
        match self {
            Rule::ExpectedCommand => "expected-command",
            Rule::UnknownCommand => "unknown-command",
            Rule::ExpectedIdentifier => "expected-identifier",
            Rule::ExpectedExpression => "expected-expression",
            Rule::ExpectedOperand => "expected-operand",
            Rule::ExpectedOperator => "expected-operator",
            Rule::UnbalancedParens => "unbalanced-parens",
            Rule::UnclosedString => "unclosed-string",
            Rule::MixedIndentation => "mixed-indentation",
            Rule::IndentationTooDeep => "indentation-too-deep",
            Rule::InvalidInitialCommand => "invalid-initial-command",
            Rule::NotEnoughMultiReplaceOptions => "not-enough-multireplace-options",
            Rule::EmptyMultiReplace => "empty-multireplace",
            Rule::ReservedVariablePrefix => "reserved-variable-prefix",
            Rule::ExpectedChoiceOption => "expected-choice-option",
            Rule::DuplicateUniqueCommand => "duplicate-unique-command",
            Rule::UnscannableLine => "unscannable-line",
            Rule::DeadTextAfterCommand => "dead-text-after-command",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Rule::ReservedVariablePrefix
            | Rule::DeadTextAfterCommand
            | Rule::DuplicateUniqueCommand => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Rule::ExpectedCommand => "expected a command after '*'",
            Rule::UnknownCommand => "unknown command",
            Rule::ExpectedIdentifier => "expected an identifier",
            Rule::ExpectedExpression => "expected an expression",
            Rule::ExpectedOperand => "expected an operand",
            Rule::ExpectedOperator => "expected an operator",
            Rule::UnbalancedParens => "unbalanced brackets",
            Rule::UnclosedString => "string is never closed",
            Rule::MixedIndentation => "tabs and spaces are mixed in indentation",
            Rule::IndentationTooDeep => "line is indented too far",
            Rule::InvalidInitialCommand => {
                "this command is only allowed at the top of startup.txt"
            }
            Rule::NotEnoughMultiReplaceOptions => {
                "multireplace needs at least two options"
            }
            Rule::EmptyMultiReplace => "multireplace is empty",
            Rule::ReservedVariablePrefix => "variable names beginning with 'choice_' are reserved",
            Rule::ExpectedChoiceOption => "expected at least one '#' option",
            Rule::DuplicateUniqueCommand => "this command may only appear once",
            Rule::UnscannableLine => "line could not be scanned",
            Rule::DeadTextAfterCommand => "unexpected text after command",
        }
    }
}

/// A diagnostic attached to a node. Offset/length normally mirror the node
/// range but may point at the next unconsumed token instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub rule: Rule,
    pub severity: Severity,
    pub message: String,
    pub offset: usize,
    pub length: usize,
}

impl Issue {
    pub fn new(rule: Rule, offset: usize, length: usize) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            message: rule.message().to_string(),
            offset,
            length,
        }
    }

    pub fn with_message(rule: Rule, message: impl Into<String>, offset: usize, length: usize) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            message: message.into(),
            offset,
            length,
        }
    }
}

/// The serializable shape diagnostics cross the tooling boundary in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub rule: &'static str,
    pub severity: Severity,
    pub offset: usize,
    pub length: usize,
    pub message: String,
}

impl From<&Issue> for Diagnostic {
    fn from(issue: &Issue) -> Self {
        Self {
            rule: issue.rule.id(),
            severity: issue.severity,
            offset: issue.offset,
            length: issue.length,
            message: issue.message.clone(),
        }
    }
}
