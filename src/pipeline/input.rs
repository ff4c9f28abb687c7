//! Input contract for raw scoring records
//!
//! An [`InputSchema`] lists the fields a record must carry and what values
//! each may take. The schema is supplied by the caller; [`InputSchema::credit`]
//! is the credit-scoring contract shipped with the tool.

use thiserror::Error;

use super::encoder::{split_tokens, DEFAULT_DATA_SEP};
use super::record::{FieldValue, RawRecord};

/// Upper bound for floating point fields of the credit contract
pub const FLOAT_FIELD_MAX: f64 = 1e7;

/// Upper bound for integer fields of the credit contract
pub const INT_FIELD_MAX: f64 = 1000.0;

const CREDIT_FIELDS: [&str; 22] = [
    "Age",
    "Occupation",
    "Annual_Income",
    "Monthly_Inhand_Salary",
    "Num_Bank_Accounts",
    "Num_Credit_Card",
    "Interest_Rate",
    "Num_of_Loan",
    "Type_of_Loan",
    "Delay_from_due_date",
    "Num_of_Delayed_Payment",
    "Changed_Credit_Limit",
    "Num_Credit_Inquiries",
    "Credit_Mix",
    "Outstanding_Debt",
    "Credit_Utilization_Ratio",
    "Credit_History_Age",
    "Payment_of_Min_Amount",
    "Total_EMI_per_month",
    "Amount_invested_monthly",
    "Payment_Behaviour",
    "Monthly_Balance",
];

const FLOAT_FIELDS: [&str; 8] = [
    "Annual_Income",
    "Monthly_Inhand_Salary",
    "Changed_Credit_Limit",
    "Outstanding_Debt",
    "Credit_Utilization_Ratio",
    "Total_EMI_per_month",
    "Amount_invested_monthly",
    "Monthly_Balance",
];

const OCCUPATIONS: [&str; 14] = [
    "Accountant",
    "Architect",
    "Developer",
    "Doctor",
    "Engineer",
    "HR_Manager",
    "Lawyer",
    "Manager",
    "Media_Manager",
    "Musician",
    "Others",
    "Scientist",
    "Teacher",
    "Writer",
];

const LOAN_TYPES: [&str; 10] = [
    "auto loan",
    "credit-builder loan",
    "debt consolidation loan",
    "home equity loan",
    "mortgage loan",
    "payday loan",
    "personal loan",
    "student loan",
    "not specified",
    "No Data",
];

const CREDIT_MIX: [&str; 3] = ["Bad", "Good", "Standard"];

const PAYMENT_OF_MIN_AMOUNT: [&str; 3] = ["NM", "No", "Yes"];

const PAYMENT_BEHAVIOUR: [&str; 6] = [
    "High_spent_Large_value_payments",
    "High_spent_Medium_value_payments",
    "High_spent_Small_value_payments",
    "Low_spent_Large_value_payments",
    "Low_spent_Medium_value_payments",
    "Low_spent_Small_value_payments",
];

/// Errors raised by input validation and coercion
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Record violates the input contract: {}", format_violations(.0))]
    Invalid(Vec<Violation>),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{field}' expects a number, got '{value}'")]
    NotANumber { field: String, value: String },
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single contract violation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("'{0}' is missing")]
    MissingField(String),

    #[error("'{field}' expects {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("'{field}' = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("'{field}' = {value} is not a whole number")]
    NotInteger { field: String, value: f64 },

    #[error("'{field}' has unknown value '{value}'")]
    UnknownCategory { field: String, value: String },
}

/// What a field may hold
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Float { min: f64, max: f64 },
    Integer { min: f64, max: f64 },
    Categorical(Vec<String>),
    /// Zero or more tokens from `vocabulary`, joined by `sep`
    MultiToken { vocabulary: Vec<String>, sep: char },
}

impl FieldKind {
    fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Float { .. } | FieldKind::Integer { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

/// Ordered set of field specifications
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
        });
        self
    }

    /// The credit-scoring contract: 22 raw features, five text vocabularies.
    pub fn credit() -> Self {
        let vocab = |values: &[&str]| values.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut schema = InputSchema::new();
        for name in CREDIT_FIELDS {
            let kind = match name {
                "Occupation" => FieldKind::Categorical(vocab(&OCCUPATIONS)),
                "Credit_Mix" => FieldKind::Categorical(vocab(&CREDIT_MIX)),
                "Payment_of_Min_Amount" => FieldKind::Categorical(vocab(&PAYMENT_OF_MIN_AMOUNT)),
                "Payment_Behaviour" => FieldKind::Categorical(vocab(&PAYMENT_BEHAVIOUR)),
                "Type_of_Loan" => FieldKind::MultiToken {
                    vocabulary: vocab(&LOAN_TYPES),
                    sep: DEFAULT_DATA_SEP,
                },
                _ if FLOAT_FIELDS.contains(&name) => FieldKind::Float {
                    min: 0.0,
                    max: FLOAT_FIELD_MAX,
                },
                _ => FieldKind::Integer {
                    min: 0.0,
                    max: INT_FIELD_MAX,
                },
            };
            schema = schema.with_field(name, kind);
        }
        schema
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Parse a raw string for `field` according to its kind.
    pub fn coerce(&self, field: &str, raw: &str) -> Result<FieldValue, InputError> {
        let spec = self
            .field(field)
            .ok_or_else(|| InputError::UnknownField(field.to_string()))?;

        if spec.kind.is_numeric() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Missing);
            }
            trimmed
                .parse::<f64>()
                .map(FieldValue::Number)
                .map_err(|_| InputError::NotANumber {
                    field: field.to_string(),
                    value: raw.to_string(),
                })
        } else {
            Ok(FieldValue::Text(raw.to_string()))
        }
    }

    /// Check `record` against every field; extra fields are tolerated.
    pub fn validate(&self, record: &RawRecord) -> Result<(), InputError> {
        let violations: Vec<Violation> = self
            .fields
            .iter()
            .filter_map(|spec| check_field(spec, record.get(&spec.name)))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(InputError::Invalid(violations))
        }
    }
}

fn check_field(spec: &FieldSpec, value: Option<&FieldValue>) -> Option<Violation> {
    let field = || spec.name.clone();

    let value = match value {
        None | Some(FieldValue::Missing) => {
            // Multi-token fields may legitimately carry zero tokens
            if matches!(spec.kind, FieldKind::MultiToken { .. }) {
                return None;
            }
            return Some(Violation::MissingField(field()));
        }
        Some(v) => v,
    };

    match (&spec.kind, value) {
        (FieldKind::Float { min, max }, FieldValue::Number(n)) => {
            check_range(field(), *n, *min, *max)
        }
        (FieldKind::Integer { min, max }, FieldValue::Number(n)) => {
            if n.fract() != 0.0 {
                return Some(Violation::NotInteger {
                    field: field(),
                    value: *n,
                });
            }
            check_range(field(), *n, *min, *max)
        }
        (FieldKind::Float { .. }, _) | (FieldKind::Integer { .. }, _) => Some(Violation::WrongType {
            field: field(),
            expected: "a number",
        }),
        (FieldKind::Categorical(values), FieldValue::Text(s)) => {
            if values.iter().any(|v| v == s) {
                None
            } else {
                Some(Violation::UnknownCategory {
                    field: field(),
                    value: s.clone(),
                })
            }
        }
        (FieldKind::MultiToken { vocabulary, sep }, FieldValue::Text(s)) => split_tokens(s, *sep)
            .find(|token| !vocabulary.iter().any(|v| v.as_str() == *token))
            .map(|token| Violation::UnknownCategory {
                field: field(),
                value: token.to_string(),
            }),
        (FieldKind::Categorical(_), _) | (FieldKind::MultiToken { .. }, _) => {
            Some(Violation::WrongType {
                field: field(),
                expected: "text",
            })
        }
    }
}

fn check_range(field: String, value: f64, min: f64, max: f64) -> Option<Violation> {
    if value.is_nan() || value < min || value > max {
        Some(Violation::OutOfRange {
            field,
            value,
            min,
            max,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_credit_record() -> RawRecord {
        let schema = InputSchema::credit();
        let mut record = RawRecord::new();
        for spec in schema.fields() {
            let value = match &spec.kind {
                FieldKind::Float { .. } => FieldValue::Number(1250.5),
                FieldKind::Integer { .. } => FieldValue::Number(3.0),
                FieldKind::Categorical(values) => FieldValue::Text(values[0].clone()),
                FieldKind::MultiToken { .. } => {
                    FieldValue::Text("auto loan,home equity loan".to_string())
                }
            };
            record.insert(spec.name.clone(), value);
        }
        record
    }

    #[test]
    fn test_credit_schema_shape() {
        let schema = InputSchema::credit();
        assert_eq!(schema.fields().len(), 22);
        assert_eq!(schema.field_names().next(), Some("Age"));
        assert!(matches!(
            schema.field("Type_of_Loan").unwrap().kind,
            FieldKind::MultiToken { .. }
        ));
        assert!(matches!(
            schema.field("Annual_Income").unwrap().kind,
            FieldKind::Float { .. }
        ));
        assert!(matches!(
            schema.field("Age").unwrap().kind,
            FieldKind::Integer { .. }
        ));
    }

    #[test]
    fn test_valid_record_passes() {
        let schema = InputSchema::credit();
        assert!(schema.validate(&valid_credit_record()).is_ok());
    }

    #[test]
    fn test_extra_fields_tolerated() {
        let schema = InputSchema::credit();
        let record = valid_credit_record().with("Customer_ID", FieldValue::Text("x".into()));
        assert!(schema.validate(&record).is_ok());
    }

    #[test]
    fn test_multi_token_may_be_empty() {
        let schema = InputSchema::credit();
        let mut record = valid_credit_record();
        record.insert("Type_of_Loan", FieldValue::Missing);
        assert!(schema.validate(&record).is_ok());
        record.insert("Type_of_Loan", FieldValue::Text(String::new()));
        assert!(schema.validate(&record).is_ok());
    }

    #[test]
    fn test_reports_every_violation() {
        let schema = InputSchema::credit();
        let mut record = valid_credit_record();
        record.insert("Age", FieldValue::Number(2000.0));
        record.insert("Num_Bank_Accounts", FieldValue::Number(2.5));
        record.insert("Credit_Mix", FieldValue::Text("Excellent".into()));
        record.insert("Type_of_Loan", FieldValue::Text("auto loan,boat loan".into()));
        record.insert("Monthly_Balance", FieldValue::Missing);

        match schema.validate(&record) {
            Err(InputError::Invalid(violations)) => {
                assert_eq!(violations.len(), 5);
                assert!(violations.contains(&Violation::UnknownCategory {
                    field: "Type_of_Loan".into(),
                    value: "boat loan".into(),
                }));
                assert!(violations.contains(&Violation::MissingField("Monthly_Balance".into())));
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type() {
        let schema = InputSchema::new().with_field("Age", FieldKind::Integer { min: 0.0, max: 10.0 });
        let record = RawRecord::new().with("Age", FieldValue::Text("old".into()));
        let err = schema.validate(&record).unwrap_err();
        assert!(err.to_string().contains("expects a number"));
    }

    #[test]
    fn test_coerce_by_kind() {
        let schema = InputSchema::credit();
        assert_eq!(
            schema.coerce("Age", "42").unwrap(),
            FieldValue::Number(42.0)
        );
        assert_eq!(schema.coerce("Age", " ").unwrap(), FieldValue::Missing);
        assert_eq!(
            schema.coerce("Occupation", "Lawyer").unwrap(),
            FieldValue::Text("Lawyer".into())
        );
        assert!(matches!(
            schema.coerce("Age", "forty"),
            Err(InputError::NotANumber { .. })
        ));
        assert!(matches!(
            schema.coerce("Nope", "1"),
            Err(InputError::UnknownField(_))
        ));
    }
}
