//! Best-effort document classification.
//!
//! An ordered table of [`Rule`]s is evaluated against the parsed root
//! element; the first rule whose predicate matches supplies the document
//! type and runs its extractor. No match leaves every field unset.
//! Classification is metadata only and never affects validity.
//!
//! Root and field names are compared on their local name, case-insensitively,
//! with `_` and `-` ignored, so `financial_statement`, `FinancialStatement`
//! and `fin:financial-statement` all match the same rule.

use crate::xml::XmlElement;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub document_type: Option<String>,
    pub period: Option<String>,
    pub company: Option<String>,
}

pub struct Rule {
    pub document_type: &'static str,
    pub matches: fn(&XmlElement) -> bool,
    pub extract: fn(&XmlElement) -> Classification,
}

const PERIOD_FIELDS: &[&str] = &["period", "reportingperiod", "fiscalperiod"];
const COMPANY_FIELDS: &[&str] = &["company", "companyname", "entity"];

/// Evaluated in order; first match wins.
pub const RULES: &[Rule] = &[
    Rule {
        document_type: "financial_statement",
        matches: is_financial_statement,
        extract: extract_period_and_company,
    },
    Rule {
        document_type: "expense_report",
        matches: is_expense_report,
        extract: extract_period_and_company,
    },
    Rule {
        document_type: "generic",
        matches: is_generic_record,
        extract: extract_nothing,
    },
];

pub fn classify(root: &XmlElement) -> Classification {
    classify_with(RULES, root)
}

pub fn classify_with(rules: &[Rule], root: &XmlElement) -> Classification {
    rules
        .iter()
        .find(|rule| (rule.matches)(root))
        .map(|rule| Classification {
            document_type: Some(rule.document_type.to_string()),
            ..(rule.extract)(root)
        })
        .unwrap_or_default()
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn root_is_one_of(root: &XmlElement, names: &[&str]) -> bool {
    let root_name = normalize(&root.local_name);
    names.iter().any(|n| *n == root_name)
}

fn is_financial_statement(root: &XmlElement) -> bool {
    root_is_one_of(
        root,
        &[
            "financialstatement",
            "balancesheet",
            "incomestatement",
            "profitandloss",
        ],
    )
}

fn is_expense_report(root: &XmlElement) -> bool {
    root_is_one_of(root, &["expensereport"])
}

fn is_generic_record(root: &XmlElement) -> bool {
    root_is_one_of(
        root,
        &[
            "invoice",
            "ledger",
            "generalledger",
            "journal",
            "transactions",
            "document",
        ],
    )
}

/// First non-empty direct child whose name is in `fields`, falling back to
/// an attribute of the root with the same name.
fn field(root: &XmlElement, fields: &[&str]) -> Option<String> {
    let from_child = root
        .children
        .iter()
        .filter(|child| fields.contains(&normalize(&child.local_name).as_str()))
        .map(|child| child.text.trim())
        .find(|text| !text.is_empty());

    from_child
        .or_else(|| {
            root.attributes
                .iter()
                .filter(|(key, _)| fields.contains(&normalize(key).as_str()))
                .map(|(_, value)| value.trim())
                .find(|value| !value.is_empty())
        })
        .map(str::to_string)
}

fn extract_period_and_company(root: &XmlElement) -> Classification {
    Classification {
        document_type: None,
        period: field(root, PERIOD_FIELDS),
        company: field(root, COMPANY_FIELDS),
    }
}

fn extract_nothing(_root: &XmlElement) -> Classification {
    Classification::default()
}
