//! Rule-based question answering over a store snapshot.
//!
//! A question is lower-cased and checked against `RULES` in order; the first
//! rule with any trigger appearing as a substring decides the intent. Rule order
//! is part of the behavior: "average of the total value" is a total-value question.

use log::debug;

use crate::data::{GrantCollection, StoreState};
use crate::format::{format_currency_full, Usd};
use crate::metrics;

pub const GREETING: &str = "Hello! I'm the First Doge Agent ($FDA) chatbot. How can I help you today? \
You can ask me about grant data like \"What's the highest grant?\" or \"How much total savings?\"";

pub const NOT_AVAILABLE: &str =
    "The grant data is not available yet. Please try again once it has finished loading.";

pub const NO_GRANTS: &str = "There are no grants in the current dataset.";

pub const IDENTITY: &str = "The First Doge Agent ($FDA) is the official tokenized representative \
of the DOGE initiative, created to enhance transparency and efficiency in government grant management.";

pub const FALLBACK: &str = "I'm the First Doge Agent ($FDA) chatbot. I can answer questions about \
the DOGE grants data. Try asking about highest grants, total values, savings, or specific agencies.";

/// The category a question is classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    HighestGrant,
    TotalSavings,
    TotalValue,
    AverageValue,
    Recipients,
    Agencies,
    Identity,
    Fallback,
}

struct Rule {
    triggers: &'static [&'static str],
    intent: Intent,
}

/// Evaluated top to bottom; first match wins
const RULES: &[Rule] = &[
    Rule {
        triggers: &["highest grant", "largest grant"],
        intent: Intent::HighestGrant,
    },
    Rule {
        triggers: &["total savings", "how much saved"],
        intent: Intent::TotalSavings,
    },
    Rule {
        triggers: &["total grants", "total value"],
        intent: Intent::TotalValue,
    },
    Rule {
        triggers: &["average", "mean"],
        intent: Intent::AverageValue,
    },
    Rule {
        triggers: &["recipient", "who received"],
        intent: Intent::Recipients,
    },
    Rule {
        triggers: &["agency", "department"],
        intent: Intent::Agencies,
    },
    Rule {
        triggers: &["fda", "first doge agent"],
        intent: Intent::Identity,
    },
];

/// Classify a question by the first rule it triggers
pub fn classify(text: &str) -> Intent {
    let normalized = text.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| normalized.contains(*t)))
        .map_or(Intent::Fallback, |rule| rule.intent)
}

/// Answer a question against a snapshot. Never fails; unknown questions get `FALLBACK`.
pub fn resolve(text: &str, snapshot: &StoreState) -> String {
    let Some(collection) = snapshot.collection() else {
        return NOT_AVAILABLE.to_string();
    };
    let intent = classify(text);
    debug!("Classified {text:?} as {intent:?}");
    answer(intent, collection)
}

fn answer(intent: Intent, grants: &GrantCollection) -> String {
    match intent {
        Intent::HighestGrant => match metrics::max_by_value(grants) {
            Some(top) => format!(
                "The highest value grant is {} awarded to {} by {} on {}.",
                format_currency_full(Usd::from_dollars(top.value)),
                top.recipient,
                top.agency,
                top.date
            ),
            None => NO_GRANTS.to_string(),
        },
        Intent::TotalSavings => format!(
            "The total savings across all displayed grants is {}.",
            format_currency_full(metrics::total_savings(grants))
        ),
        Intent::TotalValue => format!(
            "The total value of all displayed grants is {}.",
            format_currency_full(metrics::total_value(grants))
        ),
        Intent::AverageValue => format!(
            "The average grant value is {}.",
            format_currency_full(metrics::average_value(grants))
        ),
        Intent::Recipients => format!(
            "The recipients include: {}.",
            metrics::distinct_recipients(grants).join(", ")
        ),
        Intent::Agencies => format!(
            "The agencies providing grants include: {}.",
            metrics::distinct_agencies(grants).join(", ")
        ),
        Intent::Identity => IDENTITY.to_string(),
        Intent::Fallback => FALLBACK.to_string(),
    }
}
