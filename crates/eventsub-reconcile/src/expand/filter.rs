use eventsub_config::{AdvancedFilterEntry, FilterValue, FlatConfig};
use eventsub_core::ValidationError;
use eventsub_core::model::{AdvancedFilter, AdvancedFilterOperator as Op, Filter};

/// Upper bound on operand values in one advanced filter entry.
pub const MAX_FILTER_VALUES: usize = 25;

/// Builds the remote filter: event types, subject filter and the ordered
/// advanced filters.
pub fn expand_filter(config: &FlatConfig) -> Result<Filter, ValidationError> {
    let mut filter = Filter {
        included_event_types: (!config.included_event_types.is_empty())
            .then(|| config.included_event_types.clone()),
        enable_advanced_filtering_on_arrays: Some(config.advanced_filtering_on_arrays_enabled),
        ..Default::default()
    };

    if let Some(subject) = config.subject_filter.as_ref().filter(|s| !s.is_empty()) {
        filter.subject_begins_with = Some(subject.subject_begins_with.clone());
        filter.subject_ends_with = Some(subject.subject_ends_with.clone());
        filter.is_subject_case_sensitive = Some(subject.case_sensitive);
    }

    filter.advanced_filters = config
        .advanced_filter
        .iter()
        .enumerate()
        .map(|(index, entry)| expand_advanced_filter(index, entry))
        .collect::<Result<_, _>>()?;

    Ok(filter)
}

/// Converts one `{operator, key, values}` entry, checking the operand count
/// and types the operator requires.
pub fn expand_advanced_filter(
    index: usize,
    entry: &AdvancedFilterEntry,
) -> Result<AdvancedFilter, ValidationError> {
    let field = format!("advanced_filter[{index}]");
    let invalid = |message: String| ValidationError::new(field.clone(), message);

    if entry.key.is_empty() {
        return Err(invalid("`key` must not be empty".into()));
    }
    if entry.values.len() > MAX_FILTER_VALUES {
        return Err(invalid(format!(
            "{} accepts at most {MAX_FILTER_VALUES} values, got {}",
            entry.operator,
            entry.values.len()
        )));
    }

    let key = entry.key.clone();
    let count = entry.values.len();
    let arity = |expected: &str| {
        invalid(format!(
            "{} requires {expected}, got {count}",
            entry.operator
        ))
    };

    let filter = match entry.operator {
        Op::NumberIn | Op::NumberNotIn => {
            if count == 0 {
                return Err(arity("at least one value"));
            }
            let values = numbers(&entry.values, &invalid)?;
            if entry.operator == Op::NumberIn {
                AdvancedFilter::NumberIn { key, values }
            } else {
                AdvancedFilter::NumberNotIn { key, values }
            }
        }
        Op::NumberLessThan
        | Op::NumberGreaterThan
        | Op::NumberLessThanOrEquals
        | Op::NumberGreaterThanOrEquals => {
            if count != 1 {
                return Err(arity("exactly one value"));
            }
            let value = numbers(&entry.values, &invalid)?[0];
            match entry.operator {
                Op::NumberLessThan => AdvancedFilter::NumberLessThan { key, value },
                Op::NumberGreaterThan => AdvancedFilter::NumberGreaterThan { key, value },
                Op::NumberLessThanOrEquals => AdvancedFilter::NumberLessThanOrEquals { key, value },
                _ => AdvancedFilter::NumberGreaterThanOrEquals { key, value },
            }
        }
        Op::NumberInRange | Op::NumberNotInRange => {
            if count < 2 || count % 2 != 0 {
                return Err(arity("an even number of values, at least two"));
            }
            let values = numbers(&entry.values, &invalid)?
                .chunks_exact(2)
                .map(|pair| [pair[0], pair[1]])
                .collect();
            if entry.operator == Op::NumberInRange {
                AdvancedFilter::NumberInRange { key, values }
            } else {
                AdvancedFilter::NumberNotInRange { key, values }
            }
        }
        Op::StringContains
        | Op::StringNotContains
        | Op::StringBeginsWith
        | Op::StringNotBeginsWith
        | Op::StringEndsWith
        | Op::StringNotEndsWith
        | Op::StringIn
        | Op::StringNotIn => {
            if count == 0 {
                return Err(arity("at least one value"));
            }
            let values = strings(&entry.values, &invalid)?;
            match entry.operator {
                Op::StringContains => AdvancedFilter::StringContains { key, values },
                Op::StringNotContains => AdvancedFilter::StringNotContains { key, values },
                Op::StringBeginsWith => AdvancedFilter::StringBeginsWith { key, values },
                Op::StringNotBeginsWith => AdvancedFilter::StringNotBeginsWith { key, values },
                Op::StringEndsWith => AdvancedFilter::StringEndsWith { key, values },
                Op::StringNotEndsWith => AdvancedFilter::StringNotEndsWith { key, values },
                Op::StringIn => AdvancedFilter::StringIn { key, values },
                _ => AdvancedFilter::StringNotIn { key, values },
            }
        }
        Op::BoolEquals => match entry.values.as_slice() {
            [FilterValue::Bool(value)] => AdvancedFilter::BoolEquals { key, value: *value },
            [other] => {
                return Err(invalid(format!(
                    "BoolEquals requires a boolean value, got a {}",
                    other.type_name()
                )));
            }
            _ => return Err(arity("exactly one value")),
        },
        Op::IsNullOrUndefined | Op::IsNotNull => {
            if count != 0 {
                return Err(arity("no values"));
            }
            if entry.operator == Op::IsNullOrUndefined {
                AdvancedFilter::IsNullOrUndefined { key }
            } else {
                AdvancedFilter::IsNotNull { key }
            }
        }
    };

    Ok(filter)
}

fn numbers(
    values: &[FilterValue],
    invalid: &impl Fn(String) -> ValidationError,
) -> Result<Vec<f64>, ValidationError> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| match value {
            FilterValue::Number(n) => Ok(*n),
            other => Err(invalid(format!(
                "value {i} must be a number, got a {}",
                other.type_name()
            ))),
        })
        .collect()
}

fn strings(
    values: &[FilterValue],
    invalid: &impl Fn(String) -> ValidationError,
) -> Result<Vec<String>, ValidationError> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| match value {
            FilterValue::String(s) => Ok(s.clone()),
            other => Err(invalid(format!(
                "value {i} must be a string, got a {}",
                other.type_name()
            ))),
        })
        .collect()
}
