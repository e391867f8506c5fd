//! Structured search filters and their rendering as vector-index filter expressions.

use std::{
	collections::BTreeMap,
	fmt::{self, Display, Formatter},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::category::CategoryMap;

pub const INDEX_NAME_FIELD: &str = "index_name";
pub const PRODUCT_TYPE_FIELD: &str = "product_type_name";

/// Ordered so rendered expressions and cache payloads are stable.
pub type Filters = BTreeMap<String, FilterValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
	Scalar(String),
	Set(Vec<String>),
}
impl FilterValue {
	/// Accepts strings, numbers, booleans, and non-empty arrays of those.
	pub fn from_json(value: &Value) -> Option<Self> {
		match value {
			Value::Array(items) => {
				let values: Vec<String> = items.iter().filter_map(scalar_text).collect();

				(!values.is_empty()).then_some(Self::Set(values))
			},
			other => scalar_text(other).map(Self::Scalar),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
	Eq { field: String, value: String },
	In { field: String, values: Vec<String> },
}
impl Display for Clause {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Eq { field, value } => write!(f, "{field} == {}", quote(value)),
			Self::In { field, values } => {
				let rendered = values.iter().map(|value| quote(value)).collect::<Vec<_>>();

				write!(f, "{field} in [{}]", rendered.join(", "))
			},
		}
	}
}

/// Conjunction of field constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpr {
	clauses: Vec<Clause>,
}
impl FilterExpr {
	/// Returns `None` when there is nothing to constrain.
	pub fn from_filters(filters: &Filters) -> Option<Self> {
		let clauses: Vec<Clause> = filters
			.iter()
			.map(|(field, value)| match value {
				FilterValue::Scalar(value) => Clause::Eq { field: field.clone(), value: value.clone() },
				FilterValue::Set(values) =>
					Clause::In { field: field.clone(), values: values.clone() },
			})
			.collect();

		(!clauses.is_empty()).then_some(Self { clauses })
	}

	pub fn clauses(&self) -> &[Clause] {
		&self.clauses
	}
}
impl Display for FilterExpr {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		for (idx, clause) in self.clauses.iter().enumerate() {
			if idx > 0 {
				f.write_str(" and ")?;
			}

			write!(f, "{clause}")?;
		}

		Ok(())
	}
}

/// Reads filters from a model-produced JSON object, keeping only allowed identifier fields.
///
/// An empty `allowed` list accepts every identifier field.
pub fn filters_from_json(object: &Map<String, Value>, allowed: &[String]) -> Filters {
	object
		.iter()
		.filter_map(|(field, value)| {
			let field = field.trim();

			if !is_identifier(field) {
				return None;
			}
			if !allowed.is_empty() && !allowed.iter().any(|name| name == field) {
				return None;
			}

			FilterValue::from_json(value).map(|value| (field.to_string(), value))
		})
		.collect()
}

/// Multi-category outfits keep only the department constraint so that attributes extracted for
/// one item do not exclude the other items.
pub fn scope_filters(filters: &Filters, is_single_item: bool) -> Filters {
	if is_single_item {
		return filters.clone();
	}

	filters
		.iter()
		.filter(|(field, _)| field.as_str() == INDEX_NAME_FIELD)
		.map(|(field, value)| (field.clone(), value.clone()))
		.collect()
}

/// Adds a product-type membership constraint for a mapped category. Unmapped categories leave
/// the filters untouched.
pub fn with_category_constraint(
	mut filters: Filters,
	category: &str,
	categories: &CategoryMap,
) -> Filters {
	if let Some(types) = categories.product_types(category) {
		filters.insert(PRODUCT_TYPE_FIELD.to_string(), FilterValue::Set(types.to_vec()));
	}

	filters
}

fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => {
			let text = text.trim();

			(!text.is_empty()).then(|| text.to_string())
		},
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

fn is_identifier(field: &str) -> bool {
	!field.is_empty() && field.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn quote(value: &str) -> String {
	format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
