//! Registered person managed from the back office.

use crate::model::EntityModel;
use crate::model::entity::Attribute;
use crate::schema::SqlType;
use serde::{Deserialize, Serialize};

pub const TABLE: &str = "members";

/// Label rendered for any stored gender outside the closed set.
pub const UNKNOWN_LABEL: &str = "未知";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "男",
            Gender::Female => "女",
        }
    }

    pub fn parse(s: &str) -> Option<Gender> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Display label for a stored gender. Total: unmapped, empty and null values
/// render as [`UNKNOWN_LABEL`].
pub fn gender_label(state: Option<&str>) -> &'static str {
    match state.and_then(Gender::parse) {
        Some(g) => g.label(),
        None => UNKNOWN_LABEL,
    }
}

pub fn entity() -> EntityModel {
    EntityModel::new(TABLE)
        .attribute(Attribute::new("name", SqlType::String(255)))
        .attribute(Attribute::new("email", SqlType::String(255)))
        .attribute(Attribute::new("phone", SqlType::String(255)))
        .attribute(Attribute::new("address", SqlType::String(255)))
        .attribute(Attribute::new("gender", SqlType::String(255)))
        .attribute(Attribute::new("is_active", SqlType::Boolean).with_default())
        .fillable(&["name", "email", "phone", "address", "gender", "is_active"])
        .timestamps()
        .soft_deletes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_genders_map_to_labels() {
        assert_eq!(gender_label(Some("male")), "男");
        assert_eq!(gender_label(Some("female")), "女");
    }

    #[test]
    fn anything_else_is_unknown() {
        for state in [None, Some(""), Some("MALE"), Some("other"), Some(" male")] {
            assert_eq!(gender_label(state), UNKNOWN_LABEL);
        }
    }

    #[test]
    fn gender_round_trips_through_str() {
        for g in Gender::ALL {
            assert_eq!(Gender::parse(g.as_str()), Some(g));
        }
    }
}
