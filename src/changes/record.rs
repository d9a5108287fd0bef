//! Change records decoded from the change document

use serde::Serialize;

use crate::core::error::EntryDecodeError;
use crate::core::types::StatField;
use crate::json::Value;

/// Core numbers of a card; `None` means "leave this field alone".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statline {
    pub space: Option<i32>,
    pub cost: Option<i32>,
    pub attack: Option<i32>,
    pub health: Option<i32>,
}

impl Statline {
    /// Decode a statline object. Non-objects decode to `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_map()?;
        let member = |key: &str| map.get(key).and_then(to_i32);

        Some(Self {
            space: member("space"),
            cost: member("cost"),
            attack: member("attack"),
            health: member("health"),
        })
    }

    pub fn get(&self, field: StatField) -> Option<i32> {
        match field {
            StatField::Cost => self.cost,
            StatField::Attack => self.attack,
            StatField::Health => self.health,
            StatField::Space => self.space,
        }
    }

    pub fn is_empty(&self) -> bool {
        StatField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

impl std::fmt::Display for Statline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: Option<i32>| v.map_or("-".to_string(), |n| n.to_string());
        write!(
            f,
            "space {} / cost {} / {} atk / {} hp",
            show(self.space),
            show(self.cost),
            show(self.attack),
            show(self.health)
        )
    }
}

/// One requested edit to a single named card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    /// Lookup key for the target card; never empty
    pub card_name: String,
    /// Stats before the change, kept for provenance only
    pub current_statline: Option<Statline>,
    pub current_effect: Option<String>,
    pub new_statline: Option<Statline>,
    pub new_effect: Option<String>,
}

impl ChangeRecord {
    pub fn new(card_name: impl Into<String>) -> Self {
        Self {
            card_name: card_name.into(),
            current_statline: None,
            current_effect: None,
            new_statline: None,
            new_effect: None,
        }
    }

    pub fn with_new_statline(mut self, statline: Statline) -> Self {
        self.new_statline = Some(statline);
        self
    }

    pub fn with_new_effect(mut self, effect: impl Into<String>) -> Self {
        self.new_effect = Some(effect.into());
        self
    }

    /// Decode one entry of the `changes` array.
    ///
    /// Returns `Ok(None)` for entries whose `cardName` is missing, not a
    /// string, or empty; those are dropped rather than treated as errors.
    pub fn decode(entry: &Value, index: usize) -> Result<Option<Self>, EntryDecodeError> {
        let map = entry
            .as_map()
            .ok_or(EntryDecodeError::NotAnObject {
                index,
                found: entry.kind_name(),
            })?;

        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let statline = |key: &str| map.get(key).and_then(Statline::from_value);

        let Some(card_name) = text("cardName").filter(|name| !name.is_empty()) else {
            return Ok(None);
        };

        Ok(Some(Self {
            card_name,
            current_statline: statline("currentStatline"),
            current_effect: text("currentEffect"),
            new_statline: statline("newStatline"),
            new_effect: text("newEffect"),
        }))
    }
}

/// Integer conversion with the rules the balance sheets were authored
/// against: numbers round half-to-even and must fit in 32 bits, booleans are
/// 1/0, numeric strings are parsed. Everything else is absent.
fn to_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            let rounded = n.round_ties_even();
            if rounded.is_finite() && rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64 {
                Some(rounded as i32)
            } else {
                None
            }
        }
        Value::Bool(b) => Some(i32::from(*b)),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parse;

    #[test]
    fn test_decode_full_entry() {
        let entry = parse(
            r#"{
                "cardName": "Inferno",
                "currentStatline": {"cost": 2, "attack": 10},
                "currentEffect": "Deal 10 damage.",
                "newStatline": {"cost": 1, "health": 5},
                "newEffect": "Deal 12 damage. Sweep."
            }"#,
        )
        .unwrap();

        let record = ChangeRecord::decode(&entry, 0).unwrap().unwrap();
        assert_eq!(record.card_name, "Inferno");
        assert_eq!(record.current_statline.unwrap().attack, Some(10));
        assert_eq!(record.current_effect.as_deref(), Some("Deal 10 damage."));

        let new = record.new_statline.unwrap();
        assert_eq!(new.cost, Some(1));
        assert_eq!(new.health, Some(5));
        assert_eq!(new.attack, None);
        assert_eq!(new.space, None);
        assert_eq!(record.new_effect.as_deref(), Some("Deal 12 damage. Sweep."));
    }

    #[test]
    fn test_missing_or_empty_name_is_dropped() {
        for text in [r#"{"newEffect": "x"}"#, r#"{"cardName": ""}"#, r#"{"cardName": 7}"#] {
            let entry = parse(text).unwrap();
            assert_eq!(ChangeRecord::decode(&entry, 0).unwrap(), None, "{}", text);
        }
    }

    #[test]
    fn test_non_object_entry_is_error() {
        let entry = parse("[1]").unwrap();
        assert_eq!(
            ChangeRecord::decode(&entry, 3),
            Err(EntryDecodeError::NotAnObject {
                index: 3,
                found: "list"
            })
        );
    }

    #[test]
    fn test_non_string_effect_is_absent() {
        let entry = parse(r#"{"cardName": "A", "newEffect": 5}"#).unwrap();
        let record = ChangeRecord::decode(&entry, 0).unwrap().unwrap();
        assert_eq!(record.new_effect, None);
    }

    #[test]
    fn test_statline_not_object_is_absent() {
        let entry = parse(r#"{"cardName": "A", "newStatline": [1, 2]}"#).unwrap();
        let record = ChangeRecord::decode(&entry, 0).unwrap().unwrap();
        assert_eq!(record.new_statline, None);
    }

    #[test]
    fn test_integer_conversion_rules() {
        assert_eq!(to_i32(&Value::Number(2.5)), Some(2));
        assert_eq!(to_i32(&Value::Number(3.5)), Some(4));
        assert_eq!(to_i32(&Value::Number(-1.0)), Some(-1));
        assert_eq!(to_i32(&Value::Number(1e12)), None);
        assert_eq!(to_i32(&Value::Bool(true)), Some(1));
        assert_eq!(to_i32(&Value::from(" 42 ")), Some(42));
        assert_eq!(to_i32(&Value::from("4.5")), None);
        assert_eq!(to_i32(&Value::Null), None);
    }

    #[test]
    fn test_statline_display() {
        let statline = Statline {
            cost: Some(1),
            attack: Some(5),
            ..Default::default()
        };
        assert_eq!(statline.to_string(), "space - / cost 1 / 5 atk / - hp");
        assert!(!statline.is_empty());
        assert!(Statline::default().is_empty());
    }
}
