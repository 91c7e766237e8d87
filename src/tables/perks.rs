//! Damage effects of weapon perks, for the app's damage calculator.
//!
//! Multipliers assume the game rounds up after applying them, so the app
//! computes `ceil((base - 0.5) * multiplier)`.

use crate::context::BuildContext;
use crate::hashes::item;
use crate::tables::{Artifact, BuildError, exported_enum};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::collections::BTreeMap;

pub const FILE_NAME: &str = "DeepsightPerkDefinition.json";

exported_enum! {
    pub enum PerkEffectType as "DeepsightPerkEffectType" {
        DamageBuff = 0,
        StackingDamageBuffDynamic = 1,
        StackingDamageBuffStaticAdditive = 2,
        StackingDamageBuffStaticMultiplicative = 3,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PerkEffect {
    /// Flat bonus, `1 + damage`.
    Damage { damage: f64 },
    /// Explicit bonus per stack count, one entry per stack.
    StackingDynamic { max_stacks: u32, damage: Vec<f64> },
    /// `1 + damage_per_stack * stacks`.
    StackingAdditive { max_stacks: u32, damage_per_stack: f64 },
    /// `(1 + damage_per_stack) ^ stacks`.
    StackingMultiplicative { max_stacks: u32, damage_per_stack: f64 },
}

impl PerkEffect {
    pub fn kind(&self) -> PerkEffectType {
        match self {
            PerkEffect::Damage { .. } => PerkEffectType::DamageBuff,
            PerkEffect::StackingDynamic { .. } => PerkEffectType::StackingDamageBuffDynamic,
            PerkEffect::StackingAdditive { .. } => PerkEffectType::StackingDamageBuffStaticAdditive,
            PerkEffect::StackingMultiplicative { .. } => PerkEffectType::StackingDamageBuffStaticMultiplicative,
        }
    }

    fn is_valid(&self) -> bool {
        match self {
            PerkEffect::StackingDynamic { max_stacks, damage } => damage.len() == *max_stacks as usize,
            _ => true,
        }
    }
}

impl Serialize for PerkEffect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DeepsightPerkEffect", 3)?;
        state.serialize_field("type", &self.kind())?;
        match self {
            PerkEffect::Damage { damage } => state.serialize_field("damage", damage)?,
            PerkEffect::StackingDynamic { max_stacks, damage } => {
                state.serialize_field("maxStacks", max_stacks)?;
                state.serialize_field("damage", damage)?;
            }
            PerkEffect::StackingAdditive {
                max_stacks,
                damage_per_stack,
            }
            | PerkEffect::StackingMultiplicative {
                max_stacks,
                damage_per_stack,
            } => {
                state.serialize_field("maxStacks", max_stacks)?;
                state.serialize_field("damagePerStack", damage_per_stack)?;
            }
        }
        state.end()
    }
}

fn damage(damage: f64) -> PerkEffect {
    PerkEffect::Damage { damage }
}

fn stacking_additive(max_stacks: u32, damage_per_stack: f64) -> PerkEffect {
    PerkEffect::StackingAdditive {
        max_stacks,
        damage_per_stack,
    }
}

fn stacking_multiplicative(max_stacks: u32, damage_per_stack: f64) -> PerkEffect {
    PerkEffect::StackingMultiplicative {
        max_stacks,
        damage_per_stack,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepsightPerkDefinition {
    pub effects: Vec<PerkEffect>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl DeepsightPerkDefinition {
    fn new(effects: Vec<PerkEffect>) -> Self {
        Self {
            effects,
            notes: Vec::new(),
        }
    }
}

pub type PerkTable = BTreeMap<u32, DeepsightPerkDefinition>;

pub fn perk_data() -> PerkTable {
    BTreeMap::from([
        // x1.1 per stack sits between the archetypes
        (
            item::RAMPAGE_TRAIT,
            DeepsightPerkDefinition::new(vec![stacking_multiplicative(3, 0.10)]),
        ),
        (item::ONE_FOR_ALL_TRAIT, DeepsightPerkDefinition::new(vec![damage(0.35)])),
        (
            item::PRECISION_INSTRUMENT_TRAIT,
            DeepsightPerkDefinition::new(vec![stacking_additive(6, 0.25 / 6.0)]),
        ),
        (
            item::PRECISION_INSTRUMENT_ENHANCED_TRAIT,
            DeepsightPerkDefinition::new(vec![stacking_additive(6, 0.30 / 6.0)]),
        ),
    ])
}

pub fn build(_ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let table = perk_data();
    if !table.values().flat_map(|perk| &perk.effects).all(PerkEffect::is_valid) {
        return Err(BuildError::Validation("DeepsightPerkDefinition"));
    }
    Ok(vec![Artifact::json(FILE_NAME, &table)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn effects_serialize_with_numeric_type() {
        assert_eq!(
            serde_json::to_value(stacking_multiplicative(3, 0.1)).unwrap(),
            json!({ "type": 3, "maxStacks": 3, "damagePerStack": 0.1 })
        );
        assert_eq!(serde_json::to_value(damage(0.35)).unwrap(), json!({ "type": 0, "damage": 0.35 }));
        let dynamic = PerkEffect::StackingDynamic {
            max_stacks: 2,
            damage: vec![0.1, 0.2],
        };
        assert_eq!(
            serde_json::to_value(&dynamic).unwrap(),
            json!({ "type": 1, "maxStacks": 2, "damage": [0.1, 0.2] })
        );
    }

    #[test]
    fn dynamic_stacks_must_match() {
        let bad = PerkEffect::StackingDynamic {
            max_stacks: 3,
            damage: vec![0.1],
        };
        assert!(!bad.is_valid());
        assert!(perk_data().values().flat_map(|p| &p.effects).all(PerkEffect::is_valid));
    }

    #[test]
    fn table_shape() {
        let value = serde_json::to_value(perk_data()).unwrap();
        let rampage = &value[item::RAMPAGE_TRAIT.to_string()];
        assert_eq!(rampage["effects"][0]["type"], 3);
        assert!(rampage.get("notes").is_none());
        let enhanced = &value[item::PRECISION_INSTRUMENT_ENHANCED_TRAIT.to_string()];
        let per_stack = enhanced["effects"][0]["damagePerStack"].as_f64().unwrap();
        assert!((per_stack - 0.05).abs() < 1e-12);
    }
}
