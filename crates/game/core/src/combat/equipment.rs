//! Equipment reward pool.
//!
//! Equipment lives in the regular inventory under `equipment.*` gids; the
//! bonus it grants is derived from inventory counts rather than stored.

use rand::Rng;

use crate::state::Inventory;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EquipmentDefinition {
    pub gid: &'static str,
    pub name: &'static str,
    pub bonus: EquipmentBonus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EquipmentBonus {
    pub atk: i32,
    pub def: i32,
}

pub const ALL_EQUIPMENT: &[EquipmentDefinition] = &[
    EquipmentDefinition {
        gid: "equipment.passwordArmor",
        name: "Password Armor (+1 DEF)",
        bonus: EquipmentBonus { atk: 0, def: 1 },
    },
    EquipmentDefinition {
        gid: "equipment.mfaShield",
        name: "MFA Shield (+1 DEF)",
        bonus: EquipmentBonus { atk: 0, def: 1 },
    },
    EquipmentDefinition {
        gid: "equipment.antiPhishingSword",
        name: "Anti-Phishing Sword (+1 ATK)",
        bonus: EquipmentBonus { atk: 1, def: 0 },
    },
];

pub fn equipment_definition(gid: &str) -> Option<&'static EquipmentDefinition> {
    ALL_EQUIPMENT.iter().find(|def| def.gid == gid)
}

/// Sums the bonus of every equipment piece held, weighted by count.
pub fn equipment_bonus(inventory: &Inventory) -> EquipmentBonus {
    inventory
        .iter()
        .filter_map(|(gid, count)| equipment_definition(gid).map(|def| (def, count as i32)))
        .fold(EquipmentBonus::default(), |acc, (def, count)| EquipmentBonus {
            atk: acc.atk + def.bonus.atk * count,
            def: acc.def + def.bonus.def * count,
        })
}

/// Draws one piece uniformly from the pool.
pub fn pick_equipment_reward<R: Rng + ?Sized>(rng: &mut R) -> &'static EquipmentDefinition {
    let index = rng.gen_range(0..ALL_EQUIPMENT.len());
    &ALL_EQUIPMENT[index]
}
