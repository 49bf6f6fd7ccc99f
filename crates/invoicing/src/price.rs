use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dentlab_cases::Material;
use dentlab_core::Money;

/// Unit price per material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<Material, Money>);

impl PriceTable {
    /// A table with every known material priced at zero.
    pub fn zeroed() -> Self {
        Self(Material::ALL.into_iter().map(|m| (m, Money::ZERO)).collect())
    }

    pub fn price(&self, material: Material) -> Money {
        self.0.get(&material).copied().unwrap_or(Money::ZERO)
    }

    pub fn set(&mut self, material: Material, price: Money) {
        self.0.insert(material, price);
    }

    /// Apply a typed price. A non-numeric input is ignored and the previous
    /// price stays in place. Returns whether the input was accepted.
    pub fn apply_input(&mut self, material: Material, input: &str) -> bool {
        match Money::parse_input(input) {
            Ok(price) => {
                self.set(material, price);
                true
            }
            Err(_) => false,
        }
    }

    /// Apply `(material name, typed price)` pairs. Unknown material names
    /// and non-numeric prices are skipped; their names are returned.
    pub fn apply_inputs<'a, I>(&mut self, inputs: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ignored = Vec::new();
        for (name, input) in inputs {
            let applied = match Material::from_name(name) {
                Some(material) => self.apply_input(material, input),
                None => false,
            };
            if !applied {
                ignored.push(name.to_string());
            }
        }
        ignored
    }

    pub fn iter(&self) -> impl Iterator<Item = (Material, Money)> + '_ {
        self.0.iter().map(|(m, p)| (*m, *p))
    }
}

impl Default for PriceTable {
    /// The lab's standard price list.
    fn default() -> Self {
        let mut table = Self::zeroed();
        table.set(Material::Zolid, Money::from_major(25));
        table.set(Material::Zirconia, Money::from_major(30));
        table.set(Material::NickelFree, Money::from_major(20));
        table.set(Material::NGuard, Money::from_major(15));
        table.set(Material::Implant, Money::from_major(50));
        table.set(Material::MookUp, Money::from_major(10));
        table
    }
}
