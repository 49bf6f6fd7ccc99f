use core::str::FromStr;

use serde::{Deserialize, Serialize};

use dentlab_core::DomainError;

/// Prosthesis material offered by the lab.
///
/// Declaration order is display order; invoice summaries iterate in this order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "Zolid")]
    Zolid,
    #[serde(rename = "Zirconia")]
    Zirconia,
    #[serde(rename = "Nickel Free")]
    NickelFree,
    #[serde(rename = "N-Guard")]
    NGuard,
    #[serde(rename = "Implant")]
    Implant,
    #[serde(rename = "MookUp")]
    MookUp,
}

impl Material {
    pub const ALL: [Material; 6] = [
        Material::Zolid,
        Material::Zirconia,
        Material::NickelFree,
        Material::NGuard,
        Material::Implant,
        Material::MookUp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Zolid => "Zolid",
            Material::Zirconia => "Zirconia",
            Material::NickelFree => "Nickel Free",
            Material::NGuard => "N-Guard",
            Material::Implant => "Implant",
            Material::MookUp => "MookUp",
        }
    }

    /// Exact-name lookup; surrounding whitespace is ignored.
    pub fn from_name(name: &str) -> Option<Material> {
        let name = name.trim();
        Material::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl core::fmt::Display for Material {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::from_name(s)
            .ok_or_else(|| DomainError::validation(format!("unknown material '{}'", s.trim())))
    }
}

/// Prosthesis construction type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProsthesisType {
    Separate,
    Bridge,
}

impl ProsthesisType {
    pub const ALL: [ProsthesisType; 2] = [ProsthesisType::Separate, ProsthesisType::Bridge];

    pub fn as_str(self) -> &'static str {
        match self {
            ProsthesisType::Separate => "Separate",
            ProsthesisType::Bridge => "Bridge",
        }
    }
}

impl FromStr for ProsthesisType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ProsthesisType::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown prosthesis type '{s}'")))
    }
}
