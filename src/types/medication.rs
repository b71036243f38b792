//! Static medication reference data

use serde::Serialize;

/// Sentinel medication id for doses outside the catalog
pub const OTHER_MEDICATION_ID: &str = "other";

/// Reference entry for a benzodiazepine (not user-editable)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MedicationReference {
    pub id: &'static str,
    pub name: &'static str,
    /// Display-only range, e.g. "20-100"
    pub half_life_hours: &'static str,
    /// 1mg of this = X mg of diazepam
    pub diazepam_equivalence: f64,
    pub unit: &'static str,
    /// Hex color, e.g. "#ff00ff"
    pub color: &'static str,
}

impl MedicationReference {
    /// Name without the brand suffix: "Alprazolam (Xanax)" → "Alprazolam"
    pub fn short_name(&self) -> &'static str {
        self.name.split('(').next().unwrap_or(self.name).trim()
    }
}

/// Catalog in canonical display order
pub const MEDICATIONS: &[MedicationReference] = &[
    MedicationReference {
        id: "alprazolam",
        name: "Alprazolam (Xanax)",
        half_life_hours: "11-12",
        diazepam_equivalence: 20.0,
        unit: "mg",
        color: "#ff00ff",
    },
    MedicationReference {
        id: "clonazepam",
        name: "Clonazepam (Klonopin)",
        half_life_hours: "18-50",
        diazepam_equivalence: 20.0,
        unit: "mg",
        color: "#00ffff",
    },
    MedicationReference {
        id: "diazepam",
        name: "Diazepam (Valium)",
        half_life_hours: "20-100",
        diazepam_equivalence: 1.0,
        unit: "mg",
        color: "#ffff00",
    },
    MedicationReference {
        id: "lorazepam",
        name: "Lorazepam (Ativan)",
        half_life_hours: "10-20",
        diazepam_equivalence: 10.0,
        unit: "mg",
        color: "#00ff00",
    },
    MedicationReference {
        id: "oxazepam",
        name: "Oxazepam (Serax)",
        half_life_hours: "4-15",
        diazepam_equivalence: 0.5,
        unit: "mg",
        color: "#3b82f6",
    },
    MedicationReference {
        id: "chlordiazepoxide",
        name: "Chlordiazepoxide (Librium)",
        half_life_hours: "5-30",
        diazepam_equivalence: 0.4,
        unit: "mg",
        color: "#f97316",
    },
    MedicationReference {
        id: "temazepam",
        name: "Temazepam (Restoril)",
        half_life_hours: "8-22",
        diazepam_equivalence: 0.5,
        unit: "mg",
        color: "#ec4899",
    },
    MedicationReference {
        id: OTHER_MEDICATION_ID,
        name: "Other",
        half_life_hours: "N/A",
        diazepam_equivalence: 0.0,
        unit: "mg",
        color: "#94a3b8",
    },
];

/// Look up a catalog entry by id
pub fn find_medication(id: &str) -> Option<&'static MedicationReference> {
    MEDICATIONS.iter().find(|m| m.id == id)
}

/// Position of a medication in catalog order
pub fn medication_index(id: &str) -> Option<usize> {
    MEDICATIONS.iter().position(|m| m.id == id)
}
