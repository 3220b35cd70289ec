// 💻 Computer Records - hardware inventory
//
// Desktop and Server are fixed machines; Notebook and Handheld carry a
// Portable block (weight, screen, wifi). Two computers are the same record
// when make and model match.

use crate::error::ValidationError;
use crate::registry::{Record, Registry};
use crate::validation::{require_non_empty, require_positive, require_positive_int};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComputerKey {
    pub make: String,
    pub model: String,
}

impl ComputerKey {
    pub fn new(make: &str, model: &str) -> Self {
        ComputerKey {
            make: make.to_string(),
            model: model.to_string(),
        }
    }
}

impl fmt::Display for ComputerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.make, self.model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputerType {
    Desktop,
    Server,
    Notebook,
    Handheld,
}

impl ComputerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputerType::Desktop => "Desktop",
            ComputerType::Server => "Server",
            ComputerType::Notebook => "Notebook",
            ComputerType::Handheld => "Handheld",
        }
    }

    pub fn is_portable(&self) -> bool {
        matches!(self, ComputerType::Notebook | ComputerType::Handheld)
    }
}

/// Attributes shared by notebooks and handhelds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portable {
    pub weight_kg: f64,
    pub dimensions: String,
    pub screen_in: f64,
    pub wifi: bool,
}

impl Portable {
    fn validate(&self) -> Result<(), ValidationError> {
        require_positive("weight_kg", self.weight_kg)?;
        require_non_empty("dimensions", &self.dimensions)?;
        require_positive("screen_in", self.screen_in)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormFactor {
    Desktop {
        case_type: String,
        gpu: String,
        audio: String,
    },
    Server {
        case_type: String,
        cpus: u32,
        raid: bool,
    },
    Notebook {
        portable: Portable,
        webcam_mp: Option<f64>,
    },
    Handheld {
        portable: Portable,
        bluetooth: bool,
        expansion_slot: bool,
    },
}

/// Common hardware attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputerSpec {
    pub make: String,
    pub model: String,
    pub cpu: String,
    pub ram_gb: u32,
    pub storage_gb: u32,
    pub os: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Computer {
    key: ComputerKey,
    cpu: String,
    ram_gb: u32,
    storage_gb: u32,
    os: String,
    form: FormFactor,
}

impl PartialEq for Computer {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Computer {
    pub fn new(spec: ComputerSpec, form: FormFactor) -> Result<Self, ValidationError> {
        require_non_empty("make", &spec.make)?;
        require_non_empty("model", &spec.model)?;
        require_non_empty("cpu", &spec.cpu)?;
        require_positive_int("ram_gb", spec.ram_gb)?;
        require_positive_int("storage_gb", spec.storage_gb)?;
        require_non_empty("os", &spec.os)?;

        match &form {
            FormFactor::Desktop { case_type, .. } => require_non_empty("case_type", case_type)?,
            FormFactor::Server { case_type, cpus, .. } => {
                require_non_empty("case_type", case_type)?;
                require_positive_int("cpus", *cpus)?;
            }
            FormFactor::Notebook { portable, webcam_mp } => {
                portable.validate()?;
                if let Some(mp) = webcam_mp {
                    require_positive("webcam_mp", *mp)?;
                }
            }
            FormFactor::Handheld { portable, .. } => portable.validate()?,
        }

        Ok(Computer {
            key: ComputerKey::new(&spec.make, &spec.model),
            cpu: spec.cpu,
            ram_gb: spec.ram_gb,
            storage_gb: spec.storage_gb,
            os: spec.os,
            form,
        })
    }

    pub fn make(&self) -> &str {
        &self.key.make
    }

    pub fn model(&self) -> &str {
        &self.key.model
    }

    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    pub fn ram_gb(&self) -> u32 {
        self.ram_gb
    }

    pub fn storage_gb(&self) -> u32 {
        self.storage_gb
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn form(&self) -> &FormFactor {
        &self.form
    }

    pub fn computer_type(&self) -> ComputerType {
        match self.form {
            FormFactor::Desktop { .. } => ComputerType::Desktop,
            FormFactor::Server { .. } => ComputerType::Server,
            FormFactor::Notebook { .. } => ComputerType::Notebook,
            FormFactor::Handheld { .. } => ComputerType::Handheld,
        }
    }

    pub fn portable(&self) -> Option<&Portable> {
        match &self.form {
            FormFactor::Notebook { portable, .. } | FormFactor::Handheld { portable, .. } => Some(portable),
            _ => None,
        }
    }

    pub fn has_wifi(&self) -> bool {
        self.portable().map_or(false, |p| p.wifi)
    }

    pub fn has_raid(&self) -> bool {
        matches!(self.form, FormFactor::Server { raid: true, .. })
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} - {}, {} GB RAM, {} GB storage, {}",
            self.computer_type().as_str(),
            self.key,
            self.cpu,
            self.ram_gb,
            self.storage_gb,
            self.os
        )
    }
}

impl Record for Computer {
    type Key = ComputerKey;
    type Variant = ComputerType;
    const KIND: &'static str = "computer";

    fn key(&self) -> &ComputerKey {
        &self.key
    }

    fn variant(&self) -> ComputerType {
        self.computer_type()
    }
}

// ============================================================================
// INVENTORY QUERIES
// ============================================================================

pub type Inventory = Registry<Computer>;

impl Registry<Computer> {
    pub fn by_make(&self, make: &str) -> Vec<&Computer> {
        self.filter(|c| c.make().eq_ignore_ascii_case(make))
    }

    pub fn by_os(&self, os: &str) -> Vec<&Computer> {
        self.filter(|c| c.os().eq_ignore_ascii_case(os))
    }

    pub fn most_ram(&self) -> Option<&Computer> {
        self.max_by(|c| c.ram_gb() as f64)
    }

    /// 0 when the inventory is empty
    pub fn average_ram(&self) -> f64 {
        self.average(|c| c.ram_gb() as f64)
    }

    pub fn portables_with_wifi(&self) -> usize {
        self.count_where(|c| c.has_wifi())
    }

    pub fn servers_with_raid(&self) -> usize {
        self.count_where(|c| c.has_raid())
    }

    /// Lightest notebook, first one wins ties
    pub fn lightest_notebook(&self) -> Option<&Computer> {
        self.iter()
            .filter(|c| c.computer_type() == ComputerType::Notebook)
            .filter_map(|c| c.portable().map(|p| (c, p.weight_kg)))
            .fold(None, |best: Option<(&Computer, f64)>, (c, w)| match best {
                Some((_, best_w)) if best_w <= w => best,
                _ => Some((c, w)),
            })
            .map(|(c, _)| c)
    }

    /// Portables at or under `max_weight_kg`, optionally wifi-only
    pub fn portables_under(&self, max_weight_kg: f64, require_wifi: bool) -> Vec<&Computer> {
        self.filter(|c| {
            c.portable()
                .map_or(false, |p| p.weight_kg <= max_weight_kg && (!require_wifi || p.wifi))
        })
    }
}
