//! Electrolyte NRTL mixing terms
//!
//! Computes the charge-weighted mole fractions `X`, the ion charge
//! composition `Y` and the non-randomness matrix `alpha` of a liquid
//! electrolyte phase. Ion-molecule and ion-ion parameters are composed from
//! salt (ion pair) parameters weighted by `Y`.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Error, Result};

/// A true species with its charge; zero charge means molecular
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    #[serde(default)]
    pub charge: i32,
}

impl Species {
    pub fn molecular(name: &str) -> Self {
        Self {
            name: name.to_string(),
            charge: 0,
        }
    }

    pub fn ion(name: &str, charge: i32) -> Self {
        Self {
            name: name.to_string(),
            charge,
        }
    }

    fn kind(&self) -> Kind {
        match self.charge {
            0 => Kind::Molecular,
            c if c > 0 => Kind::Cation,
            _ => Kind::Anion,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Molecular,
    Cation,
    Anion,
}

/// An apparent species and the ions it dissociates into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApparentSpecies {
    pub name: String,
    pub dissociation: Vec<String>,
}

/// Constant non-randomness parameters, looked up in either order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlphaTable {
    values: BTreeMap<(String, String), f64>,
}

impl AlphaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, i: &str, j: &str, alpha: f64) -> Self {
        self.values.insert((i.to_string(), j.to_string()), alpha);
        self
    }

    /// `alpha(i, j)`; a species paired with itself has no interaction
    pub fn get(&self, i: &str, j: &str) -> Result<f64> {
        if i == j {
            return Ok(0.0);
        }
        self.values
            .get(&(i.to_string(), j.to_string()))
            .or_else(|| self.values.get(&(j.to_string(), i.to_string())))
            .copied()
            .ok_or_else(|| Error::config(format!("missing eNRTL alpha parameter for ({}, {})", i, j)))
    }
}

/// `X`, `Y` and `alpha` of one phase composition, indexed like the species list
#[derive(Debug, Clone, PartialEq)]
pub struct MixingTerms {
    pub x: Vec<f64>,
    /// Zero for molecular species
    pub y: Vec<f64>,
    pub alpha: Vec<Vec<f64>>,
}

/// True species, apparent species and alpha parameters of an electrolyte phase
#[derive(Debug, Clone)]
pub struct ElectrolyteSystem {
    species: Vec<Species>,
    apparent: Vec<ApparentSpecies>,
    alpha: AlphaTable,
}

impl ElectrolyteSystem {
    pub fn new(species: Vec<Species>, apparent: Vec<ApparentSpecies>, alpha: AlphaTable) -> Result<Self> {
        if let Some(dup) = species.iter().map(|s| s.name.as_str()).duplicates().next() {
            return Err(Error::config(format!("species '{}' declared twice", dup)));
        }
        for a in &apparent {
            if let Some(missing) = a
                .dissociation
                .iter()
                .find(|d| !species.iter().any(|s| &s.name == *d))
            {
                return Err(Error::config(format!(
                    "apparent species '{}' dissociates into unknown species '{}'",
                    a.name, missing
                )));
            }
        }
        Ok(Self {
            species,
            apparent,
            alpha,
        })
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Ion pair formed by `cation` and `anion`
    pub fn salt(&self, cation: &str, anion: &str) -> Result<&str> {
        let found = self.apparent.iter().find(|a| {
            a.dissociation.iter().any(|d| d == cation) && a.dissociation.iter().any(|d| d == anion)
        });
        match found {
            Some(a) => Ok(a.name.as_str()),
            None if cation == "H+" && anion == "OH-" => Ok("H2O"),
            None => Err(Error::config(format!("could not find ion pair for ({}, {})", cation, anion))),
        }
    }

    /// Mixing terms for true-species mole fractions `mole_frac`
    pub fn mixing_terms(&self, mole_frac: &[f64]) -> Result<MixingTerms> {
        if mole_frac.len() != self.species.len() {
            return Err(Error::shape(format!(
                "expected {} mole fractions, got {}",
                self.species.len(),
                mole_frac.len()
            )));
        }

        let x: Vec<f64> = self
            .species
            .iter()
            .zip(mole_frac)
            .map(|(s, xf)| xf * f64::from(s.charge.abs().max(1)))
            .collect();

        let total = |kind: Kind| -> f64 {
            self.species
                .iter()
                .zip(&x)
                .filter(|(s, _)| s.kind() == kind)
                .map(|(_, v)| v)
                .sum()
        };
        let (cations, anions) = (total(Kind::Cation), total(Kind::Anion));
        // Absent ions get a zero share
        let share = |v: f64, sum: f64| if sum > 0.0 { v / sum } else { 0.0 };
        let y: Vec<f64> = self
            .species
            .iter()
            .zip(&x)
            .map(|(s, v)| match s.kind() {
                Kind::Molecular => 0.0,
                Kind::Cation => share(*v, cations),
                Kind::Anion => share(*v, anions),
            })
            .collect();

        let n = self.species.len();
        let mut alpha = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                alpha[i][j] = self.alpha_ij(i, j, &y)?;
            }
        }
        debug!(n_species = n, "eNRTL mixing terms");
        Ok(MixingTerms { x, y, alpha })
    }

    fn alpha_ij(&self, i: usize, j: usize, y: &[f64]) -> Result<f64> {
        let (si, sj) = (&self.species[i], &self.species[j]);
        let weighted = |kind: Kind, f: &dyn Fn(&str) -> Result<f64>| -> Result<f64> {
            let mut acc = 0.0;
            for (k, sk) in self.species.iter().enumerate() {
                if sk.kind() == kind {
                    acc += y[k] * f(&sk.name)?;
                }
            }
            Ok(acc)
        };
        let table = &self.alpha;

        match (si.kind(), sj.kind()) {
            (Kind::Molecular, Kind::Molecular) => table.get(&si.name, &sj.name),
            (Kind::Cation, Kind::Molecular) => {
                weighted(Kind::Anion, &|k: &str| table.get(self.salt(&si.name, k)?, &sj.name))
            }
            (Kind::Molecular, Kind::Cation) => {
                weighted(Kind::Anion, &|k: &str| table.get(self.salt(&sj.name, k)?, &si.name))
            }
            (Kind::Anion, Kind::Molecular) => {
                weighted(Kind::Cation, &|k: &str| table.get(self.salt(k, &si.name)?, &sj.name))
            }
            (Kind::Molecular, Kind::Anion) => {
                weighted(Kind::Cation, &|k: &str| table.get(self.salt(k, &sj.name)?, &si.name))
            }
            (Kind::Cation, Kind::Anion) => {
                let pair = self.salt(&si.name, &sj.name)?;
                weighted(Kind::Cation, &|k: &str| table.get(pair, self.salt(k, &sj.name)?))
            }
            (Kind::Anion, Kind::Cation) => {
                let pair = self.salt(&sj.name, &si.name)?;
                weighted(Kind::Anion, &|k: &str| table.get(pair, self.salt(&sj.name, k)?))
            }
            // Like ions do not interact
            (Kind::Cation, Kind::Cation) | (Kind::Anion, Kind::Anion) => Ok(0.0),
        }
    }
}
