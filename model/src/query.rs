use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use snafu::ensure;

/// The selector syntax Salt uses to interpret a [`Query`] target. Serialized as the `tgt_type`
/// value of a Salt API low-state.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    #[default]
    Glob,
    Pcre,
    List,
    Grain,
    GrainPcre,
    Pillar,
    Nodegroup,
    Range,
    Compound,
    Ipcidr,
}

serde_plain::derive_fromstr_from_deserialize!(TargetType, |e| -> crate::Error {
    error::OpaqueError::SerdePlain { source: e }.into()
});
serde_plain::derive_display_from_serialize!(TargetType);

/// A pillar lookup addressed at the minions matched by `target`. Built once and never mutated;
/// both strings are handed to Salt verbatim.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Query {
    target: String,
    pillar: String,
    target_type: TargetType,
}

impl Query {
    pub fn new<S1, S2>(target: S1, pillar: S2) -> Result<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let target = target.into();
        let pillar = pillar.into();
        ensure!(
            !target.is_empty(),
            error::InvalidQuerySnafu { what: "target" }
        );
        ensure!(
            !pillar.is_empty(),
            error::InvalidQuerySnafu { what: "pillar" }
        );
        Ok(Self {
            target,
            pillar,
            target_type: TargetType::default(),
        })
    }

    pub fn with_target_type(mut self, target_type: TargetType) -> Self {
        self.target_type = target_type;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn pillar(&self) -> &str {
        &self.pillar
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }
}
