use serde::{Deserialize, Serialize};

use crate::Result;

/// Compiler settings shared by every compiler in a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Trust caller field names instead of checking the index mapping
    pub bypass_mapping_validation: bool,
    pub default_terms_size: usize,
    /// Bucket size for each level of a distinct/group-by aggregation
    pub default_distinct_size: usize,
    pub highlight_pre_tag: String,
    pub highlight_post_tag: String,
    pub geo_distance_unit: String,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            bypass_mapping_validation: false,
            default_terms_size: 10,
            default_distinct_size: 1000,
            highlight_pre_tag: "<em>".to_string(),
            highlight_post_tag: "</em>".to_string(),
            geo_distance_unit: "km".to_string(),
        }
    }
}

/// Settings profiles for common host setups
#[derive(Clone, Debug)]
pub enum SettingsProfile {
    /// Validate every field against the index mapping
    Strict,
    /// Trust field names as given (mapping is not fetched)
    Trusting,
    /// Large bucket sizes for reporting workloads
    Reporting,
}

impl SettingsProfile {
    /// Apply this profile to a CompilerSettings
    pub fn apply_to(&self, settings: &mut CompilerSettings) {
        match self {
            SettingsProfile::Strict => settings.bypass_mapping_validation = false,
            SettingsProfile::Trusting => settings.bypass_mapping_validation = true,
            SettingsProfile::Reporting => {
                settings.default_terms_size = 1000;
                settings.default_distinct_size = 10_000;
            }
        }
    }
}

impl CompilerSettings {
    /// Parse settings from a JSON document, missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply a settings profile
    pub fn with_profile(mut self, profile: SettingsProfile) -> Self {
        profile.apply_to(&mut self);
        self
    }

    /// Enable or disable mapping validation bypass
    pub fn with_bypass_mapping_validation(mut self, bypass: bool) -> Self {
        self.bypass_mapping_validation = bypass;
        self
    }

    /// Set the default `terms` aggregation size
    pub fn with_default_terms_size(mut self, size: usize) -> Self {
        self.default_terms_size = size;
        self
    }

    /// Set the per-level bucket size for distinct aggregations
    pub fn with_default_distinct_size(mut self, size: usize) -> Self {
        self.default_distinct_size = size;
        self
    }

    /// Set the highlight markers
    pub fn with_highlight_tags(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.highlight_pre_tag = pre.into();
        self.highlight_post_tag = post.into();
        self
    }
}
