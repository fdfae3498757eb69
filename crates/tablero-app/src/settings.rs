// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::model::DisplayType;

/// Opaque display configuration keyed by setting name. The keys a given
/// display type understands are owned by the renderer; this type only
/// stores and merges them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualizationSettings(BTreeMap<String, Value>);

impl VisualizationSettings {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

const CHART_COLORS: [&str; 5] = ["#4A90E2", "#84BB4C", "#F9CF48", "#ED6E6E", "#885AB1"];

/// Resolve the settings for a display type: per-type defaults overlaid
/// with whatever `prior` carries. Display-type changes pass an empty
/// `prior`, which discards the previous type's settings wholesale.
pub fn settings_for_display(
    prior: &VisualizationSettings,
    display: DisplayType,
) -> VisualizationSettings {
    let mut resolved = defaults_for(display);
    for (key, value) in prior.iter() {
        resolved.insert(key.clone(), value.clone());
    }
    resolved
}

fn defaults_for(display: DisplayType) -> VisualizationSettings {
    let mut settings = VisualizationSettings::default();
    match display {
        DisplayType::Table => {
            settings.insert("table.pivot", json!(false));
            settings.insert("table.row_limit", json!(2_000));
        }
        DisplayType::Scalar => {
            settings.insert("scalar.decimals", json!(0));
            settings.insert("scalar.prefix", json!(""));
        }
        DisplayType::Line | DisplayType::Area => {
            settings.insert("chart.colors", json!(CHART_COLORS));
            settings.insert("line.interpolate", json!("linear"));
            settings.insert("line.markers", json!(display == DisplayType::Line));
        }
        DisplayType::Bar => {
            settings.insert("chart.colors", json!(CHART_COLORS));
            settings.insert("bar.stacked", json!(false));
        }
        DisplayType::Pie => {
            settings.insert("chart.colors", json!(CHART_COLORS));
            settings.insert("pie.show_legend", json!(true));
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::{VisualizationSettings, settings_for_display};
    use crate::model::DisplayType;
    use serde_json::json;

    #[test]
    fn empty_prior_yields_type_defaults() {
        let settings = settings_for_display(&VisualizationSettings::default(), DisplayType::Bar);
        assert_eq!(settings.get("bar.stacked"), Some(&json!(false)));
        assert!(settings.get("line.interpolate").is_none());
    }

    #[test]
    fn prior_entries_win_over_defaults() {
        let mut prior = VisualizationSettings::default();
        prior.insert("table.row_limit", json!(100));
        let settings = settings_for_display(&prior, DisplayType::Table);
        assert_eq!(settings.get("table.row_limit"), Some(&json!(100)));
        assert_eq!(settings.get("table.pivot"), Some(&json!(false)));
    }

    #[test]
    fn line_and_area_share_colors_but_differ_on_markers() {
        let empty = VisualizationSettings::default();
        let line = settings_for_display(&empty, DisplayType::Line);
        let area = settings_for_display(&empty, DisplayType::Area);
        assert_eq!(line.get("chart.colors"), area.get("chart.colors"));
        assert_eq!(line.get("line.markers"), Some(&json!(true)));
        assert_eq!(area.get("line.markers"), Some(&json!(false)));
    }

    #[test]
    fn settings_serialize_as_a_flat_object() {
        let settings = settings_for_display(&VisualizationSettings::default(), DisplayType::Scalar);
        let value = serde_json::to_value(&settings).expect("serialize settings");
        assert_eq!(value["scalar.decimals"], json!(0));
    }
}
