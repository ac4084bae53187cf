//! Menu-sliders van de extrude-component en de momentopname die per
//! evaluatie aan de pipeline wordt doorgegeven.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Een begrensde slider met een vast aantal decimalen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuSlider {
    pub id: &'static str,
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub decimals: u32,
    value: f64,
}

impl MenuSlider {
    #[must_use]
    pub fn new(id: &'static str, name: &'static str, min: f64, max: f64, default: f64, decimals: u32) -> Self {
        let mut slider = Self {
            id,
            name,
            min,
            max,
            default,
            decimals,
            value: default,
        };
        slider.value = slider.snap(default);
        slider
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Zet de waarde, begrensd tot `[min, max]` en afgerond op `decimals`.
    /// Retourneert de waarde die uiteindelijk is ingesteld.
    pub fn set_value(&mut self, value: f64) -> Result<f64, SettingsError> {
        if !value.is_finite() {
            return Err(SettingsError::NonFinite);
        }
        self.value = self.snap(value);
        Ok(self.value)
    }

    pub fn reset(&mut self) {
        self.value = self.snap(self.default);
    }

    /// Kleinste stap tussen twee sliderwaarden.
    #[must_use]
    pub fn step(&self) -> f64 {
        10f64.powi(-exponent(self.decimals))
    }

    fn snap(&self, value: f64) -> f64 {
        let factor = 10f64.powi(exponent(self.decimals));
        let rounded = (clamp(value, self.min, self.max) * factor).round() / factor;
        clamp(rounded, self.min, self.max)
    }

    fn matches(&self, id_or_name: &str) -> bool {
        let key = normalize_name(id_or_name);
        key == self.id || key == normalize_name(self.name)
    }
}

/// De twee sliders van het render-menu.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudeMenu {
    pub segment_length: MenuSlider,
    pub faces_per_cross_section: MenuSlider,
}

impl Default for ExtrudeMenu {
    fn default() -> Self {
        Self {
            segment_length: MenuSlider::new("slider_nfac", "Length/Segment [m]", 0.05, 5.0, 1.0, 2),
            faces_per_cross_section: MenuSlider::new("slider_nfac2", "Faces/Cross section", 1.0, 30.0, 2.0, 0),
        }
    }
}

impl ExtrudeMenu {
    #[must_use]
    pub fn sliders(&self) -> [&MenuSlider; 2] {
        [&self.segment_length, &self.faces_per_cross_section]
    }

    /// Zet een slider op id of naam. De nieuwe waarde geldt vanaf de volgende
    /// [`ExtrudeMenu::settings`]-momentopname.
    pub fn set(&mut self, id_or_name: &str, value: f64) -> Result<f64, SettingsError> {
        if self.segment_length.matches(id_or_name) {
            self.segment_length.set_value(value)
        } else if self.faces_per_cross_section.matches(id_or_name) {
            self.faces_per_cross_section.set_value(value)
        } else {
            Err(SettingsError::UnknownSlider(id_or_name.to_owned()))
        }
    }

    /// Momentopname van de huidige sliderwaarden.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn settings(&self) -> ExtrudeSettings {
        ExtrudeSettings {
            segment_length: self.segment_length.value(),
            faces_per_cross_section: self.faces_per_cross_section.value().round() as usize,
        }
    }
}

/// Instellingen van één extrude-aanvraag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrudeSettings {
    /// Gewenste afstand tussen twee doorsneden, in meter.
    pub segment_length: f64,
    /// Aantal mesh-vlakken per span van een doorsnede.
    pub faces_per_cross_section: usize,
}

impl Default for ExtrudeSettings {
    fn default() -> Self {
        ExtrudeMenu::default().settings()
    }
}

/// Fout bij het aanpassen van een slider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    NonFinite,
    UnknownSlider(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite => f.write_str("sliderwaarde moet een eindig getal zijn"),
            Self::UnknownSlider(name) => write!(f, "onbekende sliderreferentie `{name}`"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[allow(clippy::cast_possible_wrap)]
fn exponent(decimals: u32) -> i32 {
    decimals.min(12) as i32
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_render_menu() {
        let settings = ExtrudeSettings::default();
        assert_eq!(settings.segment_length, 1.0);
        assert_eq!(settings.faces_per_cross_section, 2);
    }

    #[test]
    fn values_are_clamped_and_rounded() {
        let mut menu = ExtrudeMenu::default();
        assert_eq!(menu.set("slider_nfac", 0.0), Ok(0.05));
        assert_eq!(menu.set("Length/Segment [m]", 1.234), Ok(1.23));
        assert_eq!(menu.set("faces/cross section", 45.0), Ok(30.0));
        assert_eq!(menu.set("slider_nfac2", 2.6), Ok(3.0));

        let settings = menu.settings();
        assert_eq!(settings.segment_length, 1.23);
        assert_eq!(settings.faces_per_cross_section, 3);
    }

    #[test]
    fn snapshot_is_not_affected_by_later_changes() {
        let mut menu = ExtrudeMenu::default();
        let before = menu.settings();
        menu.set("slider_nfac2", 7.0).expect("slider bestaat");
        assert_eq!(before.faces_per_cross_section, 2);
        assert_eq!(menu.settings().faces_per_cross_section, 7);
    }

    #[test]
    fn rejects_non_finite_and_unknown_sliders() {
        let mut menu = ExtrudeMenu::default();
        assert_eq!(menu.set("slider_nfac", f64::NAN), Err(SettingsError::NonFinite));
        assert_eq!(
            menu.set("radius", 1.0),
            Err(SettingsError::UnknownSlider("radius".to_owned()))
        );
        assert_eq!(menu.segment_length.value(), 1.0);
    }

    #[test]
    fn step_follows_decimals() {
        let menu = ExtrudeMenu::default();
        assert!((menu.segment_length.step() - 0.01).abs() < 1e-15);
        assert_eq!(menu.faces_per_cross_section.step(), 1.0);
    }
}
