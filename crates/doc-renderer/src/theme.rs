//! Document palette and severity styling.

use printpdf::{Color, Rgb};

/// Color palette used across all report pages.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Headings and cover banner
    pub primary: Color,
    /// Section subheadings
    pub secondary: Color,
    /// Links and emphasis
    pub accent: Color,
    /// "All clear" banners
    pub success: Color,
    /// Cautionary text
    pub warning: Color,
    /// High severity and alert banners
    pub danger: Color,
    /// Critical severity
    pub critical: Color,
    /// Medium severity
    pub moderate: Color,
    /// Low severity and muted text
    pub low: Color,
    /// Table stripes and panels
    pub background: Color,
    /// Body text
    pub text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: rgb(0x2C3E50),
            secondary: rgb(0x34495E),
            accent: rgb(0x3498DB),
            success: rgb(0x27AE60),
            warning: rgb(0xF39C12),
            danger: rgb(0xE74C3C),
            critical: rgb(0xC0392B),
            moderate: rgb(0xE67E22),
            low: rgb(0x95A5A6),
            background: rgb(0xECF0F1),
            text: rgb(0x2C3E50),
        }
    }
}

impl Theme {
    /// Color for a severity label as scanners report it.
    pub fn severity_color(&self, severity: &str) -> Color {
        match SeverityClass::classify(severity) {
            SeverityClass::Critical => self.critical.clone(),
            SeverityClass::High => self.danger.clone(),
            SeverityClass::Moderate => self.warning.clone(),
            SeverityClass::Low => self.low.clone(),
        }
    }
}

/// Coarse severity buckets for styling. Scanners disagree on labels
/// ("ERROR", "HIGH", "Medium"), so classification is case-insensitive
/// and anything unrecognized lands in the lowest bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityClass {
    Critical,
    High,
    Moderate,
    Low,
}

impl SeverityClass {
    pub fn classify(severity: &str) -> Self {
        match severity.to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" | "error" => Self::High,
            "medium" | "moderate" | "warning" => Self::Moderate,
            _ => Self::Low,
        }
    }
}

fn rgb(hex: u32) -> Color {
    let r = f64::from((hex >> 16) & 0xFF) / 255.0;
    let g = f64::from((hex >> 8) & 0xFF) / 255.0;
    let b = f64::from(hex & 0xFF) / 255.0;
    Color::Rgb(Rgb::new(r as _, g as _, b as _, None))
}
