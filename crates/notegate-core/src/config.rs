//! Plugin metadata shared by every host integration.
//!
//! ```ignore
//! use notegate::prelude::*;
//!
//! pub static CONFIG: PluginConfig = PluginConfig::new("My Plugin")
//!     .with_vendor("My Company")
//!     .with_version(env!("CARGO_PKG_VERSION"))
//!     .with_sub_categories("Fx|Dynamics");
//! ```

/// Format-agnostic plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    /// Plugin name displayed by the host.
    pub name: &'static str,

    pub vendor: &'static str,
    pub url: &'static str,
    pub email: &'static str,
    pub version: &'static str,

    /// Plugin category (e.g., "Fx", "Instrument").
    pub category: &'static str,

    /// Pipe-separated sub-categories like "Fx|Dynamics".
    pub sub_categories: &'static str,

    /// Whether this plugin has an editor/GUI.
    pub has_editor: bool,
}

impl PluginConfig {
    /// Configuration with default values for everything except the name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            vendor: "Unknown Vendor",
            url: "",
            email: "",
            version: "1.0.0",
            category: "Fx",
            sub_categories: "",
            has_editor: false,
        }
    }

    pub const fn with_vendor(mut self, vendor: &'static str) -> Self {
        self.vendor = vendor;
        self
    }

    pub const fn with_url(mut self, url: &'static str) -> Self {
        self.url = url;
        self
    }

    pub const fn with_email(mut self, email: &'static str) -> Self {
        self.email = email;
        self
    }

    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    pub const fn with_category(mut self, category: &'static str) -> Self {
        self.category = category;
        self
    }

    pub const fn with_sub_categories(mut self, sub_categories: &'static str) -> Self {
        self.sub_categories = sub_categories;
        self
    }

    /// Enable the editor/GUI.
    pub const fn with_editor(mut self) -> Self {
        self.has_editor = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static CONFIG: PluginConfig = PluginConfig::new("Test Gate")
        .with_vendor("Test Vendor")
        .with_sub_categories("Fx|Dynamics")
        .with_editor();

    #[test]
    fn builders_are_const() {
        assert_eq!(CONFIG.name, "Test Gate");
        assert_eq!(CONFIG.vendor, "Test Vendor");
        assert_eq!(CONFIG.category, "Fx");
        assert_eq!(CONFIG.sub_categories, "Fx|Dynamics");
        assert!(CONFIG.has_editor);
    }
}
