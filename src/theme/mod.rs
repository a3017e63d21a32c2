// Preference service - theme and font, persisted through the store
//
// A consumer of the store and of the document: preferences live under the
// `setting` key as an object value, and take effect as `data-theme` /
// `data-font` attributes on the document body (a stylesheet would key off
// those). The `system` theme resolves against the host's preferred color
// scheme and re-resolves when the host reports a scheme change.
// Initialization failures are logged, never fatal.

use crate::dom::{Document, NodeHandle};
use crate::error::StoreError;
use crate::store::{StateValue, Store};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tracing::{debug, error, warn};

/// Store key the preference object is persisted under
pub const PREFERENCE_KEY: &str = "setting";

/// Theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeChoice {
    #[default]
    Dark,
    Light,
    /// Follow the host's preferred color scheme
    System,
}

impl ThemeChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::System => "system",
        }
    }
}

impl FromStr for ThemeChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            "system" => Ok(Self::System),
            other => Err(format!("invalid theme: {}", other)),
        }
    }
}

impl fmt::Display for ThemeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Font preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    #[default]
    Sans,
    Serif,
    Monospace,
}

impl Font {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sans => "sans",
            Self::Serif => "serif",
            Self::Monospace => "monospace",
        }
    }
}

impl FromStr for Font {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sans" => Ok(Self::Sans),
            "serif" => Ok(Self::Serif),
            "monospace" => Ok(Self::Monospace),
            other => Err(format!("invalid font: {}", other)),
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete color scheme - what `system` resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Dark,
    Light,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// The persisted preference pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preference {
    pub theme: ThemeChoice,
    pub font: Font,
}

impl Preference {
    /// Convert to the store's value model
    pub fn to_value(self) -> StateValue {
        let mut members = BTreeMap::new();
        members.insert("theme".to_string(), StateValue::from(self.theme.as_str()));
        members.insert("font".to_string(), StateValue::from(self.font.as_str()));
        StateValue::Object(members)
    }

    /// Parse a stored value; `None` when it is not a structurally valid
    /// preference object
    pub fn from_value(value: &StateValue) -> Option<Self> {
        let members = value.as_object()?;
        let theme = members.get("theme")?.as_str()?.parse().ok()?;
        let font = members.get("font")?.as_str()?.parse().ok()?;
        Some(Self { theme, font })
    }
}

/// Theme/font service over the store and the document body
pub struct Preferences {
    store: Rc<RefCell<Store>>,
    body: NodeHandle,
    state: Preference,
    system_scheme: ColorScheme,
    initialized: bool,
}

impl Preferences {
    /// Create the service; `system_dark` is the host's preferred scheme at
    /// startup
    pub fn new(document: &Document, store: Rc<RefCell<Store>>, system_dark: bool) -> Self {
        Self {
            store,
            body: document.body(),
            state: Preference::default(),
            system_scheme: if system_dark {
                ColorScheme::Dark
            } else {
                ColorScheme::Light
            },
            initialized: false,
        }
    }

    /// Load (or seed) the persisted preference and apply it to the body.
    /// Requires an initialized store; failures are logged and leave the
    /// service uninitialized.
    pub fn init(&mut self) {
        if self.initialized {
            warn!("preference service already initialized");
            return;
        }
        if !self.store.borrow().is_initialized() {
            error!("store must be initialized before the preference service");
            return;
        }

        match self.fetch() {
            Some(stored) => self.state = stored,
            None => {
                // First run (or malformed entry): seed the store with defaults
                if let Err(err) = self.save() {
                    warn!(%err, "failed to seed default preferences");
                }
            }
        }

        self.apply_font();
        self.apply_theme();
        self.initialized = true;
        debug!(theme = %self.state.theme, font = %self.state.font, "preferences applied");
    }

    pub fn current_theme(&self) -> ThemeChoice {
        self.state.theme
    }

    pub fn current_font(&self) -> Font {
        self.state.font
    }

    /// Change the theme, re-apply the resolved scheme, and persist
    pub fn set_theme(&mut self, theme: ThemeChoice) -> Result<(), StoreError> {
        self.state.theme = theme;
        self.apply_theme();
        self.save()
    }

    /// Change the font, re-apply it, and persist
    pub fn set_font(&mut self, font: Font) -> Result<(), StoreError> {
        self.state.font = font;
        self.apply_font();
        self.save()
    }

    /// Host color-scheme change: re-resolve only while the preference is
    /// `system`
    pub fn handle_scheme_change(&mut self, dark: bool) {
        let scheme = if dark {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        };

        if self.state.theme == ThemeChoice::System && self.system_scheme != scheme {
            self.system_scheme = scheme;
            self.apply_theme();
        } else {
            self.system_scheme = scheme;
        }
    }

    fn resolved_scheme(&self) -> ColorScheme {
        match self.state.theme {
            ThemeChoice::Dark => ColorScheme::Dark,
            ThemeChoice::Light => ColorScheme::Light,
            ThemeChoice::System => self.system_scheme,
        }
    }

    fn apply_theme(&self) {
        self.body
            .set_attribute("data-theme", self.resolved_scheme().as_str());
    }

    fn apply_font(&self) {
        self.body.set_attribute("data-font", self.state.font.as_str());
    }

    fn fetch(&self) -> Option<Preference> {
        let store = self.store.borrow();
        store.get_state(PREFERENCE_KEY).and_then(Preference::from_value)
    }

    fn save(&self) -> Result<(), StoreError> {
        self.store
            .borrow_mut()
            .set_state(PREFERENCE_KEY, self.state.to_value())
    }
}
