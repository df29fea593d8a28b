//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders so the persistence layer can
//! own the integrity rules and the UI can own presentation.

use std::fmt;

/// User supplied overrides stored alongside a component. Each field is
/// independent; `None` means "use the listed value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentOverrides {
    pub vendor: Option<String>,
    pub price: Option<String>,
    pub url: Option<String>,
}

impl ComponentOverrides {
    /// True when none of the override fields carry a value.
    pub fn is_empty(&self) -> bool {
        self.vendor.is_none() && self.price.is_none() && self.url.is_none()
    }
}

/// A single purchasable part. The source URL doubles as its identity so the
/// same part found twice through search collapses into one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Primary key.
    pub url: String,
    pub name: String,
    /// Listed price exactly as the search API formatted it (for example
    /// `"$120.00"` or `"N/A"`).
    pub price: String,
    pub image: Option<String>,
    pub overrides: ComponentOverrides,
}

impl Component {
    pub fn new(url: impl Into<String>, name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            price: price.into(),
            image: None,
            overrides: ComponentOverrides::default(),
        }
    }

    /// The URL a user should be sent to: the custom one when set.
    pub fn purchase_url(&self) -> &str {
        self.overrides
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(&self.url)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Icons a list can be decorated with. Stored as a small integer so the
/// schema stays independent from how the UI draws them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListIcon {
    #[default]
    Computer,
    House,
    Office,
    Headset,
    Server,
}

impl ListIcon {
    pub const ALL: [ListIcon; 5] = [
        ListIcon::Computer,
        ListIcon::House,
        ListIcon::Office,
        ListIcon::Headset,
        ListIcon::Server,
    ];

    pub fn id(self) -> i64 {
        match self {
            ListIcon::Computer => 0,
            ListIcon::House => 1,
            ListIcon::Office => 2,
            ListIcon::Headset => 3,
            ListIcon::Server => 4,
        }
    }

    /// Unknown ids fall back to the default icon rather than failing the load.
    pub fn from_id(id: i64) -> Self {
        Self::ALL
            .into_iter()
            .find(|icon| icon.id() == id)
            .unwrap_or_default()
    }

    /// Short glyph used in list rows.
    pub fn glyph(self) -> &'static str {
        match self {
            ListIcon::Computer => "[PC]",
            ListIcon::House => "[HM]",
            ListIcon::Office => "[WK]",
            ListIcon::Headset => "[AU]",
            ListIcon::Server => "[SV]",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListIcon::Computer => "Computer",
            ListIcon::House => "House",
            ListIcon::Office => "Office",
            ListIcon::Headset => "Headset",
            ListIcon::Server => "Server",
        }
    }
}

/// A user-named collection of components and bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartList {
    pub id: i64,
    /// Secondary lookup key. Expected unique but not enforced by the schema.
    pub name: String,
    pub icon: ListIcon,
}

impl fmt::Display for PartList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A named, priced sub-collection of components that belongs to exactly one
/// list (for example a pre-built kit bought as a unit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub id: i64,
    pub vendor: String,
    pub name: String,
    /// Aggregate price as typed by the user.
    pub price: String,
    pub url: String,
    pub image: Option<String>,
    pub list_id: i64,
}

/// Bundle metadata collected before the bundle row exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBundle {
    pub name: String,
    pub vendor: String,
    pub price: String,
    pub url: String,
    pub image: Option<String>,
}

/// A bundle together with the components it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleWithComponents {
    pub bundle: Bundle,
    pub components: Vec<Component>,
}

/// One row of a list's unified display: either a direct component or a bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem<'a> {
    Component(&'a Component),
    Bundle(&'a BundleWithComponents),
}

/// The aggregated contents of a list at the moment it was queried.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub list: PartList,
    /// Direct members, in link insertion order.
    pub components: Vec<Component>,
    /// Owned bundles, by ascending bundle id.
    pub bundles: Vec<BundleWithComponents>,
}

impl ListView {
    /// Direct components first, then bundles.
    pub fn items(&self) -> Vec<ListItem<'_>> {
        self.components
            .iter()
            .map(ListItem::Component)
            .chain(self.bundles.iter().map(ListItem::Bundle))
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.components.len() + self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}
