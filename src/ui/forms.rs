use anyhow::Result;
use ratatui::text::Line;

use crate::models::{Component, ComponentOverrides, ListIcon, NewBundle, PartList};

use super::helpers::field_line;

/// Name and icon for a new or renamed list.
#[derive(Default, Clone)]
pub(crate) struct ListForm {
    pub(crate) name: String,
    pub(crate) icon: ListIcon,
    pub(crate) error: Option<String>,
}

impl ListForm {
    pub(crate) fn from_list(list: &PartList) -> Self {
        Self {
            name: list.name.clone(),
            icon: list.icon,
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.name.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    /// Step through the icon set, wrapping at either end.
    pub(crate) fn cycle_icon(&mut self, offset: isize) {
        let len = ListIcon::ALL.len() as isize;
        let current = ListIcon::ALL
            .iter()
            .position(|icon| *icon == self.icon)
            .unwrap_or(0) as isize;
        self.icon = ListIcon::ALL[(current + offset).rem_euclid(len) as usize];
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        let icons = ListIcon::ALL
            .iter()
            .map(|icon| {
                if *icon == self.icon {
                    format!("<{}>", icon.label())
                } else {
                    icon.label().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        vec![
            field_line("Name", &self.name, "<required>", true),
            Line::from(format!("Icon: {icons}")),
        ]
    }
}

/// Fields of the bundle form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BundleField {
    #[default]
    Name,
    Vendor,
    Price,
    Url,
    Image,
}

impl BundleField {
    const ORDER: [BundleField; 5] = [
        BundleField::Name,
        BundleField::Vendor,
        BundleField::Price,
        BundleField::Url,
        BundleField::Image,
    ];

    fn label(self) -> &'static str {
        match self {
            BundleField::Name => "Name",
            BundleField::Vendor => "Vendor",
            BundleField::Price => "Price",
            BundleField::Url => "URL",
            BundleField::Image => "Image",
        }
    }
}

/// Bundle metadata entered before choosing the member components.
#[derive(Default, Clone)]
pub(crate) struct BundleForm {
    pub(crate) bundle: NewBundle,
    pub(crate) image: String,
    pub(crate) active: BundleField,
    pub(crate) error: Option<String>,
}

impl BundleForm {
    fn value_mut(&mut self, field: BundleField) -> &mut String {
        match field {
            BundleField::Name => &mut self.bundle.name,
            BundleField::Vendor => &mut self.bundle.vendor,
            BundleField::Price => &mut self.bundle.price,
            BundleField::Url => &mut self.bundle.url,
            BundleField::Image => &mut self.image,
        }
    }

    fn value(&self, field: BundleField) -> &str {
        match field {
            BundleField::Name => &self.bundle.name,
            BundleField::Vendor => &self.bundle.vendor,
            BundleField::Price => &self.bundle.price,
            BundleField::Url => &self.bundle.url,
            BundleField::Image => &self.image,
        }
    }

    pub(crate) fn next_field(&mut self, offset: isize) {
        let len = BundleField::ORDER.len() as isize;
        let current = BundleField::ORDER
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0) as isize;
        self.active = BundleField::ORDER[(current + offset).rem_euclid(len) as usize];
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Validate the inputs and return the bundle ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<NewBundle> {
        let image = self.image.trim();
        let bundle = NewBundle {
            image: (!image.is_empty()).then(|| image.to_string()),
            ..self.bundle.clone()
        };
        bundle.validate()?;
        Ok(bundle)
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        BundleField::ORDER
            .iter()
            .map(|field| {
                let placeholder = if *field == BundleField::Image {
                    "<optional>"
                } else {
                    "<required>"
                };
                field_line(
                    field.label(),
                    self.value(*field),
                    placeholder,
                    *field == self.active,
                )
            })
            .collect()
    }

    /// Cursor column and row offset inside the form body.
    pub(crate) fn cursor(&self) -> (u16, u16) {
        let row = BundleField::ORDER
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0);
        let column = self.active.label().len() + 2 + self.value(self.active).chars().count();
        (column as u16, row as u16)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum OverrideField {
    #[default]
    Price,
    Vendor,
    Url,
}

/// Custom vendor, price and URL for one component.
#[derive(Clone)]
pub(crate) struct OverridesForm {
    pub(crate) url: String,
    pub(crate) name: String,
    pub(crate) vendor: String,
    pub(crate) price: String,
    pub(crate) link: String,
    pub(crate) active: OverrideField,
}

impl OverridesForm {
    pub(crate) fn from_component(component: &Component) -> Self {
        let overrides = &component.overrides;
        Self {
            url: component.url.clone(),
            name: component.name.clone(),
            vendor: overrides.vendor.clone().unwrap_or_default(),
            price: overrides.price.clone().unwrap_or_default(),
            link: overrides.url.clone().unwrap_or_default(),
            active: OverrideField::Price,
        }
    }

    pub(crate) fn toggle_field(&mut self, forward: bool) {
        self.active = match (self.active, forward) {
            (OverrideField::Price, true) | (OverrideField::Url, false) => OverrideField::Vendor,
            (OverrideField::Vendor, true) | (OverrideField::Price, false) => OverrideField::Url,
            (OverrideField::Url, true) | (OverrideField::Vendor, false) => OverrideField::Price,
        };
    }

    fn active_value(&mut self) -> &mut String {
        match self.active {
            OverrideField::Price => &mut self.price,
            OverrideField::Vendor => &mut self.vendor,
            OverrideField::Url => &mut self.link,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.active_value().push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.active_value().pop();
    }

    /// Blank fields clear the corresponding override.
    pub(crate) fn overrides(&self) -> ComponentOverrides {
        let keep = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        ComponentOverrides {
            vendor: keep(&self.vendor),
            price: keep(&self.price),
            url: keep(&self.link),
        }
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            field_line(
                "Custom price",
                &self.price,
                "<listed price>",
                self.active == OverrideField::Price,
            ),
            field_line(
                "Custom vendor",
                &self.vendor,
                "<none>",
                self.active == OverrideField::Vendor,
            ),
            field_line(
                "Custom URL",
                &self.link,
                "<listed URL>",
                self.active == OverrideField::Url,
            ),
        ]
    }
}

/// Pending list deletion awaiting a yes/no.
#[derive(Clone)]
pub(crate) struct ConfirmListDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) item_count: usize,
}

/// What a removal confirmation is about.
#[derive(Clone)]
pub(crate) enum RemoveTarget {
    Component { url: String, name: String },
    Bundle { id: i64, name: String },
}

/// Pending removal of a list item (direct component or bundle).
#[derive(Clone)]
pub(crate) struct ConfirmItemRemove {
    pub(crate) list_id: i64,
    pub(crate) target: RemoveTarget,
}

impl ConfirmItemRemove {
    pub(crate) fn prompt(&self) -> String {
        match &self.target {
            RemoveTarget::Component { name, .. } => format!("Remove \"{name}\" from this list?"),
            RemoveTarget::Bundle { name, .. } => {
                format!("Remove bundle \"{name}\" and its components?")
            }
        }
    }
}
