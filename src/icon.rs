//! The bundled icon set and pixel size type.
//!
//! Icons form a closed set compiled into the binary. Each [`Bi`] variant maps
//! to exactly one SVG file under [`ICON_DIR`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resource directory holding the bundled Bootstrap icon subset.
pub const ICON_DIR: &str = "icons/bi";

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

macro_rules! icon_set {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Symbolic name of a bundled Bootstrap icon.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
        pub enum Bi {
            $(
                #[doc = concat!("bi-", $name)]
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl Bi {
            /// Every icon in the bundled set, in declaration order.
            pub const ALL: &'static [Bi] = &[$(Bi::$variant),*];

            /// The file name fragment, e.g. `arrow-left-circle`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Bi::$variant => $name,)*
                }
            }
        }
    };
}

icon_set! {
    ArrowLeftCircle => "arrow-left-circle",
    ArrowLeftSquareFill => "arrow-left-square-fill",
    ArrowRepeat => "arrow-repeat",
    Bank => "bank",
    BoxArrowInDown => "box-arrow-in-down",
    BoxArrowUp => "box-arrow-up",
    Calculator => "calculator",
    CartX => "cart-x",
    CashCoin => "cash-coin",
    CashStack => "cash-stack",
    Clock => "clock",
    CurrencyDollar => "currency-dollar",
    DatabaseFillX => "database-fill-x",
    DoorOpen => "door-open",
    Gear => "gear",
    Grid => "grid",
    Lock => "lock",
    Palette => "palette",
    Percent => "percent",
    PersonAdd => "person-add",
    Printer => "printer",
    Receipt => "receipt",
    Rulers => "rulers",
    Save => "save",
    Trash => "trash",
    UpcScan => "upc-scan",
    XCircle => "x-circle",
}

impl Bi {
    /// Resource path of the icon's SVG file.
    pub fn resource_path(self) -> String {
        resource_path_for(self.name())
    }
}

/// Resource path for an icon fragment name, whether or not it is bundled.
pub fn resource_path_for(name: &str) -> String {
    format!("{ICON_DIR}/bi-{name}.svg")
}

impl Default for Bi {
    fn default() -> Self {
        Bi::ArrowLeftCircle
    }
}

impl fmt::Display for Bi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an unknown icon name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown icon: {0}")]
pub struct UnknownIcon(pub String);

impl FromStr for Bi {
    type Err = UnknownIcon;

    /// Accepts the fragment name with or without the `bi-` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("bi-").unwrap_or(name);
        Bi::ALL
            .iter()
            .copied()
            .find(|icon| icon.name() == name)
            .ok_or_else(|| UnknownIcon(s.to_string()))
    }
}
