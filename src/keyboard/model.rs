use std::fmt;

use crate::keyboard::finger::{self, FingerAssignment};

/// Physical keyboard form factor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shape {
    /// ANSI board: wide left shift, backslash above enter.
    #[default]
    Pc104,
    /// ISO board: extra key left of `AB01` and one more home-row key.
    Pc105,
}

impl Shape {
    pub const ALL: [Shape; 2] = [Shape::Pc104, Shape::Pc105];

    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Pc104 => "pc104",
            Shape::Pc105 => "pc105",
        }
    }

    /// Anything other than `pc105` falls back to the default shape.
    pub fn from_setting(value: &str) -> Self {
        if value == "pc105" {
            Shape::Pc105
        } else {
            Shape::Pc104
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalKey {
    /// XKB position name, e.g. `AD01`.
    pub name: &'static str,
    /// Width in keyboard units (1 = a letter key).
    pub width: u16,
}

impl PhysicalKey {
    const fn new(name: &'static str) -> Self {
        Self { name, width: 1 }
    }

    const fn wide(name: &'static str, width: u16) -> Self {
        Self { name, width }
    }

    /// Keys that never carry a character from a layout file.
    pub fn is_special(&self) -> bool {
        matches!(
            self.name,
            "BKSP" | "TAB" | "CAPS" | "RTRN" | "LFSH" | "RTSH" | "SPCE"
        )
    }
}

const DIGIT_ROW: &[PhysicalKey] = &[
    PhysicalKey::new("TLDE"),
    PhysicalKey::new("AE01"),
    PhysicalKey::new("AE02"),
    PhysicalKey::new("AE03"),
    PhysicalKey::new("AE04"),
    PhysicalKey::new("AE05"),
    PhysicalKey::new("AE06"),
    PhysicalKey::new("AE07"),
    PhysicalKey::new("AE08"),
    PhysicalKey::new("AE09"),
    PhysicalKey::new("AE10"),
    PhysicalKey::new("AE11"),
    PhysicalKey::new("AE12"),
    PhysicalKey::wide("BKSP", 2),
];

const TOP_LETTERS: &[&str] = &[
    "AD01", "AD02", "AD03", "AD04", "AD05", "AD06", "AD07", "AD08", "AD09", "AD10", "AD11", "AD12",
];

const HOME_LETTERS: &[&str] = &[
    "AC01", "AC02", "AC03", "AC04", "AC05", "AC06", "AC07", "AC08", "AC09", "AC10", "AC11",
];

const BOTTOM_LETTERS: &[&str] = &[
    "AB01", "AB02", "AB03", "AB04", "AB05", "AB06", "AB07", "AB08", "AB09", "AB10",
];

#[derive(Clone, Debug)]
pub struct KeyboardModel {
    pub shape: Shape,
    pub rows: Vec<Vec<PhysicalKey>>,
}

impl KeyboardModel {
    pub fn new(shape: Shape) -> Self {
        let letters = |names: &[&'static str]| -> Vec<PhysicalKey> {
            names.iter().map(|&n| PhysicalKey::new(n)).collect()
        };

        let digit = DIGIT_ROW.to_vec();

        let mut top = vec![PhysicalKey::wide("TAB", 2)];
        top.extend(letters(TOP_LETTERS));

        let mut home = vec![PhysicalKey::wide("CAPS", 2)];
        home.extend(letters(HOME_LETTERS));

        let mut bottom = Vec::new();

        match shape {
            Shape::Pc104 => {
                top.push(PhysicalKey::new("BKSL"));
                home.push(PhysicalKey::wide("RTRN", 2));
                bottom.push(PhysicalKey::wide("LFSH", 2));
            }
            Shape::Pc105 => {
                home.push(PhysicalKey::new("AC12"));
                home.push(PhysicalKey::new("RTRN"));
                bottom.push(PhysicalKey::new("LFSH"));
                bottom.push(PhysicalKey::new("LSGT"));
            }
        }
        bottom.extend(letters(BOTTOM_LETTERS));
        bottom.push(PhysicalKey::wide("RTSH", 3));

        let space = vec![PhysicalKey::wide("SPCE", 8)];

        Self {
            shape,
            rows: vec![digit, top, home, bottom, space],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position_of(name).is_some()
    }

    pub fn position_of(&self, name: &str) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(row_idx, row)| {
            row.iter()
                .position(|key| key.name == name)
                .map(|col_idx| (row_idx, col_idx))
        })
    }

    pub fn finger_for(&self, name: &str) -> FingerAssignment {
        finger::finger_for(name, self.shape)
    }

    /// Indentation of each row in keyboard units, mimicking the stagger.
    pub fn row_offsets(&self) -> &'static [u16] {
        &[0, 0, 0, 0, 4]
    }
}

impl Default for KeyboardModel {
    fn default() -> Self {
        Self::new(Shape::default())
    }
}
